use crate::snapshot::{SnapshotLabel, SnapshotRequest, SnapshotResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contents of `manifest.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SnapshotManifest {
    pub label: String,
    pub exp_name: String,
    pub frontier_type: String,
    pub page_count: usize,
    /// Checkpoint page count; absent for the final snapshot
    #[serde(default)]
    pub limit: Option<u64>,
    /// RFC 3339 timestamp
    pub created_at: String,
    #[serde(default)]
    pub config_hash: Option<String>,
}

impl SnapshotManifest {
    pub fn from_request(request: &SnapshotRequest) -> Self {
        Self {
            label: request.label.to_string(),
            exp_name: request.exp_name.clone(),
            frontier_type: request.frontier_type.to_string(),
            page_count: request.records.len(),
            limit: request.label.limit(),
            created_at: Utc::now().to_rfc3339(),
            config_hash: request.config_hash.clone(),
        }
    }

    pub fn parsed_label(&self) -> SnapshotResult<SnapshotLabel> {
        self.label.parse()
    }

    pub fn load(path: &Path) -> SnapshotResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save(&self, path: &Path) -> SnapshotResult<()> {
        std::fs::write(path, toml::to_string(self)?)?;
        Ok(())
    }
}
