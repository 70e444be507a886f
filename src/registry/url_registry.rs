use crate::registry::{FetchOutcome, FetchStatus, RegistryError, RegistryResult, Seq, UrlRecord};
use crate::url::CanonicalUrl;
use std::collections::HashMap;

/// Record counts grouped by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: u64,
    pub fetched: u64,
    pub failed: u64,
    pub skipped: u64,
}

impl StatusCounts {
    pub fn total(&self) -> u64 {
        self.pending + self.fetched + self.failed + self.skipped
    }

    fn bump(&mut self, status: FetchStatus) {
        match status {
            FetchStatus::Pending => self.pending += 1,
            FetchStatus::Fetched => self.fetched += 1,
            FetchStatus::Failed => self.failed += 1,
            FetchStatus::Skipped => self.skipped += 1,
        }
    }
}

/// The single authority for URL identity within a crawl
///
/// Records live in a `Vec` indexed by discovery sequence; a map from canonical
/// string to sequence gives O(1) lookup. All mutation goes through `&mut self`,
/// so register-if-absent is atomic by ownership: whoever owns the registry is
/// the only one who can register.
#[derive(Debug, Default)]
pub struct UrlRegistry {
    records: Vec<UrlRecord>,
    index: HashMap<String, Seq>,
    fetch_order: Vec<Seq>,
}

impl UrlRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn lookup(&self, url: &CanonicalUrl) -> Option<&UrlRecord> {
        self.index.get(url.as_str()).map(|&seq| &self.records[seq as usize])
    }

    pub fn get(&self, seq: Seq) -> Option<&UrlRecord> {
        self.records.get(seq as usize)
    }

    /// Registers `url` unless it is already known
    ///
    /// Returns the record and whether it was created by this call. A repeat
    /// discovery from a parent only increments the record's inlink count; the
    /// first parent and depth stay as registered.
    pub fn register_if_absent(
        &mut self,
        url: CanonicalUrl,
        parent: Option<&CanonicalUrl>,
    ) -> (&UrlRecord, bool) {
        if let Some(&seq) = self.index.get(url.as_str()) {
            let record = &mut self.records[seq as usize];
            if parent.is_some() {
                record.inlink_count = record.inlink_count.saturating_add(1);
            }
            return (&self.records[seq as usize], false);
        }

        let depth = parent
            .and_then(|p| self.lookup(p))
            .map(|p| p.depth + 1)
            .unwrap_or(0);
        let seq = self.records.len() as Seq;

        self.index.insert(url.as_str().to_string(), seq);
        self.records
            .push(UrlRecord::new(seq, url, parent.cloned(), depth));

        (&self.records[seq as usize], true)
    }

    /// Moves a Pending record to the terminal status carried by `outcome`
    ///
    /// Fails with `InvalidTransition` when the record is not Pending or the
    /// outcome is not terminal, and with `NotFound` for unregistered URLs.
    pub fn mark_fetched(
        &mut self,
        url: &CanonicalUrl,
        outcome: FetchOutcome,
    ) -> RegistryResult<&UrlRecord> {
        let seq = *self
            .index
            .get(url.as_str())
            .ok_or_else(|| RegistryError::NotFound(url.to_string()))?;
        let record = &mut self.records[seq as usize];

        if record.status != FetchStatus::Pending || !outcome.status.is_terminal() {
            return Err(RegistryError::InvalidTransition {
                url: url.to_string(),
                from: record.status,
                to: outcome.status,
            });
        }

        record.status = outcome.status;
        record.content_hash = outcome.content_hash;
        record.outlink_count = outcome.outlink_count;
        record.http_status = outcome.http_status;
        record.docno = outcome.docno;
        record.error = outcome.error;

        if outcome.status == FetchStatus::Fetched {
            self.fetch_order.push(seq);
        }

        Ok(&self.records[seq as usize])
    }

    pub fn set_oracle_score(&mut self, seq: Seq, score: f64) -> RegistryResult<()> {
        let record = self
            .records
            .get_mut(seq as usize)
            .ok_or_else(|| RegistryError::NotFound(format!("seq {}", seq)))?;
        record.oracle_score = Some(score);
        Ok(())
    }

    /// All records in discovery order
    pub fn iter(&self) -> impl Iterator<Item = &UrlRecord> {
        self.records.iter()
    }

    /// Fetched records in the order they were fetched
    pub fn fetched_records(&self) -> impl Iterator<Item = &UrlRecord> {
        self.fetch_order
            .iter()
            .map(move |&seq| &self.records[seq as usize])
    }

    pub fn fetched_count(&self) -> usize {
        self.fetch_order.len()
    }

    pub fn counts_by_status(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for record in &self.records {
            counts.bump(record.status);
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::canonicalize;

    fn url(s: &str) -> CanonicalUrl {
        canonicalize(s).unwrap()
    }

    #[test]
    fn test_register_twice_returns_same_record() {
        let mut registry = UrlRegistry::new();
        let a = url("http://a.example/");

        let (first, is_new) = registry.register_if_absent(a.clone(), None);
        assert!(is_new);
        let first_seq = first.seq;

        let (second, is_new) = registry.register_if_absent(a.clone(), None);
        assert!(!is_new);
        assert_eq!(second.seq, first_seq);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_equivalent_raw_urls_share_identity() {
        let mut registry = UrlRegistry::new();
        registry.register_if_absent(url("HTTP://A.example:80/x/"), None);
        let (_, is_new) = registry.register_if_absent(url("http://a.example/x#frag"), None);
        assert!(!is_new);
    }

    #[test]
    fn test_repeat_discovery_counts_inlinks() {
        let mut registry = UrlRegistry::new();
        let a = url("http://a.example/");
        let b = url("http://b.example/");
        let c = url("http://c.example/");

        registry.register_if_absent(a.clone(), None);
        registry.register_if_absent(b.clone(), None);
        registry.register_if_absent(c.clone(), Some(&a));
        let (record, is_new) = registry.register_if_absent(c.clone(), Some(&b));

        assert!(!is_new);
        assert_eq!(record.inlink_count, 2);
        assert_eq!(record.parent.as_ref(), Some(&a));
    }

    #[test]
    fn test_depth_from_parent() {
        let mut registry = UrlRegistry::new();
        let a = url("http://a.example/");
        let b = url("http://a.example/b");
        let d = url("http://a.example/d");

        registry.register_if_absent(a.clone(), None);
        registry.register_if_absent(b.clone(), Some(&a));
        let (record, _) = registry.register_if_absent(d, Some(&b));

        assert_eq!(record.depth, 2);
        assert_eq!(registry.lookup(&a).unwrap().depth, 0);
        assert!(registry.lookup(&a).unwrap().is_seed());
    }

    #[test]
    fn test_mark_fetched_transitions_once() {
        let mut registry = UrlRegistry::new();
        let a = url("http://a.example/");
        registry.register_if_absent(a.clone(), None);

        let record = registry
            .mark_fetched(&a, FetchOutcome::fetched("abc".into(), 2, 200, None))
            .unwrap();
        assert_eq!(record.status, FetchStatus::Fetched);
        assert_eq!(record.outlink_count, 2);

        let err = registry
            .mark_fetched(&a, FetchOutcome::failed("again", None))
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::InvalidTransition {
                from: FetchStatus::Fetched,
                to: FetchStatus::Failed,
                ..
            }
        ));
    }

    #[test]
    fn test_mark_fetched_unknown_url() {
        let mut registry = UrlRegistry::new();
        let err = registry
            .mark_fetched(&url("http://nowhere.example/"), FetchOutcome::skipped("stop"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::NotFound(_)));
    }

    #[test]
    fn test_fetched_records_in_fetch_order() {
        let mut registry = UrlRegistry::new();
        let a = url("http://a.example/");
        let b = url("http://b.example/");
        let c = url("http://c.example/");
        for u in [&a, &b, &c] {
            registry.register_if_absent(u.clone(), None);
        }

        registry
            .mark_fetched(&c, FetchOutcome::fetched("c".into(), 0, 200, None))
            .unwrap();
        registry
            .mark_fetched(&b, FetchOutcome::failed("500", Some(500)))
            .unwrap();
        registry
            .mark_fetched(&a, FetchOutcome::fetched("a".into(), 0, 200, None))
            .unwrap();

        let order: Vec<_> = registry
            .fetched_records()
            .map(|r| r.url.as_str().to_string())
            .collect();
        assert_eq!(order, vec![c.to_string(), a.to_string()]);

        let counts = registry.counts_by_status();
        assert_eq!(counts.fetched, 2);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.pending, 0);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn test_set_oracle_score() {
        let mut registry = UrlRegistry::new();
        let (record, _) = registry.register_if_absent(url("http://a.example/"), None);
        let seq = record.seq;

        registry.set_oracle_score(seq, 0.7).unwrap();
        assert_eq!(registry.get(seq).unwrap().oracle_score, Some(0.7));
        assert!(registry.set_oracle_score(99, 0.1).is_err());
    }
}
