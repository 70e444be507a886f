//! URL handling module for qcrawl
//!
//! This module provides canonicalization. A [`CanonicalUrl`]
//! is the identity key of a URL record: two raw URLs that canonicalize to the same
//! string are the same logical resource.

mod normalize;

use std::fmt;
use url::Url;

pub use normalize::canonicalize;

/// A URL in canonical form
///
/// Only [`canonicalize`] constructs values of this type, so holding one means the
/// URL parsed, has an http(s) scheme and a host, and has been normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalUrl {
    url: Url,
    host: String,
}

impl CanonicalUrl {
    pub(crate) fn from_normalized(url: Url, host: String) -> Self {
        Self { url, host }
    }

    /// Returns the canonical string form
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }

    /// Returns the lowercase host
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the underlying parsed URL
    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// Number of non-empty path segments
    pub fn path_depth(&self) -> usize {
        self.url
            .path_segments()
            .map(|segments| segments.filter(|s| !s.is_empty()).count())
            .unwrap_or(0)
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
