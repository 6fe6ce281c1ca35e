use crate::core::errors::BoxError;
use crate::core::snapshot::PrefixEntry;
use serde::{Deserialize, Serialize};

/*-------------------------------------------------------------------------------------------------
  Remote Capability
-------------------------------------------------------------------------------------------------*/

/// Access to the provider's published IP ranges document.
pub trait Remote: Send + Sync {
    /// Lightweight probe returning the document's metadata (an HTTP `HEAD`).
    fn head_metadata(&self, url: &str) -> std::result::Result<RemoteMetadata, BoxError>;

    /// Fetch and decode the full document (an HTTP `GET`).
    fn fetch_document(&self, url: &str) -> std::result::Result<Document, BoxError>;
}

/// Metadata returned by [Remote::head_metadata]; `last_modified` is the raw header value.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RemoteMetadata {
    pub last_modified: Option<String>,
}

impl RemoteMetadata {
    pub fn last_modified<S: Into<String>>(last_modified: S) -> Self {
        Self {
            last_modified: Some(last_modified.into()),
        }
    }
}

/*--------------------------------------------------------------------------------------
  Published Document
--------------------------------------------------------------------------------------*/

/// The published IP ranges document. IPv4 entries are listed under `prefixes` and IPv6 entries
/// under `ipv6_prefixes`; the remaining top-level fields are not used.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Document {
    pub prefixes: Vec<PrefixEntry>,

    #[serde(default)]
    pub ipv6_prefixes: Vec<PrefixEntry>,
}

impl Document {
    /// All entries in document order: `prefixes` followed by `ipv6_prefixes`.
    pub fn into_entries(self) -> Vec<PrefixEntry> {
        let mut entries = self.prefixes;
        entries.extend(self.ipv6_prefixes);
        entries
    }
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/
