use serde::{Deserialize, Serialize};

use crate::error::{LibraryError, LibraryResult};

/// Maximum record count meaning "no limit".
pub const UNBOUNDED: usize = usize::MAX;

/// Configuration for a single library.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Assign ids sequentially on add instead of trusting the caller's id.
    pub auto_id: bool,
    /// On read, update members in place by id instead of clearing the
    /// library first.
    pub merge_on_read: bool,
    /// Maximum number of members. Adding past it fails.
    pub max_records: usize,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            auto_id: false,
            merge_on_read: false,
            max_records: UNBOUNDED,
        }
    }
}

impl LibraryConfig {
    /// Sequential id assignment, replace-on-read, unbounded.
    pub fn auto_id() -> Self {
        Self {
            auto_id: true,
            ..Default::default()
        }
    }

    /// Merge-on-read, caller-supplied ids, unbounded.
    pub fn merging() -> Self {
        Self {
            merge_on_read: true,
            ..Default::default()
        }
    }

    /// Cap the library at `max_records` members.
    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }

    /// Parse a config from JSON. Missing keys take their defaults.
    pub fn from_json(text: &str) -> LibraryResult<Self> {
        serde_json::from_str(text).map_err(|e| LibraryError::Config(e.to_string()))
    }
}
