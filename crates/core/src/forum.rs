// crates/core/src/forum.rs
//! The closed set of forums the harvester knows how to scrape.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownForum;

/// A forum the harvester can scrape.
///
/// Each variant maps to exactly one scrape job and one record-store
/// partition. The set is closed: anything else is rejected at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForumId {
    Dread,
    CryptBb,
}

impl ForumId {
    /// Every known forum, in a stable order.
    pub const ALL: [ForumId; 2] = [ForumId::Dread, ForumId::CryptBb];

    /// Wire/storage name (also the record-store partition key).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dread => "dread",
            Self::CryptBb => "cryptbb",
        }
    }

    /// Name of the CSV produced when a run of this forum is exported.
    pub fn export_filename(&self) -> String {
        format!("{}_scraped_data.csv", self.as_str())
    }

    /// Comma-separated list of valid names, for error messages.
    pub fn valid_names() -> String {
        Self::ALL
            .iter()
            .map(|f| format!("'{}'", f.as_str()))
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

impl fmt::Display for ForumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForumId {
    type Err = UnknownForum;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dread" => Ok(Self::Dread),
            "cryptbb" => Ok(Self::CryptBb),
            _ => Err(UnknownForum(s.to_string())),
        }
    }
}
