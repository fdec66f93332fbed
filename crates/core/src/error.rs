use thiserror::Error;

/// A forum name outside the closed set of known forums.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown forum: {0}")]
pub struct UnknownForum(pub String);

/// Errors raised by a record-store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Record store backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Stored record is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl StoreError {
    pub fn backend(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(source))
    }
}

/// Errors that end a scrape job.
///
/// None of these reach the HTTP layer: the controller logs them at the
/// worker boundary and treats the job as finished.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Failed to establish forum session: {0}")]
    Session(String),

    #[error("Request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid listing selector {selector:?}: {message}")]
    Selector { selector: String, message: String },

    #[error("Record store error: {0}")]
    Store(#[from] StoreError),

    #[error("Scrape failed: {0}")]
    Failed(String),
}

impl ScrapeError {
    pub fn http(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            url: url.into(),
            source,
        }
    }

    pub fn selector(selector: &str, err: impl std::fmt::Display) -> Self {
        Self::Selector {
            selector: selector.to_string(),
            message: err.to_string(),
        }
    }
}
