// crates/core/src/lib.rs
pub mod error;
pub mod forum;
pub mod forums;
pub mod job;
pub mod listing;
pub mod paths;
pub mod session;
pub mod store;
pub mod text;

pub use error::*;
pub use forum::ForumId;
pub use job::{JobRegistry, JobReport, ScrapeJob};
pub use listing::{CrawlSettings, ForumLayout, ListingScraper};
pub use session::{CookieSession, SessionProvider};
pub use store::{MemoryStore, Record, RecordStore, STORE_ID_FIELD};
