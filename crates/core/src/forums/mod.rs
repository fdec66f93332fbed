// crates/core/src/forums/mod.rs
//! Concrete scrape jobs, one per [`ForumId`].

pub mod cryptbb;
pub mod dread;

use std::sync::Arc;

use crate::forum::ForumId;
use crate::job::{JobRegistry, ScrapeJob};
use crate::listing::{CrawlSettings, ListingScraper};
use crate::session::SessionProvider;
use crate::store::RecordStore;

/// Connection details for one forum.
#[derive(Clone)]
pub struct ForumSite {
    pub base_url: String,
    pub session: Arc<dyn SessionProvider>,
}

/// Everything needed to build the full job registry.
#[derive(Clone)]
pub struct ForumSites {
    pub dread: ForumSite,
    pub cryptbb: ForumSite,
    /// MyBB forum id of the board to crawl on CryptBB.
    pub cryptbb_fid: u32,
    pub crawl: CrawlSettings,
}

/// Build the scrape job for `forum`.
pub fn build_job(
    forum: ForumId,
    sites: &ForumSites,
    store: Arc<dyn RecordStore>,
) -> Arc<dyn ScrapeJob> {
    let (layout, session) = match forum {
        ForumId::Dread => (dread::layout(&sites.dread.base_url), &sites.dread.session),
        ForumId::CryptBb => (
            cryptbb::layout(&sites.cryptbb.base_url, sites.cryptbb_fid),
            &sites.cryptbb.session,
        ),
    };
    Arc::new(ListingScraper::new(layout, session.clone(), store, sites.crawl))
}

/// One job per known forum, all writing into `store`.
pub fn default_registry(sites: &ForumSites, store: Arc<dyn RecordStore>) -> JobRegistry {
    let mut registry = JobRegistry::new();
    for forum in ForumId::ALL {
        registry.register(build_job(forum, sites, store.clone()));
    }
    registry
}
