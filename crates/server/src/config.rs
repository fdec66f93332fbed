// crates/server/src/config.rs
//! Command-line and environment configuration for the `forum-harvest` binary.

use clap::Parser;
use forum_harvest_core::forums::{ForumSite, ForumSites};
use forum_harvest_core::{CookieSession, CrawlSettings};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Forum scraping job server
#[derive(Parser, Debug, Clone)]
#[command(name = "forum-harvest", version, about, long_about = None)]
pub struct Config {
    /// Address to bind the HTTP server to
    #[arg(long, env = "FORUM_HARVEST_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on [default: $PORT or 5000]
    #[arg(long, env = "FORUM_HARVEST_PORT")]
    pub port: Option<u16>,

    /// SQLite database path (defaults to the user cache directory)
    #[arg(long, env = "FORUM_HARVEST_DB")]
    pub db_path: Option<PathBuf>,

    /// Also write every CSV export into this directory
    #[arg(long, env = "FORUM_HARVEST_EXPORT_DIR")]
    pub export_dir: Option<PathBuf>,

    /// Seconds a stop request waits for the running job
    #[arg(long, default_value_t = 40)]
    pub stop_timeout_secs: u64,

    /// Listing pages crawled per job
    #[arg(long, default_value_t = 50)]
    pub max_pages: u32,

    /// Pause between listing pages, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub page_delay_ms: u64,

    /// Per-request timeout for forum fetches
    #[arg(long, default_value_t = 30)]
    pub request_timeout_secs: u64,

    #[arg(long, env = "DREAD_URL", default_value = "http://dread.local")]
    pub dread_url: String,

    #[arg(long, env = "CRYPTBB_URL", default_value = "http://cryptbb.local")]
    pub cryptbb_url: String,

    /// MyBB board id crawled on CryptBB
    #[arg(long, env = "CRYPTBB_FID", default_value_t = 2)]
    pub cryptbb_fid: u32,

    /// Session cookies for Dread, as `name=value; name2=value2`
    #[arg(long, env = "DREAD_COOKIES", hide_env_values = true)]
    pub dread_cookies: Option<String>,

    /// Session cookies for CryptBB, as `name=value; name2=value2`
    #[arg(long, env = "CRYPTBB_COOKIES", hide_env_values = true)]
    pub cryptbb_cookies: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long, env = "FORUM_HARVEST_LOG_JSON")]
    pub log_json: bool,
}

/// Default port for the server.
pub const DEFAULT_PORT: u16 = 5000;

impl Config {
    /// `--port`, then `FORUM_HARVEST_PORT`, then `PORT`, then [`DEFAULT_PORT`].
    pub fn port(&self) -> u16 {
        self.port
            .or_else(|| std::env::var("PORT").ok().and_then(|p| p.parse().ok()))
            .unwrap_or(DEFAULT_PORT)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port()).parse()
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    pub fn crawl_settings(&self) -> CrawlSettings {
        CrawlSettings {
            max_pages: self.max_pages,
            page_delay: Duration::from_millis(self.page_delay_ms),
        }
    }

    pub fn forum_sites(&self) -> ForumSites {
        let timeout = Duration::from_secs(self.request_timeout_secs);
        let site = |url: &str, cookies: &Option<String>| {
            let session = cookies
                .as_deref()
                .map(CookieSession::from_header)
                .unwrap_or_else(CookieSession::anonymous)
                .with_timeout(timeout);
            ForumSite {
                base_url: url.trim_end_matches('/').to_string(),
                session: Arc::new(session),
            }
        };
        ForumSites {
            dread: site(&self.dread_url, &self.dread_cookies),
            cryptbb: site(&self.cryptbb_url, &self.cryptbb_cookies),
            cryptbb_fid: self.cryptbb_fid,
            crawl: self.crawl_settings(),
        }
    }
}
