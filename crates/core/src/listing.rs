// crates/core/src/listing.rs
//! Paged listing crawler shared by the forum scrape jobs.
//!
//! Walks `page = 1..=max_pages` of a forum listing, pulls one record per
//! matching entry and appends each page's records to the store. The
//! cancellation token is checked before every fetch and raced against the
//! fetch itself and the politeness delay.

use async_trait::async_trait;
use chrono::Utc;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::ScrapeError;
use crate::forum::ForumId;
use crate::job::{JobReport, ScrapeJob};
use crate::session::SessionProvider;
use crate::store::{Record, RecordStore};
use crate::text::element_text;

/// Placeholder substituted with the page number in listing URL templates.
pub const PAGE_PLACEHOLDER: &str = "{page}";

/// Where a forum's listing lives and how to recognise an entry on it.
///
/// Selectors are CSS. `link_selector` and `author_selector` are matched
/// inside each element found by `entry_selector`; the first link's `href`
/// and text become the record's `url` and `title`.
#[derive(Debug, Clone)]
pub struct ForumLayout {
    pub forum: ForumId,
    pub base_url: String,
    pub listing_template: String,
    pub entry_selector: String,
    pub link_selector: String,
    pub author_selector: Option<String>,
}

/// Parsed form of a layout's selectors.
#[derive(Debug)]
pub struct EntrySelectors {
    entry: Selector,
    link: Selector,
    author: Option<Selector>,
}

impl ForumLayout {
    pub fn listing_url(&self, page: u32) -> String {
        self.listing_template
            .replace(PAGE_PLACEHOLDER, &page.to_string())
    }

    pub fn selectors(&self) -> Result<EntrySelectors, ScrapeError> {
        let parse =
            |css: &str| Selector::parse(css).map_err(|e| ScrapeError::selector(css, e));
        Ok(EntrySelectors {
            entry: parse(&self.entry_selector)?,
            link: parse(&self.link_selector)?,
            author: self.author_selector.as_deref().map(parse).transpose()?,
        })
    }

    /// Turn a listing page into records. `page` is stamped onto each one.
    /// Entries without a link `href` or with an empty title are skipped.
    pub fn extract(&self, selectors: &EntrySelectors, html: &str, page: u32) -> Vec<Record> {
        let document = Html::parse_document(html);
        let base = reqwest::Url::parse(&self.base_url).ok();
        let scraped_at = Utc::now().to_rfc3339();

        document
            .select(&selectors.entry)
            .filter_map(|entry| {
                let link = entry.select(&selectors.link).next()?;
                let href = link.value().attr("href")?;
                let title = element_text(link);
                if title.is_empty() {
                    return None;
                }
                let url = base
                    .as_ref()
                    .and_then(|b| b.join(href).ok())
                    .map(|u| u.to_string())
                    .unwrap_or_else(|| href.to_string());

                let mut record = Record::new();
                record.insert("forum".into(), Value::from(self.forum.as_str()));
                record.insert("title".into(), Value::from(title));
                record.insert("url".into(), Value::from(url));
                let author = selectors
                    .author
                    .as_ref()
                    .and_then(|s| entry.select(s).next())
                    .map(element_text)
                    .filter(|a| !a.is_empty());
                if let Some(author) = author {
                    record.insert("author".into(), Value::from(author));
                }
                record.insert("page".into(), Value::from(page));
                record.insert("scraped_at".into(), Value::from(scraped_at.clone()));
                Some(record)
            })
            .collect()
    }
}

/// Crawl limits shared by every forum.
#[derive(Debug, Clone, Copy)]
pub struct CrawlSettings {
    pub max_pages: u32,
    pub page_delay: Duration,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            max_pages: 50,
            page_delay: Duration::from_secs(1),
        }
    }
}

/// Scrape job that crawls a [`ForumLayout`].
pub struct ListingScraper {
    layout: ForumLayout,
    session: Arc<dyn SessionProvider>,
    store: Arc<dyn RecordStore>,
    settings: CrawlSettings,
}

impl ListingScraper {
    pub fn new(
        layout: ForumLayout,
        session: Arc<dyn SessionProvider>,
        store: Arc<dyn RecordStore>,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            layout,
            session,
            store,
            settings,
        }
    }

    pub fn layout(&self) -> &ForumLayout {
        &self.layout
    }

    async fn fetch(client: &reqwest::Client, url: &str) -> Result<String, ScrapeError> {
        let response = client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::http(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        response.text().await.map_err(|e| ScrapeError::http(url, e))
    }
}

#[async_trait]
impl ScrapeJob for ListingScraper {
    fn forum(&self) -> ForumId {
        self.layout.forum
    }

    async fn run(&self, cancel: CancellationToken) -> Result<JobReport, ScrapeError> {
        let forum = self.layout.forum;
        let selectors = self.layout.selectors()?;
        let client = self.session.client().await?;
        let mut report = JobReport::default();

        for page in 1..=self.settings.max_pages {
            if cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let url = self.layout.listing_url(page);
            let html = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    report.cancelled = true;
                    break;
                }
                body = Self::fetch(&client, &url) => body?,
            };
            report.pages_fetched += 1;

            let records = self.layout.extract(&selectors, &html, page);
            if records.is_empty() {
                debug!(forum = %forum, page, "Listing page has no entries, stopping");
                break;
            }

            let written = self.store.insert_many(forum, &records).await?;
            report.records_written += written;
            info!(forum = %forum, page, records = written, "Scraped listing page");

            if page < self.settings.max_pages && !self.settings.page_delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        report.cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.settings.page_delay) => {}
                }
            }
        }

        info!(
            forum = %forum,
            pages = report.pages_fetched,
            records = report.records_written,
            cancelled = report.cancelled,
            "Listing crawl finished"
        );
        Ok(report)
    }
}
