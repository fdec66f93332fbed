// crates/core/src/forums/dread.rs
//! Dread: a Reddit-style board. Listings page with `?p=N`.

use crate::forum::ForumId;
use crate::listing::{ForumLayout, PAGE_PLACEHOLDER};

/// One post row on a board listing.
pub const ENTRY_SELECTOR: &str = "div.item";
pub const LINK_SELECTOR: &str = "a.title";
pub const AUTHOR_SELECTOR: &str = "a.username";

pub fn layout(base_url: &str) -> ForumLayout {
    let base = base_url.trim_end_matches('/');
    ForumLayout {
        forum: ForumId::Dread,
        base_url: format!("{base}/"),
        listing_template: format!("{base}/?p={PAGE_PLACEHOLDER}"),
        entry_selector: ENTRY_SELECTOR.to_string(),
        link_selector: LINK_SELECTOR.to_string(),
        author_selector: Some(AUTHOR_SELECTOR.to_string()),
    }
}
