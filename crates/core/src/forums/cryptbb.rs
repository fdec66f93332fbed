// crates/core/src/forums/cryptbb.rs
//! CryptBB: a MyBB install. Threads are listed per board (`fid`).

use crate::forum::ForumId;
use crate::listing::{ForumLayout, PAGE_PLACEHOLDER};

/// One thread row of a MyBB `forumdisplay.php` table.
pub const ENTRY_SELECTOR: &str = "tr.inline_row";
/// Thread subject link; MyBB ids the wrapping span `tid_<n>`.
pub const LINK_SELECTOR: &str = r#"span[id^="tid_"] > a"#;
pub const AUTHOR_SELECTOR: &str = "div.author a";

pub fn layout(base_url: &str, fid: u32) -> ForumLayout {
    let base = base_url.trim_end_matches('/');
    ForumLayout {
        forum: ForumId::CryptBb,
        base_url: format!("{base}/"),
        listing_template: format!("{base}/forumdisplay.php?fid={fid}&page={PAGE_PLACEHOLDER}"),
        entry_selector: ENTRY_SELECTOR.to_string(),
        link_selector: LINK_SELECTOR.to_string(),
        author_selector: Some(AUTHOR_SELECTOR.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<table class="tborder">
<tr class="inline_row">
<td>
<span class="subject_old" id="tid_41"><a href="showthread.php?tid=41">Exploit dev resources</a></span>
<div class="author smalltext"><a href="member.php?action=profile&amp;uid=7">bob</a></div>
</td>
</tr>
<tr class="inline_row">
<td>
<span class="subject_new" id="tid_42"><a href="showthread.php?tid=42">[RELEASE] &quot;tool&quot; v2&#8482;</a></span>
</td>
</tr>
<tr class="inline_row"><td>Moved thread, no subject link</td></tr>
</table>"#;

    #[test]
    fn test_listing_url() {
        let l = layout("http://cryptbb.test", 5);
        assert_eq!(
            l.listing_url(2),
            "http://cryptbb.test/forumdisplay.php?fid=5&page=2"
        );
    }

    #[test]
    fn test_extract_threads() {
        let l = layout("http://cryptbb.test", 5);
        let records = l.extract(&l.selectors().unwrap(), PAGE, 3);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["title"], "Exploit dev resources");
        assert_eq!(records[0]["url"], "http://cryptbb.test/showthread.php?tid=41");
        assert_eq!(records[0]["author"], "bob");
        assert_eq!(records[0]["forum"], "cryptbb");
        assert_eq!(records[1]["title"], "[RELEASE] \"tool\" v2\u{2122}");
        assert_eq!(records[1]["page"], 3);
        assert!(!records[1].contains_key("author"));
    }
}
