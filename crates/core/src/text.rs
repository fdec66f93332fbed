// crates/core/src/text.rs
//! Text normalisation for scraped markup.

use regex_lite::Regex;
use scraper::ElementRef;
use std::sync::OnceLock;

static LINE_BREAKS: OnceLock<Regex> = OnceLock::new();
static SPACE_RUNS: OnceLock<Regex> = OnceLock::new();

fn line_breaks() -> &'static Regex {
    LINE_BREAKS.get_or_init(|| Regex::new(r"[\n\r]+").expect("valid line-break regex"))
}

fn space_runs() -> &'static Regex {
    SPACE_RUNS.get_or_init(|| Regex::new(r"\s{2,}").expect("valid whitespace regex"))
}

/// Collapse line breaks and whitespace runs to a single space, then trim.
pub fn clean_text(text: &str) -> String {
    let text = line_breaks().replace_all(text, " ");
    let text = space_runs().replace_all(&text, " ");
    text.trim().to_string()
}

/// All text beneath `element`, entities already decoded by the parser,
/// passed through [`clean_text`].
pub fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use scraper::{Html, Selector};

    fn first_text(html: &str, selector: &str) -> String {
        let document = Html::parse_fragment(html);
        let selector = Selector::parse(selector).unwrap();
        element_text(document.select(&selector).next().unwrap())
    }

    #[test]
    fn test_clean_text_collapses_breaks_and_spaces() {
        assert_eq!(clean_text("  hello\r\n\nworld   again  "), "hello world again");
    }

    #[test]
    fn test_clean_text_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text(" \n\t "), "");
    }

    #[test]
    fn test_element_text_strips_nested_tags() {
        assert_eq!(
            first_text("<p><b>Market</b>\n  review &amp; <i>guide</i></p>", "p"),
            "Market review & guide"
        );
    }

    #[test]
    fn test_element_text_decodes_numeric_and_named_entities() {
        assert_eq!(
            first_text(
                "<span>Don&#8217;t &apos;x&apos; &#x27;y&#x27; caf&eacute;</span>",
                "span"
            ),
            "Don\u{2019}t 'x' 'y' caf\u{e9}"
        );
    }

    #[test]
    fn test_element_text_keeps_escaped_markup_literal() {
        assert_eq!(first_text("<span>a &amp;lt; b</span>", "span"), "a &lt; b");
    }
}
