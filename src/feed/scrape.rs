use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::Headline;

use super::fetcher::is_excluded;

const CARD_SELECTOR: &str = r#"div[data-testid="MediaStoryCard"]"#;
const HEADING_SELECTOR: &str = r#"a[data-testid="Heading"]"#;
const SNIPPET_SELECTOR: &str = "p";

/// Only this many cards are looked at, before filtering.
const MAX_CARDS: usize = 20;

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| anyhow::anyhow!("invalid selector {}: {:?}", css, e).into())
}

/// Extract headlines from the story cards of a deals page.
///
/// Cards without a heading link are skipped, as are excluded topics and
/// links that are not http(s).
/// Relative links resolve against `base`.
pub fn parse_story_cards(html: &str, base: &Url) -> Result<Vec<Headline>> {
    let card_sel = selector(CARD_SELECTOR)?;
    let heading_sel = selector(HEADING_SELECTOR)?;
    let snippet_sel = selector(SNIPPET_SELECTOR)?;

    let document = Html::parse_document(html);

    let headlines = document
        .select(&card_sel)
        .take(MAX_CARDS)
        .filter_map(|card| {
            let anchor = card.select(&heading_sel).next()?;
            let title = element_text(anchor);
            if title.is_empty() || is_excluded(&title) {
                return None;
            }

            let href = anchor.value().attr("href")?;
            let link = resolve_link(base, href)?;

            let summary = card
                .select(&snippet_sel)
                .next()
                .map(element_text)
                .unwrap_or_default();

            Some(Headline { title, link, summary })
        })
        .collect();

    Ok(headlines)
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Absolute link for `href`, or `None` unless it resolves to an http(s) URL.
fn resolve_link(base: &Url, href: &str) -> Option<String> {
    let url = base.join(href.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}
