use std::time::Duration;

use chrono::{DateTime, Utc};
use feed_rs::model::Feed;
use feed_rs::parser;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::Client;
use url::Url;

use crate::config::SourceConfig;
use crate::error::Result;
use crate::models::Headline;

use super::scrape::parse_story_cards;

const USER_AGENT_STRING: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36";

pub const EXCLUDE_KEYWORDS: &[&str] = &[
    "sports",
    "science",
    "lifestyle",
    "pictures",
    "graphics",
    "entertainment",
    "gaming",
];

const MAX_FEED_ENTRIES: usize = 15;
const MAX_HEADLINES: usize = 10;
const RECENT_DAYS: i64 = 2;
const SCRAPE_TIMEOUT: Duration = Duration::from_secs(10);

/// True when the title mentions a topic the digest never covers.
pub fn is_excluded(title: &str) -> bool {
    let title = title.to_lowercase();
    EXCLUDE_KEYWORDS.iter().any(|k| title.contains(k))
}

/// Turn parsed feed entries into headlines.
///
/// Looks at the first 15 entries only, drops excluded topics, and keeps
/// entries published after `cutoff`. Entries without a date are dropped.
pub fn select_feed_entries(feed: Feed, cutoff: DateTime<Utc>) -> Vec<Headline> {
    feed.entries
        .into_iter()
        .take(MAX_FEED_ENTRIES)
        .filter_map(|entry| {
            let title = entry.title.map(|t| t.content)?;
            if is_excluded(&title) {
                return None;
            }

            let published = entry.published.or(entry.updated)?;
            if published <= cutoff {
                return None;
            }

            let link = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();

            let summary = entry
                .summary
                .map(|s| snippet_text(&s.content))
                .unwrap_or_default();

            Some(Headline {
                title: title.trim().to_string(),
                link,
                summary,
            })
        })
        .collect()
}

fn snippet_text(html: &str) -> String {
    html2text::from_read(html.as_bytes(), 120)
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
        .unwrap_or_else(|_| html.trim().to_string())
}

pub struct HeadlineFetcher {
    client: Client,
    sources: SourceConfig,
}

impl HeadlineFetcher {
    pub fn new(sources: SourceConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT_STRING)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, sources })
    }

    /// Recent, on-topic entries from the structured feed.
    pub async fn fetch_primary(&self) -> Result<Vec<Headline>> {
        let response = self.client.get(&self.sources.feed_url).send().await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Failed to fetch feed: HTTP {}", response.status()).into());
        }

        let bytes = response.bytes().await?;
        let feed = parser::parse(&bytes[..])?;

        let cutoff = Utc::now() - chrono::Duration::days(RECENT_DAYS);
        Ok(select_feed_entries(feed, cutoff))
    }

    /// Story cards scraped from the deals page. Any failure yields an empty list.
    pub async fn fetch_fallback(&self) -> Vec<Headline> {
        match self.try_fetch_fallback().await {
            Ok(headlines) => headlines,
            Err(e) => {
                tracing::warn!("Error fetching fallback page {}: {}", self.sources.fallback_url, e);
                Vec::new()
            }
        }
    }

    async fn try_fetch_fallback(&self) -> Result<Vec<Headline>> {
        let base = Url::parse(&self.sources.site_base_url)?;

        let response = self
            .client
            .get(&self.sources.fallback_url)
            .timeout(SCRAPE_TIMEOUT)
            .send()
            .await?
            .error_for_status()?;

        let html = response.text().await?;
        parse_story_cards(&html, &base)
    }

    /// Primary feed first; the scrape only runs when the feed yields nothing.
    pub async fn get_headlines(&self) -> Vec<Headline> {
        let primary = self.fetch_primary().await.unwrap_or_else(|e| {
            tracing::warn!("Failed to read feed {}: {}", self.sources.feed_url, e);
            Vec::new()
        });

        if !primary.is_empty() {
            tracing::info!("Fetched {} headlines from feed", primary.len());
            return primary.into_iter().take(MAX_HEADLINES).collect();
        }

        tracing::info!("Feed empty, falling back to page scrape");
        let fallback = self.fetch_fallback().await;
        tracing::info!("Fetched {} headlines from fallback page", fallback.len());
        fallback.into_iter().take(MAX_HEADLINES).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn rss(items: &[(&str, Option<DateTime<Utc>>)]) -> String {
        let items: String = items
            .iter()
            .enumerate()
            .map(|(i, &(title, date))| {
                let date = date
                    .map(|d| format!("<pubDate>{}</pubDate>", d.to_rfc2822()))
                    .unwrap_or_default();
                format!(
                    "<item><title>{title}</title><link>https://example.com/{i}</link>\
                     <description>&lt;p&gt;Snippet {i}&lt;/p&gt;</description>{date}</item>"
                )
            })
            .collect();
        format!(r#"<?xml version="1.0"?><rss version="2.0"><channel><title>Deals</title>{items}</channel></rss>"#)
    }

    fn parse(xml: &str) -> Feed {
        parser::parse(xml.as_bytes()).unwrap()
    }

    #[test]
    fn test_excluded_keywords_are_case_insensitive() {
        assert!(is_excluded("SPORTS: club takeover"));
        assert!(is_excluded("Gaming studio merger"));
        assert!(!is_excluded("Bank merger approved"));
    }

    #[test]
    fn test_filters_topic_and_age() {
        let now = Utc::now();
        let cutoff = now - ChronoDuration::days(2);
        let xml = rss(&[
            ("Acme buys Widget", Some(now - ChronoDuration::hours(3))),
            ("Sports league buyout", Some(now - ChronoDuration::hours(3))),
            ("Old merger news", Some(now - ChronoDuration::days(3))),
            ("Undated deal", None),
        ]);

        let headlines = select_feed_entries(parse(&xml), cutoff);
        assert_eq!(headlines.len(), 1);
        assert_eq!(headlines[0].title, "Acme buys Widget");
        assert_eq!(headlines[0].link, "https://example.com/0");
        assert_eq!(headlines[0].summary, "Snippet 0");
    }

    #[test]
    fn test_only_first_fifteen_entries_are_considered() {
        let now = Utc::now();
        let titles: Vec<String> = (0..20).map(|i| format!("Deal {i}")).collect();
        let items: Vec<(&str, Option<DateTime<Utc>>)> = titles
            .iter()
            .map(|t| (t.as_str(), Some(now - ChronoDuration::hours(1))))
            .collect();

        let headlines = select_feed_entries(parse(&rss(&items)), now - ChronoDuration::days(2));
        assert_eq!(headlines.len(), 15);
    }
}
