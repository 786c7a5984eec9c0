use serde::{Deserialize, Serialize};

/// A candidate news item as it came off the feed or the fallback page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub link: String,
    /// Source snippet, possibly empty.
    pub summary: String,
}

impl Headline {
    pub fn new(title: impl Into<String>, link: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            summary: summary.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedHeadline {
    pub headline: Headline,
    /// Number of deal keywords found in the title.
    pub score: usize,
}
