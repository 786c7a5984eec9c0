use std::cmp::Reverse;

use crate::models::{Headline, RankedHeadline};

pub const DEAL_KEYWORDS: &[&str] = &["acquisition", "merger", "buyout", "takeover", "deal", "M&A"];

const TOP_N: usize = 5;

/// Number of deal keywords that appear in the title, case-insensitively.
pub fn score_title(title: &str) -> usize {
    let title = title.to_lowercase();
    DEAL_KEYWORDS
        .iter()
        .filter(|keyword| title.contains(&keyword.to_lowercase()))
        .count()
}

/// Score, order by descending score (fetch order breaks ties) and keep the top five.
pub fn rank(headlines: Vec<Headline>) -> Vec<RankedHeadline> {
    let mut ranked: Vec<RankedHeadline> = headlines
        .into_iter()
        .map(|headline| RankedHeadline {
            score: score_title(&headline.title),
            headline,
        })
        .collect();

    // sort_by_key is stable
    ranked.sort_by_key(|r| Reverse(r.score));
    ranked.truncate(TOP_N);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headline(title: &str) -> Headline {
        Headline::new(title, format!("https://example.com/{}", title.len()), "")
    }

    #[test]
    fn test_more_keywords_rank_higher() {
        let ranked = rank(vec![
            headline("Acquisition of X"),
            headline("Merger and buyout deal"),
        ]);

        assert_eq!(ranked[0].headline.title, "Merger and buyout deal");
        assert_eq!(ranked[0].score, 3);
        assert_eq!(ranked[1].headline.title, "Acquisition of X");
        assert_eq!(ranked[1].score, 1);
    }

    #[test]
    fn test_ties_keep_fetch_order() {
        let ranked = rank(vec![
            headline("Quarterly results"),
            headline("Takeover talk"),
            headline("Chip outlook"),
            headline("Takeover bid"),
        ]);

        let titles: Vec<_> = ranked.iter().map(|r| r.headline.title.as_str()).collect();
        assert_eq!(titles, ["Takeover talk", "Takeover bid", "Quarterly results", "Chip outlook"]);
    }

    #[test]
    fn test_keeps_top_five() {
        let headlines = (0..8).map(|i| headline(&format!("Story {i}"))).collect();
        let ranked = rank(headlines);
        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[4].headline.title, "Story 4");
    }

    #[test]
    fn test_score_is_case_insensitive_and_counts_each_keyword_once() {
        assert_eq!(score_title("M&A boom: m&a DEAL after deal"), 2);
        assert_eq!(score_title("MERGER"), 1);
        assert_eq!(score_title("Nothing relevant"), 0);
    }

    #[test]
    fn test_empty_input() {
        assert!(rank(Vec::new()).is_empty());
    }
}
