mod fetcher;
mod ranker;
mod scrape;

pub use fetcher::{is_excluded, select_feed_entries, HeadlineFetcher, EXCLUDE_KEYWORDS};
pub use ranker::{rank, score_title, DEAL_KEYWORDS};
pub use scrape::parse_story_cards;
