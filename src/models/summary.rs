use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizedArticle {
    pub title: String,
    pub link: String,
    pub summary: String,
    #[serde(skip)]
    pub status: SummaryStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryStatus {
    #[default]
    Generated,
    /// The model call failed and `summary` holds the error marker.
    Failed,
}
