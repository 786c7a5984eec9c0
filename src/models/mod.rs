mod headline;
mod subscriber;
mod summary;

pub use headline::{Headline, RankedHeadline};
pub use subscriber::{Recipient, Subscriber};
pub use summary::{SummarizedArticle, SummaryStatus};
