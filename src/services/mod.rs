mod dispatcher;
mod rate_limiter;
mod resend;

pub use dispatcher::{resolve_recipients, DispatchOutcome, Dispatcher, MAX_BATCH_SIZE};
pub use rate_limiter::{Clock, ManualClock, RateLimited, RateLimiter, SystemClock};
pub use resend::{EmailMessage, ResendClient, SendReceipt, DEFAULT_API_URL};
