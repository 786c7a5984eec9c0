mod summarizer;

pub use summarizer::{Summarizer, DEFAULT_API_URL};
