//! M&A news digest: headline acquisition, ranking, AI summaries, and a small
//! subscription API that manages who receives the digest.

pub mod ai;
pub mod api;
pub mod app;
pub mod config;
pub mod db;
pub mod digest;
pub mod error;
pub mod feed;
pub mod models;
pub mod services;
pub mod validation;

pub use app::{App, RunReport};
pub use config::Config;
pub use error::{AppError, Result};
