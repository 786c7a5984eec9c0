use std::sync::Arc;

use chrono::Utc;

use crate::ai::Summarizer;
use crate::config::Config;
use crate::db::{open_store, SubscriberStore};
use crate::digest::{Digest, DigestComposer};
use crate::error::{AppError, Result};
use crate::feed::{rank, HeadlineFetcher};
use crate::models::{Recipient, SummaryStatus};
use crate::services::{DispatchOutcome, Dispatcher, ResendClient};

/// What a pipeline run ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunReport {
    /// Fetch came back empty; nothing was summarized or sent.
    NoHeadlines,
    Completed {
        headlines: usize,
        summarized: usize,
        failed_summaries: usize,
        outcome: DispatchOutcome,
    },
}

pub struct App {
    store: Arc<dyn SubscriberStore>,
    fetcher: HeadlineFetcher,
    summarizer: Summarizer,
    composer: DigestComposer,
    dispatcher: Option<Dispatcher>,
}

impl App {
    /// Wire the pipeline from configuration. The dispatcher is only built
    /// when email settings are present; a dry run does not need them.
    pub async fn new(config: &Config) -> Result<Self> {
        let store = open_store(config).await?;
        let fetcher = HeadlineFetcher::new(config.sources.clone())?;
        let summarizer = Summarizer::new(
            config.require_claude_key()?.to_string(),
            config.claude_model.clone(),
        )?;
        let composer = DigestComposer::new(config.unsubscribe_endpoint());

        let dispatcher = match (&config.resend_api_key, &config.sender_email) {
            (Some(key), Some(sender)) => {
                let mailer = Arc::new(ResendClient::new(key.clone(), sender.clone())?);
                Some(Dispatcher::new(
                    mailer,
                    composer.clone(),
                    config.static_recipients.clone(),
                ))
            }
            _ => None,
        };

        Ok(Self::from_parts(store, fetcher, summarizer, composer, dispatcher))
    }

    pub fn from_parts(
        store: Arc<dyn SubscriberStore>,
        fetcher: HeadlineFetcher,
        summarizer: Summarizer,
        composer: DigestComposer,
        dispatcher: Option<Dispatcher>,
    ) -> Self {
        Self {
            store,
            fetcher,
            summarizer,
            composer,
            dispatcher,
        }
    }

    /// Fetch, rank and summarize. `None` when there was nothing to fetch.
    pub async fn build_digest(&self) -> Option<Digest> {
        let headlines = self.fetcher.get_headlines().await;
        if headlines.is_empty() {
            tracing::warn!("No headlines found");
            return None;
        }

        let ranked = rank(headlines);
        tracing::info!(
            "Summarizing {} top headlines with {}",
            ranked.len(),
            self.summarizer.model_version()
        );
        let articles = self.summarizer.summarize_all(&ranked).await;

        Some(Digest::new(articles, Utc::now()))
    }

    /// Fetch → Rank → Summarize → Compose → Dispatch, strictly in order.
    pub async fn run(&self) -> Result<RunReport> {
        let dispatcher = self.dispatcher.as_ref().ok_or_else(|| {
            AppError::Config(
                "missing required variables: EMAIL_SENDER, RESEND_API_KEY".to_string(),
            )
        })?;

        let Some(digest) = self.build_digest().await else {
            return Ok(RunReport::NoHeadlines);
        };

        let failed_summaries = digest
            .articles
            .iter()
            .filter(|a| a.status == SummaryStatus::Failed)
            .count();

        // Recipients are resolved fresh from the store on every run
        let subscribers = self.store.active_subscribers().await?;
        let outcome = dispatcher.send(&digest, &subscribers).await?;

        let report = RunReport::Completed {
            headlines: digest.articles.len(),
            summarized: digest.articles.len() - failed_summaries,
            failed_summaries,
            outcome,
        };
        tracing::info!("Run finished: {:?}", report);
        Ok(report)
    }

    /// Build the digest and render it for a placeholder reader without sending.
    pub async fn preview(&self) -> Option<String> {
        let digest = self.build_digest().await?;
        let sample = Recipient {
            email: "reader@example.com".to_string(),
            unsubscribe_token: Some("preview".to_string()),
        };
        Some(self.composer.render(&digest, &sample))
    }
}
