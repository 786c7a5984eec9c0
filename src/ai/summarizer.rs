use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Headline, RankedHeadline, SummarizedArticle, SummaryStatus};

pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";

const SYSTEM_PROMPT: &str = "You are a financial news analyst specializing in M&A. You are providing a brief overview of a deal or decision in a newsletter summary. When you get the article, produce a summary that covers what the deal or decision is, the context of the deal or decision in its space, the motivation behind it for either company, and its potential impact. Provide a 4-7 sentence summary for a newsletter.";

#[derive(Debug, Serialize)]
struct MessageRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
    system: Option<String>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    content_type: String,
    text: Option<String>,
}

pub struct Summarizer {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
}

impl Summarizer {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        Self::with_api_url(api_key, model, DEFAULT_API_URL.to_string())
    }

    pub fn with_api_url(api_key: String, model: String, api_url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            api_key,
            api_url,
            model,
        })
    }

    fn user_prompt(headline: &Headline) -> String {
        format!(
            "Write a concise 5-7 sentence summary suitable for an M&A newsletter, including stats and numbers where applicable. \
             Focus on the companies involved, deal value (if mentioned), and strategic rationale.\n\n\
             Headline: {}\n\
             Extracted snippet: {}\n",
            headline.title, headline.summary
        )
    }

    pub async fn generate_summary(&self, headline: &Headline) -> Result<String> {
        let request = MessageRequest {
            model: self.model.clone(),
            max_tokens: 1024,
            messages: vec![Message {
                role: "user".to_string(),
                content: Self::user_prompt(headline),
            }],
            system: Some(SYSTEM_PROMPT.to_string()),
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::ClaudeApi(format!("API error: {}", error_text)));
        }

        let message_response: MessageResponse = response.json().await?;

        let summary = message_response
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");

        Ok(summary.trim().to_string())
    }

    /// Summarize one headline. A failed model call becomes an error marker
    /// in place of the summary instead of failing the batch.
    pub async fn summarize(&self, headline: &Headline) -> SummarizedArticle {
        let (summary, status) = match self.generate_summary(headline).await {
            Ok(summary) => (summary, SummaryStatus::Generated),
            Err(e) => {
                tracing::warn!("Failed to summarize {:?}: {}", headline.title, e);
                (format!("Error summarizing: {}", e), SummaryStatus::Failed)
            }
        };

        SummarizedArticle {
            title: headline.title.clone(),
            link: headline.link.clone(),
            summary,
            status,
        }
    }

    /// Summaries in ranking order, one model call at a time.
    pub async fn summarize_all(&self, ranked: &[RankedHeadline]) -> Vec<SummarizedArticle> {
        stream::iter(ranked)
            .then(|r| self.summarize(&r.headline))
            .collect()
            .await
    }

    pub fn model_version(&self) -> &str {
        &self.model
    }
}
