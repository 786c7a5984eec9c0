use std::collections::HashSet;
use std::sync::Arc;

use crate::digest::{Digest, DigestComposer};
use crate::error::Result;
use crate::models::{Recipient, Subscriber};

use super::resend::{EmailMessage, ResendClient, SendReceipt};

/// The provider's batch endpoint takes at most this many messages per call.
pub const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    NothingSent,
    Sent {
        recipients: usize,
        receipts: Vec<SendReceipt>,
    },
}

/// Active subscribers followed by the static list, deduplicated
/// case-insensitively with the first occurrence winning.
pub fn resolve_recipients(subscribers: &[Subscriber], static_recipients: &[String]) -> Vec<Recipient> {
    let mut seen = HashSet::new();

    subscribers
        .iter()
        .filter(|s| !s.unsubscribed)
        .map(Recipient::from)
        .chain(static_recipients.iter().map(|e| Recipient::fixed(e.as_str())))
        .filter_map(|mut recipient| {
            recipient.email = recipient.email.trim().to_string();
            if recipient.email.is_empty() {
                return None;
            }
            seen.insert(recipient.email.to_lowercase()).then_some(recipient)
        })
        .collect()
}

pub struct Dispatcher {
    mailer: Arc<ResendClient>,
    composer: DigestComposer,
    static_recipients: Vec<String>,
}

impl Dispatcher {
    pub fn new(mailer: Arc<ResendClient>, composer: DigestComposer, static_recipients: Vec<String>) -> Self {
        Self {
            mailer,
            composer,
            static_recipients,
        }
    }

    /// Send one personalised copy of the digest to every recipient.
    ///
    /// A provider failure is returned as-is; nothing is retried.
    pub async fn send(&self, digest: &Digest, subscribers: &[Subscriber]) -> Result<DispatchOutcome> {
        let recipients = resolve_recipients(subscribers, &self.static_recipients);
        if recipients.is_empty() {
            tracing::info!("No recipients to send the digest to");
            return Ok(DispatchOutcome::NothingSent);
        }

        let subject = digest.subject();
        let messages: Vec<EmailMessage> = recipients
            .iter()
            .map(|r| {
                self.mailer
                    .message(&r.email, &subject, self.composer.render(digest, r))
            })
            .collect();

        tracing::info!("Sending digest to {} recipients", messages.len());

        let mut receipts = Vec::new();
        for chunk in messages.chunks(MAX_BATCH_SIZE) {
            let receipt = self.mailer.send_batch(chunk).await?;
            tracing::info!("Batch of {} accepted: {} {}", chunk.len(), receipt.status, receipt.body);
            receipts.push(receipt);
        }

        Ok(DispatchOutcome::Sent {
            recipients: recipients.len(),
            receipts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscriber(email: &str) -> Subscriber {
        Subscriber::new(email, "Name")
    }

    #[test]
    fn test_dedup_prefers_subscriber_entry() {
        let subs = vec![subscriber("a@example.com"), subscriber("b@example.com")];
        let fixed = vec!["A@Example.com".to_string(), "ops@example.com".to_string()];

        let recipients = resolve_recipients(&subs, &fixed);
        let emails: Vec<_> = recipients.iter().map(|r| r.email.as_str()).collect();
        assert_eq!(emails, ["a@example.com", "b@example.com", "ops@example.com"]);
        assert!(recipients[0].unsubscribe_token.is_some());
        assert!(recipients[2].unsubscribe_token.is_none());
    }

    #[test]
    fn test_flagged_and_blank_entries_are_dropped() {
        let mut gone = subscriber("gone@example.com");
        gone.unsubscribed = true;
        let fixed = vec!["  ".to_string(), " ops@example.com ".to_string()];

        let recipients = resolve_recipients(&[gone], &fixed);
        assert_eq!(recipients, vec![Recipient::fixed("ops@example.com")]);
    }

    #[test]
    fn test_no_sources_means_no_recipients() {
        assert!(resolve_recipients(&[], &[]).is_empty());
    }
}
