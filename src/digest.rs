//! HTML rendering for the digest and the subscription confirmation mail.
//!
//! Each recipient gets their own document so that no unsubscribe token is
//! ever shown to anyone but its owner.

use chrono::{DateTime, Utc};

use crate::models::{Recipient, SummarizedArticle};

pub const NEWSLETTER_NAME: &str = "M&A Newsletter";

/// The articles of one pipeline run.
#[derive(Debug, Clone)]
pub struct Digest {
    pub articles: Vec<SummarizedArticle>,
    pub generated_at: DateTime<Utc>,
}

impl Digest {
    pub fn new(articles: Vec<SummarizedArticle>, generated_at: DateTime<Utc>) -> Self {
        Self {
            articles,
            generated_at,
        }
    }

    pub fn subject(&self) -> String {
        format!("M&A Deals – {}", self.generated_at.format("%b %d, %Y"))
    }
}

#[derive(Debug, Clone)]
pub struct DigestComposer {
    unsubscribe_endpoint: String,
}

impl DigestComposer {
    /// `unsubscribe_endpoint` is the absolute URL of the unsubscribe route.
    pub fn new(unsubscribe_endpoint: impl Into<String>) -> Self {
        Self {
            unsubscribe_endpoint: unsubscribe_endpoint.into(),
        }
    }

    pub fn unsubscribe_url(&self, email: &str, token: &str) -> String {
        format!(
            "{}?email={}&token={}",
            self.unsubscribe_endpoint,
            urlencoding::encode(email),
            urlencoding::encode(token)
        )
    }

    /// Render the digest for a single recipient.
    pub fn render(&self, digest: &Digest, recipient: &Recipient) -> String {
        let mut html = String::new();

        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"UTF-8\">\n");
        html.push_str(&format!("  <title>{}</title>\n", escape_html(&digest.subject())));
        html.push_str("</head>\n<body>\n");
        html.push_str(&format!("<h1>{}</h1>\n", escape_html(NEWSLETTER_NAME)));
        html.push_str("<p>Here are today's top M&amp;A headlines and summaries:</p>\n");

        for article in &digest.articles {
            html.push_str("<div style=\"margin-bottom:20px;\">\n");
            html.push_str(&format!(
                "  <strong style=\"color:#000;font-weight:700;\">{}</strong><br>\n",
                escape_html(&article.title)
            ));
            html.push_str(&format!("  <em>{}</em><br>\n", escape_html(&article.summary)));
            html.push_str(&format!(
                "  <a href=\"{}\">Read more</a>\n",
                escape_html(&article.link)
            ));
            html.push_str("</div>\n");
        }

        if let Some(token) = &recipient.unsubscribe_token {
            html.push_str(&self.footer(&recipient.email, token));
        }

        html.push_str("</body>\n</html>");
        html
    }

    pub fn render_confirmation(&self, email: &str, token: &str) -> String {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<body>\n");
        html.push_str(&format!("<h1>{}</h1>\n", escape_html(NEWSLETTER_NAME)));
        html.push_str("<p>You've subscribed to the M&amp;A Newsletter.</p>\n");
        html.push_str(&format!(
            "<a href=\"{}\">Unsubscribe</a>\n",
            escape_html(&self.unsubscribe_url(email, token))
        ));
        html.push_str("</body>\n</html>");
        html
    }

    fn footer(&self, email: &str, token: &str) -> String {
        format!(
            "<hr>\n<p style=\"font-size:12px;color:#666;\">You are receiving this because {} subscribed. \
             <a href=\"{}\">Unsubscribe</a></p>\n",
            escape_html(email),
            escape_html(&self.unsubscribe_url(email, token))
        )
    }
}

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SummaryStatus;
    use chrono::TimeZone;

    fn composer() -> DigestComposer {
        DigestComposer::new("https://news.example.com/unsubscribe")
    }

    fn digest() -> Digest {
        Digest::new(
            vec![SummarizedArticle {
                title: "Acme & Widget <merge>".to_string(),
                link: "https://example.com/a?x=1&y=2".to_string(),
                summary: "A big deal.".to_string(),
                status: SummaryStatus::Generated,
            }],
            Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_subject_contains_date() {
        assert_eq!(digest().subject(), "M&A Deals – Oct 16, 2026");
    }

    #[test]
    fn test_unsubscribe_url_escapes_parameters() {
        let url = composer().unsubscribe_url("a+b@example.com", "t k&n");
        assert_eq!(
            url,
            "https://news.example.com/unsubscribe?email=a%2Bb%40example.com&token=t%20k%26n"
        );
    }

    #[test]
    fn test_render_escapes_article_fields() {
        let html = composer().render(&digest(), &Recipient::fixed("x@example.com"));
        assert!(html.contains("Acme &amp; Widget &lt;merge&gt;"));
        assert!(html.contains("href=\"https://example.com/a?x=1&amp;y=2\""));
        assert!(html.contains("<em>A big deal.</em>"));
    }

    #[test]
    fn test_footer_only_carries_own_token() {
        let composer = composer();
        let alice = Recipient {
            email: "alice@example.com".to_string(),
            unsubscribe_token: Some("alice-token".to_string()),
        };
        let bob = Recipient {
            email: "bob@example.com".to_string(),
            unsubscribe_token: Some("bob-token".to_string()),
        };

        let for_alice = composer.render(&digest(), &alice);
        assert!(for_alice.contains("alice-token"));
        assert!(!for_alice.contains("bob-token"));
        assert!(!for_alice.contains("bob%40example.com"));

        let for_bob = composer.render(&digest(), &bob);
        assert!(for_bob.contains("bob-token"));
        assert!(!for_bob.contains("alice-token"));
    }

    #[test]
    fn test_static_recipient_gets_no_footer() {
        let html = composer().render(&digest(), &Recipient::fixed("ops@example.com"));
        assert!(!html.contains("Unsubscribe"));
    }

    #[test]
    fn test_confirmation_links_to_unsubscribe() {
        let html = composer().render_confirmation("a@example.com", "tok");
        assert!(html.contains("/unsubscribe?email=a%40example.com&amp;token=tok"));
    }

    #[test]
    fn test_escape_html_combined() {
        assert_eq!(
            escape_html("<a href=\"test\">Click & Go's</a>"),
            "&lt;a href=&quot;test&quot;&gt;Click &amp; Go&#39;s&lt;/a&gt;"
        );
    }
}
