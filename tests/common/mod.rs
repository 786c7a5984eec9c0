#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, Method, Request};
use axum::Router;
use chrono::{DateTime, Utc};

use ma_newsletter::api::{self, AppState};
use ma_newsletter::db::{SqliteStore, SubscriberStore};
use ma_newsletter::digest::DigestComposer;
use ma_newsletter::services::{ManualClock, RateLimiter, ResendClient};

pub const UNSUBSCRIBE_ENDPOINT: &str = "https://news.example.com/unsubscribe";
pub const ADMIN_TOKEN: &str = "admin-secret";

pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn SubscriberStore>,
    pub clock: Arc<ManualClock>,
}

/// Router over an in-memory store. `mail_server` is the base URL of a mock
/// email provider; without it confirmations are skipped.
pub async fn spawn_app(mail_server: Option<String>) -> TestApp {
    let store: Arc<dyn SubscriberStore> = Arc::new(
        SqliteStore::open_in_memory()
            .await
            .expect("Failed to open in-memory store"),
    );
    let clock = Arc::new(ManualClock::new());

    let mailer = mail_server.map(|url| {
        Arc::new(
            ResendClient::with_api_url(
                "re_test".to_string(),
                "news@example.com".to_string(),
                url,
            )
            .expect("Failed to build email client"),
        )
    });

    let state = AppState {
        store: store.clone(),
        mailer,
        composer: Arc::new(DigestComposer::new(UNSUBSCRIBE_ENDPOINT)),
        limiter: Arc::new(RateLimiter::with_clock(
            5,
            Duration::from_secs(60),
            clock.clone(),
        )),
        admin_token: Some(Arc::from(ADMIN_TOKEN)),
    };

    TestApp {
        router: api::router(state, Path::new("frontend")),
        store,
        clock,
    }
}

pub fn peer(last_octet: u8) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, last_octet)), 40000)
}

/// The oneshot router has no socket, so the peer address is injected.
pub fn subscribe_request(body: &str, from: SocketAddr) -> Request<Body> {
    let mut request = Request::builder()
        .method(Method::POST)
        .uri("/api/subscribe")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("Failed to build request");
    request.extensions_mut().insert(ConnectInfo(from));
    request
}

pub fn get_request(uri: &str) -> Request<Body> {
    let mut request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .expect("Failed to build request");
    request.extensions_mut().insert(ConnectInfo(peer(1)));
    request
}

pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body was not UTF-8")
}

pub fn rss(items: &[(&str, &str, DateTime<Utc>)]) -> String {
    let items: String = items
        .iter()
        .map(|(title, link, date)| {
            format!(
                "<item><title>{}</title><link>{}</link><description>{} snippet</description><pubDate>{}</pubDate></item>",
                title,
                link,
                title,
                date.to_rfc2822()
            )
        })
        .collect();
    format!(
        "<?xml version=\"1.0\"?><rss version=\"2.0\"><channel><title>Deals</title><link>https://example.com</link><description>d</description>{}</channel></rss>",
        items
    )
}

pub fn deals_page(cards: &[(&str, &str)]) -> String {
    let cards: String = cards
        .iter()
        .map(|(title, href)| {
            format!(
                "<div data-testid=\"MediaStoryCard\"><a data-testid=\"Heading\" href=\"{}\">{}</a><p>{} teaser</p></div>",
                href, title, title
            )
        })
        .collect();
    format!("<html><body>{}</body></html>", cards)
}
