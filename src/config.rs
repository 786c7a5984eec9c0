use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

const CONFIG_ENV: &str = "MA_NEWSLETTER_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Sqlite,
    Json,
    Supabase,
}

impl std::str::FromStr for StoreKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "json" | "file" => Ok(Self::Json),
            "supabase" | "postgrest" => Ok(Self::Supabase),
            other => Err(AppError::Config(format!("unknown subscriber store: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreKind,

    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_subscribers_file")]
    pub subscribers_file: String,

    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,

    pub admin_token: Option<String>,
    pub sender_email: Option<String>,
    pub resend_api_key: Option<String>,
    pub claude_api_key: Option<String>,

    #[serde(default = "default_claude_model")]
    pub claude_model: String,

    /// Extra addresses that receive every digest.
    #[serde(default)]
    pub static_recipients: Vec<String>,

    /// Public origin used to build unsubscribe links.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    #[serde(default = "default_static_dir")]
    pub static_dir: String,

    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    #[serde(default)]
    pub sources: SourceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub limit: usize,
    pub per_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            limit: 5,
            per_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub feed_url: String,
    pub fallback_url: String,
    /// Origin that relative links on the fallback page resolve against.
    pub site_base_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            feed_url: "https://feeds.reuters.com/reuters/mergersNews".to_string(),
            fallback_url: "https://www.reuters.com/markets/deals/".to_string(),
            site_base_url: "https://www.reuters.com".to_string(),
        }
    }
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ma-newsletter");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("subscribers.db").to_string_lossy().to_string()
}

fn default_subscribers_file() -> String {
    "subscribers.json".to_string()
}

fn default_claude_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_static_dir() -> String {
    "frontend".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreKind::default(),
            db_path: default_db_path(),
            subscribers_file: default_subscribers_file(),
            supabase_url: None,
            supabase_key: None,
            admin_token: None,
            sender_email: None,
            resend_api_key: None,
            claude_api_key: None,
            claude_model: default_claude_model(),
            static_recipients: Vec::new(),
            public_base_url: default_public_base_url(),
            bind_addr: default_bind_addr(),
            static_dir: default_static_dir(),
            rate_limit: RateLimitConfig::default(),
            sources: SourceConfig::default(),
        }
    }
}

impl Config {
    /// Read the config file (writing a default one if missing), then apply
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str::<Config>(&content)?
        } else {
            let config = Config::default();
            config.save()?;
            config
        };

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ma-newsletter")
            .join("config.toml")
    }

    /// Overlay values from the environment. Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(kind) = get("SUBSCRIBER_STORE").and_then(|v| v.parse().ok()) {
            self.store = kind;
        }
        if let Some(v) = get("DATABASE_PATH") {
            self.db_path = v;
        }
        if let Some(v) = get("SUBSCRIBERS_FILE") {
            self.subscribers_file = v;
        }
        if let Some(v) = get("SUPABASE_URL") {
            self.supabase_url = Some(v);
        }
        if let Some(v) = get("SUPABASE_KEY") {
            self.supabase_key = Some(v);
        }
        if let Some(v) = get("ADMIN_TOKEN") {
            self.admin_token = Some(v);
        }
        if let Some(v) = get("EMAIL_SENDER").or_else(|| get("FROM_EMAIL")) {
            self.sender_email = Some(v);
        }
        if let Some(v) = get("RESEND_API_KEY") {
            self.resend_api_key = Some(v);
        }
        if let Some(v) = get("ANTHROPIC_API_KEY") {
            self.claude_api_key = Some(v);
        }
        if let Some(v) = get("EMAIL_RECIPIENTS") {
            self.static_recipients = v
                .split(',')
                .map(str::trim)
                .filter(|e| !e.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(v) = get("PUBLIC_BASE_URL") {
            self.public_base_url = v;
        }
        if let Some(port) = get("PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.bind_addr = format!("0.0.0.0:{}", port);
        }
    }

    /// Settings a real pipeline run cannot do without.
    pub fn require_pipeline(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("EMAIL_SENDER", self.sender_email.is_none()),
            ("RESEND_API_KEY", self.resend_api_key.is_none()),
            ("ANTHROPIC_API_KEY", self.claude_api_key.is_none()),
        ]
        .into_iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::Config(format!(
                "missing required variables: {}",
                missing.join(", ")
            )))
        }
    }

    pub fn require_claude_key(&self) -> Result<&str> {
        self.claude_api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("missing required variables: ANTHROPIC_API_KEY".to_string()))
    }

    /// Where subscribers land when they follow their unsubscribe link.
    pub fn unsubscribe_endpoint(&self) -> String {
        format!("{}/unsubscribe", self.public_base_url.trim_end_matches('/'))
    }
}
