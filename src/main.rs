use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use ma_newsletter::api::{self, AppState};
use ma_newsletter::db::open_store;
use ma_newsletter::digest::DigestComposer;
use ma_newsletter::services::{RateLimiter, ResendClient};
use ma_newsletter::{App, Config, RunReport};

#[derive(Debug, Parser)]
#[command(name = "ma-newsletter", version, about = "M&A news digest and subscription server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the subscription API and landing page
    Serve {
        /// Address to bind, overrides the configured one
        #[arg(long)]
        addr: Option<SocketAddr>,
    },
    /// Fetch, summarize and send one digest
    Run {
        /// Build the digest but write it out instead of sending it
        #[arg(long)]
        dry_run: bool,
        /// Where the dry-run preview goes (stdout if omitted)
        #[arg(long, requires = "dry_run")]
        output: Option<PathBuf>,
    },
    /// Print stored subscribers as JSON
    Subscribers,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Not an error if the file doesn't exist
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("Warning: Failed to load .env: {}", e);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("failed to load configuration")?;

    match cli.command {
        Command::Serve { addr } => serve(config, addr).await,
        Command::Run { dry_run, output } => run(config, dry_run, output.as_deref()).await,
        Command::Subscribers => {
            let store = open_store(&config).await?;
            let subscribers = store.list_all().await?;
            println!("{}", serde_json::to_string_pretty(&subscribers)?);
            Ok(())
        }
    }
}

async fn serve(config: Config, addr: Option<SocketAddr>) -> anyhow::Result<()> {
    let store = open_store(&config).await?;

    let mailer = match (&config.resend_api_key, &config.sender_email) {
        (Some(key), Some(sender)) => Some(Arc::new(ResendClient::new(key.clone(), sender.clone())?)),
        _ => {
            tracing::info!("Email provider not configured - confirmation emails disabled");
            None
        }
    };

    if config.admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN not set - admin endpoint will reject every request");
    }

    let state = AppState {
        store,
        mailer,
        composer: Arc::new(DigestComposer::new(config.unsubscribe_endpoint())),
        limiter: Arc::new(RateLimiter::new(
            config.rate_limit.limit,
            Duration::from_secs(config.rate_limit.per_seconds),
        )),
        admin_token: config.admin_token.as_deref().map(Arc::from),
    };

    let app = api::router(state, Path::new(&config.static_dir));

    let addr = match addr {
        Some(addr) => addr,
        None => config
            .bind_addr
            .parse()
            .with_context(|| format!("invalid bind address {}", config.bind_addr))?,
    };

    tracing::info!("Server listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

async fn run(config: Config, dry_run: bool, output: Option<&Path>) -> anyhow::Result<()> {
    if !dry_run {
        config.require_pipeline()?;
    }
    let app = App::new(&config).await?;

    if dry_run {
        let Some(html) = app.preview().await else {
            println!("No headlines found");
            return Ok(());
        };
        match output {
            Some(path) => {
                std::fs::write(path, html)?;
                println!("Wrote preview to {}", path.display());
            }
            None => println!("{}", html),
        }
        return Ok(());
    }

    match app.run().await? {
        RunReport::NoHeadlines => println!("No headlines found"),
        RunReport::Completed {
            headlines,
            failed_summaries,
            outcome,
            ..
        } => {
            println!(
                "Digest with {} headlines ({} summaries failed): {:?}",
                headlines, failed_summaries, outcome
            );
        }
    }

    Ok(())
}
