use std::sync::Arc;

use clap::Parser;
use eyre::{Result, WrapErr};
use log::{info, warn};

use ytbias::Analyzer;
use ytbias::config::{Config, Overrides, Settings, config_path};
use ytbias::inference::ChatClient;
use ytbias::youtube::{InnerTube, TranscriptFetcher};

mod cli;

use cli::Cli;

fn setup_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

fn build_analyzer(settings: &Settings) -> Result<Analyzer> {
    let client = reqwest::Client::builder()
        .build()
        .wrap_err("failed to build HTTP client")?;

    let captions = InnerTube::new(client.clone(), settings.transcript_timeout);
    let transcripts = TranscriptFetcher::new(Arc::new(captions), vec![settings.preferred_lang.clone()]);
    let inference = ChatClient::new(client, settings.inference.clone());

    Ok(Analyzer::new(transcripts, Arc::new(inference)))
}

async fn serve(settings: &Settings, analyzer: Analyzer) -> Result<()> {
    let listener = ytbias::server::bind(&settings.host, settings.port).await?;
    info!("Listening on {} (model {})", listener.local_addr()?, analyzer.model());

    axum::serve(listener, ytbias::server::router(analyzer))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_else(|e| {
        warn!("Ignoring config {}: {e}", config_path().display());
        Config::default()
    });

    let settings = Settings::resolve(
        config,
        Overrides {
            host: cli.host,
            port: cli.port,
            model: cli.model,
            lang: cli.lang,
            api_key: cli.api_key,
        },
    );

    if settings.inference.api_key.is_none() {
        warn!("{} is not set; analysis requests will fail", ytbias::config::API_KEY_ENV);
    }

    let analyzer = build_analyzer(&settings)?;

    match cli.url {
        Some(url) => {
            let result = analyzer.analyze(&url).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        None => serve(&settings, analyzer).await,
    }
}
