use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry};

use transcript_server::cli::{Cli, Commands};
use transcript_server::config::Config;
use transcript_server::fetcher::{TimeoutFetcher, TranscriptFetcher, YoutubeFetcher};
use transcript_server::server::{self, routes::RawSegment};
use transcript_server::service::TranscriptService;
use transcript_server::utils;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let log_filter = init_tracing(cli.verbose, cli.log_json);

    let mut config = Config::load(cli.config.as_deref())?;

    if let Commands::Serve { host, port, debug } = &cli.command {
        if let Some(host) = host {
            config.server.host = host.clone();
        }
        if let Some(port) = port {
            config.server.port = *port;
        }
        config.server.debug |= *debug;
    }

    // Debug may only be known once the config file and env are read
    if config.server.debug && !cli.verbose {
        if let Err(e) = log_filter.reload(log_filter_for(true)) {
            tracing::warn!("Failed to raise log level for debug mode: {}", e);
        }
    }

    match cli.command {
        Commands::Serve { .. } => {
            let service = build_service(&config)?;
            tracing::info!(
                "Starting transcript server (max batch size {}, debug {})",
                config.limits.max_batch_size,
                config.server.debug
            );
            server::serve(&config, service).await?;
        }
        Commands::Fetch {
            video,
            languages,
            list,
        } => {
            if !languages.is_empty() {
                config.youtube.languages = languages;
            }
            let service = build_service(&config)?;
            let video_id = utils::extract_video_id(&video);

            let output = if list {
                serde_json::to_string_pretty(&service.languages(&video_id).await?)?
            } else {
                let segments: Vec<RawSegment> = service
                    .transcript(&video_id)
                    .await?
                    .into_iter()
                    .map(RawSegment::from)
                    .collect();
                serde_json::to_string_pretty(&segments)?
            };
            println!("{}", output);
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                println!("Configuration is read from --config, ./config.yaml or the user config directory,");
                println!("then overridden by environment variables. Use --show to print it.");
            }
        }
    }

    Ok(())
}

/// Install the subscriber; the returned handle swaps the level filter later
fn init_tracing(verbose: bool, json: bool) -> reload::Handle<EnvFilter, Registry> {
    let (filter, handle) = reload::Layer::new(log_filter_for(verbose));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    handle
}

fn log_filter_for(verbose: bool) -> EnvFilter {
    let default_filter = if verbose {
        "transcript_server=debug,tower_http=debug"
    } else {
        "transcript_server=info,tower_http=info"
    };

    EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into())
}

/// Construct the fetcher once and inject it into the service
fn build_service(config: &Config) -> Result<TranscriptService> {
    let youtube = YoutubeFetcher::new(config)?;

    let fetcher: Arc<dyn TranscriptFetcher> = match config.upstream_timeout() {
        Some(limit) => Arc::new(TimeoutFetcher::new(youtube, limit)),
        None => Arc::new(youtube),
    };

    Ok(TranscriptService::new(fetcher).with_limits(&config.limits))
}
