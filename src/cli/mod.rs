use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "transcript-server",
    about = "YouTube Transcript API - serve transcript data for YouTube videos over HTTP",
    version,
    long_about = "An HTTP API server that fetches transcript data for YouTube videos. Supports single lookups, language listings and batch requests with per-video success reporting."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to a YAML config file
    #[arg(short, long, global = true, env = "TRANSCRIPT_SERVER_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to bind (overrides config)
        #[arg(long, value_name = "HOST")]
        host: Option<String>,

        /// Port to listen on (overrides config)
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,

        /// Debug mode: verbose logs and no upstream proxy
        #[arg(long)]
        debug: bool,
    },

    /// Fetch one transcript and print it as JSON
    Fetch {
        /// YouTube video ID or URL
        #[arg(value_name = "VIDEO_ID_OR_URL")]
        video: String,

        /// Preferred languages, in order (overrides config)
        #[arg(short, long, value_name = "LANG", value_delimiter = ',')]
        languages: Vec<String>,

        /// List available transcript languages instead
        #[arg(long)]
        list: bool,
    },

    /// Show the effective configuration
    Config {
        /// Show current configuration
        #[arg(short, long)]
        show: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_serve_overrides() {
        let cli = Cli::parse_from(["transcript-server", "serve", "--port", "9000", "--debug"]);
        match cli.command {
            Commands::Serve { host, port, debug } => {
                assert_eq!(host, None);
                assert_eq!(port, Some(9000));
                assert!(debug);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_parse_fetch_languages() {
        let cli = Cli::parse_from(["transcript-server", "fetch", "dQw4w9WgXcQ", "-l", "de,en"]);
        match cli.command {
            Commands::Fetch { video, languages, list } => {
                assert_eq!(video, "dQw4w9WgXcQ");
                assert_eq!(languages, vec!["de", "en"]);
                assert!(!list);
            }
            _ => panic!("expected fetch"),
        }
    }
}
