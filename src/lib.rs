//! Transcript Server - an HTTP API for fetching YouTube transcripts
//!
//! This library validates video IDs, fetches captions through a pluggable
//! [`TranscriptFetcher`], classifies failures into a stable HTTP error
//! taxonomy and fans batch requests out with per-item success reporting.

pub mod classify;
pub mod cli;
pub mod config;
pub mod fetcher;
pub mod server;
pub mod service;
pub mod utils;
pub mod validation;

pub use classify::{ApiError, ErrorCode};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use fetcher::{FetchError, TranscriptFetcher, YoutubeFetcher};
pub use server::build_router;
pub use service::{BatchItemResult, TranscriptService};
pub use validation::{ValidationError, VideoId};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;
