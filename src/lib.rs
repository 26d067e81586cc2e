//! PDF-Harvest: a recursive link-following document harvester
//!
//! This crate reads seed PDF files, extracts every outbound link embedded in
//! them, and turns each link into a local PDF: by downloading it directly,
//! by rewriting cloud-document viewer links into export links, or by
//! rendering the web page itself in a headless browser. Any PDF obtained is
//! scanned for links in turn, up to a bounded depth.

pub mod browser;
pub mod config;
pub mod crawler;
pub mod output;
pub mod pdf;
pub mod state;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for PDF-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("PDF error for {path}: {message}")]
    Pdf { path: PathBuf, message: String },

    #[error("Input path not found: {0}")]
    InputNotFound(PathBuf),

    #[error("No PDFs found to process under {0}")]
    NoPdfsFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid host pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for PDF-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{harvest, CrawlSession, Harvester};
pub use state::LinkState;
pub use url::{classify_url, normalize_url, UrlKind};
