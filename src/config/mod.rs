//! Configuration module for PDF-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every key has a default, so a crawl can run with no file at all and
//! the command line only overrides what it names.
//!
//! # Example
//!
//! ```no_run
//! use pdf_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Harvester will follow links {} hops deep", config.crawl.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CloudConfig, Config, CrawlConfig, HttpConfig, OutputConfig, PaperFormat, RenderConfig,
    WaitUntil, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
