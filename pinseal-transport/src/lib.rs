//! Collaborators for the pinseal envelope core.
//!
//! - File source/sink with size caps and atomic replacement
//! - HTTPS fetcher for published tokens
//! - Publisher (seal) and consumer (open, fetch) pipelines
//! - Configuration shared by the `pinseal` binary

pub mod config;
pub mod error;
pub mod fetch;
pub mod files;
pub mod pipeline;

pub use config::PinsealConfig;
pub use error::{TransportError, TransportResult};
pub use fetch::TokenFetcher;
pub use pipeline::{SealSummary, fetch_and_open, open_json, open_token_file, seal_json, seal_json_file};
