//! # devctx
//!
//! Host process for the developer-context gatherer. Loads configuration,
//! builds a long-lived [`devctx_search::Gatherer`] and exposes it as the
//! `gather_developer_context` tool over a newline-delimited JSON channel
//! on stdin/stdout.

pub mod config;
pub mod error;
pub mod host;
pub mod logging;

use std::sync::Arc;

use devctx_search::{Gatherer, SourceAdapter};

pub use config::{AppConfig, LoggingConfig};
pub use error::{HostError, Result};

/// Build a handler with the gather tool registered over `adapters`.
///
/// # Errors
///
/// Returns an error if the search configuration is invalid.
pub fn build_handler(
    config: &AppConfig,
    adapters: Vec<Arc<dyn SourceAdapter>>,
) -> Result<host::HostHandler> {
    let gatherer = Gatherer::new(config.search.clone(), adapters)?;
    Ok(handler_for(gatherer))
}

/// Build a handler backed by the public HTTP source adapters.
///
/// # Errors
///
/// Returns an error if the search configuration is invalid or the HTTP
/// client cannot be built.
pub fn build_http_handler(config: &AppConfig) -> Result<host::HostHandler> {
    let gatherer = Gatherer::with_http_sources(config.search.clone())?;
    Ok(handler_for(gatherer))
}

fn handler_for(gatherer: Gatherer) -> host::HostHandler {
    let mut registry = host::ToolRegistry::new();
    registry.register(Arc::new(host::GatherContextTool::new(Arc::new(gatherer))));
    host::HostHandler::new(registry)
}
