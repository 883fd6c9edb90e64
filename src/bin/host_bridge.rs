//! Headless host bridge binary for stdin/stdout JSON communication.
//!
//! Reads `CommandEnvelope` messages as newline-delimited JSON from stdin
//! and writes one `ResponseEnvelope` per command to stdout.
//!
//! All tracing/diagnostic output goes to stderr so that stdout remains a
//! clean JSON protocol channel.

use devctx::host::stdio::run_stdio_bridge;
use devctx::{AppConfig, build_http_handler, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().map_err(|e| anyhow::anyhow!("failed to load config: {e}"))?;
    logging::init(&config.logging)?;

    tracing::info!(
        sources = ?config.search.sources,
        max_results = config.search.max_results,
        "devctx-host starting"
    );

    let handler = build_http_handler(&config)?;

    run_stdio_bridge(&handler).await.map_err(|e| {
        tracing::error!(error = %e, "devctx-host exited with error");
        anyhow::anyhow!("devctx-host failed: {e}")
    })?;

    tracing::info!("devctx-host shut down cleanly");
    Ok(())
}
