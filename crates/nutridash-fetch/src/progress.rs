//! Progress reporting for long-running fetches.
//!
//! Fetchers emit short human-readable status lines as they work; updates
//! are ephemeral and superseded by the next one. The hosting surface picks
//! the sink: the CLI uses [`TracingProgress`], tests collect updates into
//! a buffer.

/// Receives ephemeral progress updates from a running fetch.
pub trait ProgressSink: Send + Sync {
    fn update(&self, message: &str);
}

/// Default sink: logs each update at `info` level.
#[derive(Debug, Default)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn update(&self, message: &str) {
        tracing::info!("{message}");
    }
}
