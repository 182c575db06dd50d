pub mod config;
pub mod pipeline_config;
pub mod context;
pub mod models;
pub mod pipeline;

use tracing_subscriber::EnvFilter;

pub use context::{PipelineContext, PipelineContextBuilder};

/// Install the global `tracing` subscriber.
///
/// Reads `RUST_LOG`, falling back to [`config::default_log_filter`]. Safe to
/// call more than once; later calls are ignored.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_tracing_is_idempotent() {
        super::init_tracing();
        super::init_tracing();
    }
}
