use anyhow::Context;
use eventdrip::runtime_config::RuntimeConfig;
use eventdrip::{EventStreamService, HttpServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = RuntimeConfig::from_env();
    may::config().set_stack_size(config.stack_size);

    let addr = format!("0.0.0.0:{}", config.port);
    let handle = HttpServer(EventStreamService::new(&config))
        .start(&addr)
        .with_context(|| format!("failed to start event stream server on {addr}"))?;
    info!(
        addr = %addr,
        default_count = config.default_count,
        tick_ms = config.tick.as_millis() as u64,
        "event stream server listening"
    );

    handle
        .join()
        .map_err(|e| anyhow::anyhow!("server failed: {e:?}"))?;
    Ok(())
}
