#![doc = include_str!("../README.md")]

mod server;

use clap::Parser;
use server::config::{CliArgs, HostConfig};
use server::host::ServiceHost;
use server::telemetry::init_telemetry;

// Using mimalloc for better performance under contention, especially in musl
// environments.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = HostConfig::try_from(args)?;

    let providers = init_telemetry()?;

    log_startup_info(&config);

    // Only the host decides how the process ends: a listener failure comes
    // back as an error here and becomes exit status 1 once telemetry is
    // flushed.
    let outcome = ServiceHost::new(config).run().await;
    providers.shutdown();
    outcome?;

    #[cfg(feature = "tracing")]
    tracing::info!("Service host stopped");
    Ok(())
}

fn log_startup_info(_config: &HostConfig) {
    if cfg!(debug_assertions) {
        #[cfg(feature = "tracing")]
        tracing::info!("Starting frame service host with config: {:#?}", _config);
    } else {
        #[cfg(feature = "tracing")]
        tracing::info!(
            "Starting frame service host (rpc: {}, health: {})",
            _config.rpc.addr,
            _config.health.addr
        );
    }
}
