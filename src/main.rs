#![forbid(unsafe_code)]
#![deny(warnings)]
#![warn(clippy::pedantic)]

use autoscale_load_demo::{serve, validate_config, AppConfig};
use clap::Parser;
use tracing::info;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt = tracing_subscriber::fmt().with_env_filter(filter);
    fmt.json().init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cfg = AppConfig::parse();
    validate_config(&cfg)?;
    info!(
        bind = %cfg.bind,
        memory_ceiling_mb = cfg.memory_ceiling_mb,
        chunk_mb = cfg.chunk_mb,
        "starting load demo"
    );
    serve(cfg).await?;
    info!("shutdown complete");
    Ok(())
}
