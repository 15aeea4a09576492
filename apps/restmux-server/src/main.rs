//! Restmux server binary
//!
//! Environment-driven bootstrap: backends come from `RESTMUX_BACKEND_*`
//! variables, everything else from `RESTMUX_*` with sensible defaults.

use restmux_gateway::{DependenciesBuilder, GatewayConfig, GatewayServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("restmux=info,tower_http=warn")),
        )
        .init();

    let config = GatewayConfig::from_env();
    let dependencies = DependenciesBuilder::new().build(&config);

    GatewayServer::new(config, dependencies).run().await
}
