use std::sync::Arc;

use clap::Parser;
use patient_relay::{Relay, RelayConfig, connect_lazy, init_tracing, listen_addr, serve};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the environment may already be set.
    let _ = dotenvy::dotenv();
    init_tracing()?;

    let config = RelayConfig::parse();
    let db = connect_lazy(config.target()?, config.max_connections);
    let relay = Arc::new(Relay::new(db));

    relay.bootstrap().await;

    info!("starting patient relay");
    serve(relay, listen_addr()).await?;
    Ok(())
}
