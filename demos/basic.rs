use appinsights_log_sink::{init_tracing, Config};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Reads APPINSIGHTS_INSTRUMENTATIONKEY and friends.
    let config = Config::from_env()?;
    let handle = init_tracing(config)?;

    info!("service started");
    warn!(disk = "/var", free_pct = 7.5, "disk almost full");
    error!(order_id = 123, reason = "card declined", "order failed");

    // Final flush before exit.
    handle.close().await;
    Ok(())
}
