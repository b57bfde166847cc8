use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use appinsights_log_sink::init::InitOptions;
use appinsights_log_sink::transmitter::{NoopTransmitter, Transmitter};
use appinsights_log_sink::{new_app_insights_layer, Config};
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Registry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config {
        max_batch_size: 1_000,
        max_batch_interval: Duration::from_millis(200),
        channel_buffer: 50_000,
        ..Config::new("00000000-0000-0000-0000-000000000000")
    };
    let options = InitOptions {
        enable_stdout: false,
        transmitter: Some(Arc::new(NoopTransmitter) as Arc<dyn Transmitter>),
        ..Default::default()
    };

    let (layer, handle) = new_app_insights_layer(&config, &options)?;
    let written = Arc::clone(&layer.written_events);
    Registry::default().with(layer).try_init()?;

    let n: u64 = 100_000;
    let start = Instant::now();

    for i in 0..n {
        error!(iteration = i, "load test error");
    }

    let elapsed = start.elapsed();
    println!(
        "wrote {} of {} events in {:?} (~{:.0} ev/s)",
        written.load(Ordering::Relaxed),
        n,
        elapsed,
        n as f64 / elapsed.as_secs_f64()
    );

    handle.close().await;
    Ok(())
}
