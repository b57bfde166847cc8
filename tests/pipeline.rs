use std::error::Error;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use appinsights_log_sink::client::TelemetryClient;
use appinsights_log_sink::config::ConfigError;
use appinsights_log_sink::init::{build_sink, InitOptions};
use appinsights_log_sink::telemetry::Envelope;
use appinsights_log_sink::transmitter::Transmitter;
use appinsights_log_sink::{new_app_insights_layer, Config, InitError, SeverityLevel};
use async_trait::async_trait;
use serde_json::Value;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

#[derive(Default)]
struct RecordingTransmitter {
    envelopes: Mutex<Vec<Envelope>>,
}

#[async_trait]
impl Transmitter for RecordingTransmitter {
    async fn transmit(&self, batch: &[Envelope]) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.envelopes.lock().unwrap().extend_from_slice(batch);
        Ok(())
    }
}

fn config() -> Config {
    Config {
        max_batch_interval: Duration::from_secs(3600),
        ..Config::new("00000000-0000-0000-0000-000000000000")
    }
}

#[tokio::test]
async fn write_then_close_delivers_one_envelope() {
    let transmitter = Arc::new(RecordingTransmitter::default());
    let parts = build_sink(&config(), transmitter.clone()).unwrap();

    let n = parts
        .sink
        .write(br#"{"source": "test", "msg": "hello world", "level": "Information", "count": 3}"#)
        .unwrap();
    assert_eq!(n, 11);
    parts.sink.flush().unwrap();
    parts.handle.close().await;

    let envelopes = transmitter.envelopes.lock().unwrap();
    assert_eq!(envelopes.len(), 1);
    let data = &envelopes[0].data.base_data;
    assert_eq!(data.message, "hello world");
    assert_eq!(data.severity_level, SeverityLevel::Information);
    assert_eq!(data.properties.len(), 2);
    assert_eq!(data.properties["source"], "test");
    assert_eq!(data.properties["count"], "3");
    assert_eq!(envelopes[0].i_key, "00000000-0000-0000-0000-000000000000");
}

#[tokio::test]
async fn missing_instrumentation_key_fails_construction() {
    let result = build_sink(&Config::default(), Arc::new(RecordingTransmitter::default()));
    assert!(matches!(
        result,
        Err(InitError::Config(ConfigError::MissingInstrumentationKey))
    ));
}

#[tokio::test]
async fn tracing_events_arrive_as_traces() {
    let transmitter = Arc::new(RecordingTransmitter::default());
    let options = InitOptions {
        enable_stdout: false,
        fields: [("service".to_string(), Value::from("orders"))].into_iter().collect(),
        transmitter: Some(transmitter.clone() as Arc<dyn Transmitter>),
    };
    let config = Config {
        min_log_level: appinsights_log_sink::LogLevel::Info,
        ..config()
    };

    let (layer, handle) = new_app_insights_layer(&config, &options).unwrap();
    let sink = layer.writer().clone();
    let subscriber = Registry::default().with(layer);

    tracing::subscriber::with_default(subscriber, || {
        tracing::debug!("filtered out");
        tracing::info!(order_id = 7, "order placed");
        tracing::error!(latency = 3.14159265, "order failed");
    });

    sink.flush().unwrap();
    handle.close().await;

    let envelopes = transmitter.envelopes.lock().unwrap();
    assert_eq!(envelopes.len(), 2);

    let placed = &envelopes[0].data.base_data;
    assert_eq!(placed.message, "order placed");
    assert_eq!(placed.severity_level, SeverityLevel::Information);
    assert_eq!(placed.properties["order_id"], "7");
    assert_eq!(placed.properties["service"], "orders");
    assert_eq!(placed.properties["logger"], "pipeline");
    assert!(!placed.properties.contains_key("msg"));
    assert!(!placed.properties.contains_key("level"));

    let failed = &envelopes[1].data.base_data;
    assert_eq!(failed.severity_level, SeverityLevel::Error);
    assert_eq!(failed.properties["latency"], "3.141593");
}

#[tokio::test]
async fn client_exposes_its_channel() {
    let parts = build_sink(&config(), Arc::new(RecordingTransmitter::default())).unwrap();
    assert!(parts.sink.client().channel().is_some());
    parts.handle.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_writers_lose_nothing() {
    const THREADS: usize = 8;
    const WRITES: usize = 200;

    let transmitter = Arc::new(RecordingTransmitter::default());
    let config = Config {
        channel_buffer: 4096,
        ..config()
    };
    let parts = build_sink(&config, transmitter.clone()).unwrap();

    let writers: Vec<_> = (0..THREADS)
        .map(|t| {
            let sink = parts.sink.clone();
            std::thread::spawn(move || {
                for i in 0..WRITES {
                    let record = format!(r#"{{"msg": "t{t}-{i}", "level": "Warning"}}"#);
                    sink.write(record.as_bytes()).unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }
    parts.handle.close().await;

    let mut delivered: Vec<String> = transmitter
        .envelopes
        .lock()
        .unwrap()
        .iter()
        .map(|e| e.data.base_data.message.clone())
        .collect();
    delivered.sort();

    let mut written: Vec<String> = (0..THREADS)
        .flat_map(|t| (0..WRITES).map(move |i| format!("t{t}-{i}")))
        .collect();
    written.sort();

    assert_eq!(delivered.len(), THREADS * WRITES);
    assert_eq!(delivered, written);
}
