use crate::encoder::EncoderConfig;
use crate::filter::MinLevelFilter;
use crate::level::LogLevel;
use crate::sink::{LogWriter, SinkError};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// Targets never forwarded by default: this crate and the HTTP stack used
/// for delivery. Forwarding them would turn every upload into more
/// telemetry.
pub const DEFAULT_IGNORED_TARGETS: &[&str] = &[env!("CARGO_CRATE_NAME"), "hyper", "h2", "reqwest", "rustls"];

/// `tracing_subscriber` layer that encodes events as JSON records and
/// hands them to a [`LogWriter`].
///
/// Events below the configured [`MinLevelFilter`] never reach the writer.
/// The writer is called synchronously from `on_event`, so it must not
/// block; [`crate::sink::AppInsightsSink`] only enqueues.
pub struct AppInsightsLayer<W> {
    writer: W,
    encoder: EncoderConfig,
    filter: MinLevelFilter,
    static_fields: Map<String, Value>,
    ignored_targets: Vec<String>,
    /// Total events seen by the layer (before filtering by level).
    pub total_events: Arc<AtomicU64>,
    /// Accepted by the writer.
    pub written_events: Arc<AtomicU64>,
    /// Failed to encode or rejected by the writer.
    pub failed_events: Arc<AtomicU64>,
}

impl<W: LogWriter> AppInsightsLayer<W> {
    pub fn new(writer: W, encoder: EncoderConfig, filter: MinLevelFilter) -> Self {
        Self {
            writer,
            encoder,
            filter,
            static_fields: Map::new(),
            ignored_targets: DEFAULT_IGNORED_TARGETS.iter().map(|t| t.to_string()).collect(),
            total_events: Arc::new(AtomicU64::new(0)),
            written_events: Arc::new(AtomicU64::new(0)),
            failed_events: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Attach fields written into every record.
    pub fn with_fields<K, I>(mut self, fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        self.static_fields
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v)));
        self
    }

    /// Drop events whose target is `target` or lives under `target::`.
    pub fn with_ignored_target(mut self, target: impl Into<String>) -> Self {
        self.ignored_targets.push(target.into());
        self
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Flush the underlying writer.
    pub fn flush(&self) -> Result<(), SinkError> {
        self.writer.sync()
    }

    fn is_ignored(&self, target: &str) -> bool {
        self.ignored_targets.iter().any(|ignored| {
            target
                .strip_prefix(ignored.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
        })
    }
}

impl<S, W> Layer<S> for AppInsightsLayer<W>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
    W: LogWriter + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        self.total_events.fetch_add(1, Ordering::Relaxed);

        let meta = event.metadata();
        let level = LogLevel::from(meta.level());
        if !self.filter.enabled(level) || self.is_ignored(meta.target()) {
            return;
        }

        // Errors go to stderr: logging them through `tracing` would re-enter
        // this layer.
        let bytes = match self.encoder.encode(event, level, &self.static_fields) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.failed_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("failed to encode log record: {}", e);
                return;
            }
        };

        match self.writer.write(&bytes) {
            Ok(_) => {
                self.written_events.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                self.failed_events.fetch_add(1, Ordering::Relaxed);
                eprintln!("failed to write log record: {}", e);
            }
        }
    }
}
