use crate::channel::{ChannelError, ChannelHandle};
use crate::client::AppInsightsClient;
use crate::config::{Config, ConfigError, TelemetryConfiguration};
use crate::encoder::EncoderConfig;
use crate::filter::MinLevelFilter;
use crate::layer::AppInsightsLayer;
use crate::sink::AppInsightsSink;
use crate::transmitter::Transmitter;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Error type returned when constructing the sink or installing the
/// subscriber.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("no transmitter given and the `http` feature is disabled")]
    NoTransmitter,

    #[error("failed to install global subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Everything produced when building a sink from a [`Config`].
pub struct SinkParts {
    pub sink: AppInsightsSink,
    /// Record layout the sink expects its input in.
    pub encoder: EncoderConfig,
    /// Owner of the delivery worker; call [`ChannelHandle::close`] on
    /// shutdown for a final flush.
    pub handle: ChannelHandle,
}

/// Options for [`init_tracing_with_options`] and
/// [`new_app_insights_layer`].
///
/// **Fields**
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   stacked on top and events are also printed to the console.
/// - `fields`: attached to every forwarded record.
/// - `transmitter`: custom transport; `None` posts to the configured
///   endpoint over HTTP.
#[derive(Clone)]
pub struct InitOptions {
    pub enable_stdout: bool,
    pub fields: Map<String, Value>,
    pub transmitter: Option<Arc<dyn Transmitter>>,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            enable_stdout: true,
            fields: Map::new(),
            transmitter: None,
        }
    }
}

/// Validate `config`, build the telemetry client and wrap it in a sink.
///
/// Must be called from inside a Tokio runtime: the client's delivery worker
/// is spawned on it.
///
/// **Returns**
/// - [`SinkParts`] on success.
/// - `Err(InitError::Config(ConfigError::MissingInstrumentationKey))` if
///   the instrumentation key is empty. Nothing is spawned in that case.
pub fn build_sink(config: &Config, transmitter: Arc<dyn Transmitter>) -> Result<SinkParts, InitError> {
    let telemetry = config.telemetry_configuration()?;
    let (client, handle) = AppInsightsClient::from_config(&telemetry, transmitter)?;

    Ok(SinkParts {
        sink: AppInsightsSink::new(Arc::new(client)),
        encoder: EncoderConfig::default(),
        handle,
    })
}

/// HTTP transport for the configured endpoint.
pub fn default_transmitter(telemetry: &TelemetryConfiguration) -> Result<Arc<dyn Transmitter>, InitError> {
    #[cfg(feature = "http")]
    {
        Ok(Arc::new(crate::transmitter::HttpTransmitter::new(
            telemetry.endpoint_url.clone(),
        )))
    }

    #[cfg(not(feature = "http"))]
    {
        let _ = telemetry;
        Err(InitError::NoTransmitter)
    }
}

/// Build an [`AppInsightsLayer`] for `config` without installing it.
///
/// Use this to compose the layer with other layers of your own.
pub fn new_app_insights_layer(
    config: &Config,
    options: &InitOptions,
) -> Result<(AppInsightsLayer<AppInsightsSink>, ChannelHandle), InitError> {
    let telemetry = config.telemetry_configuration()?;
    let transmitter = match &options.transmitter {
        Some(transmitter) => Arc::clone(transmitter),
        None => default_transmitter(&telemetry)?,
    };

    let parts = build_sink(config, transmitter)?;
    let layer = AppInsightsLayer::new(
        parts.sink,
        parts.encoder,
        MinLevelFilter::new(config.min_log_level),
    )
    .with_fields(options.fields.clone());

    Ok((layer, parts.handle))
}

/// Install a global `tracing` subscriber forwarding events according to
/// `config` and `options`.
///
/// **Effects**
///
/// This installs a [`Registry`] combined with [`AppInsightsLayer`] (and,
/// optionally, a `fmt` layer) as the global default subscriber, so all
/// `tracing` events in the process are observed by the layer.
pub fn init_tracing_with_options(config: Config, options: InitOptions) -> Result<ChannelHandle, InitError> {
    let (layer, handle) = new_app_insights_layer(&config, &options)?;

    let fmt_layer = options.enable_stdout.then(|| tracing_subscriber::fmt::layer());
    let subscriber = Registry::default().with(layer).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(handle)
}

/// Initialize tracing with [`InitOptions::default`]: HTTP delivery and
/// console output.
pub fn init_tracing(config: Config) -> Result<ChannelHandle, InitError> {
    init_tracing_with_options(config, InitOptions::default())
}
