use crate::channel::{ChannelHandle, InMemoryChannel};
use crate::config::TelemetryConfiguration;
use crate::telemetry::{Envelope, TraceTelemetry};
use crate::transmitter::Transmitter;
use std::sync::Arc;

/// Queue that accepts envelopes and delivers them to the service.
pub trait TelemetryChannel: Send + Sync {
    /// Enqueue one envelope. Must not block.
    fn send(&self, envelope: Envelope);

    /// Request transmission of everything buffered so far. Must not block
    /// and does not report the outcome.
    fn flush(&self);
}

/// Client used by the sink to submit traces.
///
/// Implementations must be safe to call concurrently and must not block
/// on network I/O inside `track`.
pub trait TelemetryClient: Send + Sync {
    fn track(&self, trace: TraceTelemetry);

    /// The delivery channel behind this client, if it has one.
    fn channel(&self) -> Option<&dyn TelemetryChannel> {
        None
    }
}

/// Default client: stamps traces with the instrumentation key and hands
/// them to an [`InMemoryChannel`].
#[derive(Clone)]
pub struct AppInsightsClient {
    instrumentation_key: String,
    channel: InMemoryChannel,
}

impl AppInsightsClient {
    /// Build a client and spawn its delivery worker on the current Tokio
    /// runtime.
    ///
    /// **Returns**
    /// - the client together with a [`ChannelHandle`] used for the final
    ///   flush on shutdown.
    /// - `Err(ChannelError::NoRuntime)` when called outside a runtime.
    pub fn from_config(
        config: &TelemetryConfiguration,
        transmitter: Arc<dyn Transmitter>,
    ) -> Result<(Self, ChannelHandle), crate::channel::ChannelError> {
        let (channel, handle) = InMemoryChannel::spawn(config, transmitter)?;
        Ok((
            AppInsightsClient {
                instrumentation_key: config.instrumentation_key.clone(),
                channel,
            },
            handle,
        ))
    }
}

impl TelemetryClient for AppInsightsClient {
    fn track(&self, trace: TraceTelemetry) {
        self.channel
            .send(Envelope::from_trace(trace, &self.instrumentation_key));
    }

    fn channel(&self) -> Option<&dyn TelemetryChannel> {
        Some(&self.channel)
    }
}
