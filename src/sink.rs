use std::sync::Arc;

use crate::client::TelemetryClient;
use crate::record::LogRecord;
use crate::translate::build_trace;

/// Errors surfaced by [`LogWriter::write`].
#[derive(thiserror::Error, Debug)]
pub enum SinkError {
    #[error("log record is not a valid JSON object: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("log record has no string `msg` field")]
    MissingMessage,
}

/// Byte-oriented destination for encoded log records.
///
/// This is the contract the logging layer writes against: one call to
/// `write` per encoded record, and `sync` to push out anything buffered.
/// Both take `&self` so a single writer can be shared across threads.
pub trait LogWriter: Send + Sync {
    /// Consume one encoded record.
    ///
    /// **Returns**
    /// - `Ok(n)` once the record has been handed off; `n` is
    ///   implementation defined (see [`AppInsightsSink::write`]).
    /// - `Err(..)` if the bytes could not be interpreted.
    fn write(&self, buf: &[u8]) -> Result<usize, SinkError>;

    /// Flush any buffered records. Default implementation is a no-op.
    fn sync(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl<W: LogWriter + ?Sized> LogWriter for Arc<W> {
    fn write(&self, buf: &[u8]) -> Result<usize, SinkError> {
        (**self).write(buf)
    }

    fn sync(&self) -> Result<(), SinkError> {
        (**self).sync()
    }
}

/// [`LogWriter`] that turns encoded records into traces and submits them
/// to a [`TelemetryClient`].
///
/// The sink keeps no mutable state of its own; concurrent writes are as
/// safe as the client's `track`.
#[derive(Clone)]
pub struct AppInsightsSink {
    client: Arc<dyn TelemetryClient>,
}

impl AppInsightsSink {
    pub fn new(client: Arc<dyn TelemetryClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<dyn TelemetryClient> {
        &self.client
    }

    /// Decode, translate and submit one record without waiting for
    /// delivery.
    ///
    /// **Returns**
    /// - `Ok(n)` where `n` is the byte length of the translated message,
    ///   not of `buf`.
    /// - `Err(SinkError::Decode)` if `buf` is not a JSON object.
    /// - `Err(SinkError::MissingMessage)` if the record has no string `msg`.
    pub fn write(&self, buf: &[u8]) -> Result<usize, SinkError> {
        let record = LogRecord::from_slice(buf)?;
        let trace = build_trace(&record)?;
        let written = trace.message.len();
        self.client.track(trace);
        Ok(written)
    }

    /// Ask the client's channel, if any, to transmit what it has buffered.
    ///
    /// Fire-and-forget: always returns `Ok(())`, delivery outcomes are not
    /// reported.
    pub fn flush(&self) -> Result<(), SinkError> {
        if let Some(channel) = self.client.channel() {
            channel.flush();
        }
        Ok(())
    }
}

impl LogWriter for AppInsightsSink {
    fn write(&self, buf: &[u8]) -> Result<usize, SinkError> {
        AppInsightsSink::write(self, buf)
    }

    fn sync(&self) -> Result<(), SinkError> {
        self.flush()
    }
}
