use crate::telemetry::Envelope;
use async_trait::async_trait;
use std::error::Error;

/// Transport that delivers a batch of envelopes to the ingestion service.
///
/// Called only from the channel's background task, never on the
/// application thread.
#[async_trait]
pub trait Transmitter: Send + Sync {
    /// Send one batch.
    ///
    /// **Returns**
    /// - `Ok(())` if the service accepted the batch.
    /// - `Err(..)` on serialization, network or HTTP status errors. The
    ///   channel logs the error and drops the batch.
    async fn transmit(&self, batch: &[Envelope]) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// A transmitter that simply drops every batch.
///
/// Useful for measuring the overhead of the pipeline without any external
/// I/O.
#[derive(Clone, Debug, Default)]
pub struct NoopTransmitter;

#[async_trait]
impl Transmitter for NoopTransmitter {
    async fn transmit(&self, _batch: &[Envelope]) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

/// Serialize a batch as newline-delimited JSON.
pub fn encode_batch(batch: &[Envelope]) -> Result<Vec<u8>, serde_json::Error> {
    let mut body = Vec::new();
    for envelope in batch {
        serde_json::to_writer(&mut body, envelope)?;
        body.push(b'\n');
    }
    Ok(body)
}

#[cfg(feature = "http")]
pub use http::HttpTransmitter;

#[cfg(feature = "http")]
mod http {
    use super::{encode_batch, Transmitter};
    use crate::telemetry::Envelope;
    use async_trait::async_trait;
    use reqwest::Client;
    use std::error::Error;

    /// Posts batches to the track endpoint over HTTP.
    #[derive(Clone, Debug)]
    pub struct HttpTransmitter {
        client: Client,
        endpoint_url: String,
    }

    impl HttpTransmitter {
        pub fn new(endpoint_url: impl Into<String>) -> Self {
            HttpTransmitter {
                client: Client::new(),
                endpoint_url: endpoint_url.into(),
            }
        }
    }

    #[async_trait]
    impl Transmitter for HttpTransmitter {
        async fn transmit(&self, batch: &[Envelope]) -> Result<(), Box<dyn Error + Send + Sync>> {
            let body = encode_batch(batch)?;
            let resp = self
                .client
                .post(&self.endpoint_url)
                .header("Content-Type", "application/x-json-stream")
                .body(body)
                .send()
                .await?;

            if resp.status().is_success() {
                Ok(())
            } else {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_else(|_| "<no body>".to_string());
                Err(format!("telemetry upload failed with status {}: {}", status, text).into())
            }
        }
    }
}
