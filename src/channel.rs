use crate::client::TelemetryChannel;
use crate::config::TelemetryConfiguration;
use crate::telemetry::Envelope;
use crate::transmitter::Transmitter;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

enum Command {
    Track(Envelope),
    Close(oneshot::Sender<()>),
}

/// Counters maintained by an [`InMemoryChannel`].
#[derive(Debug, Default)]
pub struct ChannelStats {
    /// Accepted into the queue.
    pub enqueued: AtomicU64,
    /// Rejected because the queue was full or the worker had stopped.
    pub dropped: AtomicU64,
    /// Delivered in a batch the transmitter accepted.
    pub transmitted: AtomicU64,
    /// Batches discarded after a transmit error.
    pub failed_batches: AtomicU64,
}

/// Bounded submission queue drained by a background batching task.
///
/// `send` and `flush` never wait: when the queue is full the envelope is
/// dropped and counted. The worker transmits when the batch reaches
/// `max_batch_size`, when `max_batch_interval` elapses with a non-empty
/// batch, or when asked to flush. Flush requests bypass the queue, so a
/// full queue cannot swallow them.
#[derive(Clone)]
pub struct InMemoryChannel {
    sender: mpsc::Sender<Command>,
    flush: Arc<Notify>,
    stats: Arc<ChannelStats>,
}

/// Owner side of the channel worker, used for the final flush.
pub struct ChannelHandle {
    sender: mpsc::Sender<Command>,
    join: JoinHandle<()>,
}

#[derive(thiserror::Error, Debug)]
pub enum ChannelError {
    #[error("no Tokio runtime available to run the telemetry channel")]
    NoRuntime,
}

impl InMemoryChannel {
    /// Spawn the batching worker on the current Tokio runtime.
    ///
    /// Minimal thresholds are enforced for the buffer, batch size and
    /// interval to avoid degenerate configurations.
    pub fn spawn(
        config: &TelemetryConfiguration,
        transmitter: Arc<dyn Transmitter>,
    ) -> Result<(Self, ChannelHandle), ChannelError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| ChannelError::NoRuntime)?;

        let buffer = config.channel_buffer.max(16);
        let batch_size = config.max_batch_size.max(1);
        let flush_interval = config.max_batch_interval.max(Duration::from_millis(10));

        let (tx, rx) = mpsc::channel::<Command>(buffer);
        let stats = Arc::new(ChannelStats::default());
        let flush = Arc::new(Notify::new());

        let join = runtime.spawn(run_worker(
            rx,
            Arc::clone(&flush),
            transmitter,
            batch_size,
            flush_interval,
            Arc::clone(&stats),
        ));

        Ok((
            InMemoryChannel {
                sender: tx.clone(),
                flush,
                stats,
            },
            ChannelHandle { sender: tx, join },
        ))
    }

    pub fn stats(&self) -> &ChannelStats {
        &self.stats
    }
}

impl TelemetryChannel for InMemoryChannel {
    fn send(&self, envelope: Envelope) {
        match self.sender.try_send(Command::Track(envelope)) {
            Ok(()) => {
                self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn flush(&self) {
        // Stores a permit when the worker is busy; repeated requests coalesce.
        self.flush.notify_one();
    }
}

impl ChannelHandle {
    /// Transmit everything queued so far and stop the worker.
    pub async fn close(self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.sender.send(Command::Close(ack_tx)).await.is_ok() {
            let _ = ack_rx.await;
        }
        let _ = self.join.await;
    }
}

async fn run_worker(
    mut rx: mpsc::Receiver<Command>,
    flush: Arc<Notify>,
    transmitter: Arc<dyn Transmitter>,
    batch_size: usize,
    flush_interval: Duration,
    stats: Arc<ChannelStats>,
) {
    let mut batch = Vec::with_capacity(batch_size.min(1024));
    let mut ticker = interval(flush_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    'worker: loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Track(envelope)) => {
                    batch.push(envelope);
                    if batch.len() >= batch_size {
                        transmit(&*transmitter, &mut batch, &stats).await;
                        ticker.reset();
                    }
                }
                Some(Command::Close(ack)) => {
                    transmit(&*transmitter, &mut batch, &stats).await;
                    let _ = ack.send(());
                    break;
                }
                None => {
                    transmit(&*transmitter, &mut batch, &stats).await;
                    break;
                }
            },
            _ = flush.notified() => {
                // Everything queued before the request belongs to this flush.
                while let Ok(command) = rx.try_recv() {
                    match command {
                        Command::Track(envelope) => {
                            batch.push(envelope);
                            if batch.len() >= batch_size {
                                transmit(&*transmitter, &mut batch, &stats).await;
                            }
                        }
                        Command::Close(ack) => {
                            transmit(&*transmitter, &mut batch, &stats).await;
                            let _ = ack.send(());
                            break 'worker;
                        }
                    }
                }
                transmit(&*transmitter, &mut batch, &stats).await;
                ticker.reset();
            }
            _ = ticker.tick() => {
                transmit(&*transmitter, &mut batch, &stats).await;
            }
        }
    }

    tracing::debug!(
        transmitted = stats.transmitted.load(Ordering::Relaxed),
        dropped = stats.dropped.load(Ordering::Relaxed),
        "telemetry channel stopped"
    );
}

async fn transmit(transmitter: &dyn Transmitter, batch: &mut Vec<Envelope>, stats: &ChannelStats) {
    if batch.is_empty() {
        return;
    }

    match transmitter.transmit(batch.as_slice()).await {
        Ok(()) => {
            stats
                .transmitted
                .fetch_add(batch.len() as u64, Ordering::Relaxed);
        }
        Err(e) => {
            stats.failed_batches.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(error = %e, items = batch.len(), "telemetry batch upload failed, dropping batch");
        }
    }
    batch.clear();
}
