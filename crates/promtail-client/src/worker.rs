// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Background delivery task owning the batch store.
//!
//! Producers hand [`Record`]s to the worker over a bounded channel, the only
//! point where they meet it. The worker waits on whichever comes first of a
//! new record, the batch deadline, or the shutdown token:
//!
//! ```text
//!   producers ──(bounded mpsc)──> DeliveryWorker ──> Encoder ──> Transport
//!                                     │
//!                                 BatchStore (no locks, worker-owned)
//! ```
//!
//! A flush happens when the window holds `batch_entries` entries or when the
//! deadline elapses with something buffered. The deadline is reset after
//! every flush decision, so a window always lasts `batch_wait` from the last
//! flush or reset. Failed flushes are logged and dropped; nothing is retried.

use crate::batch::{entry_count, Batch, BatchStore, LogEntry};
use crate::config::ClientConfig;
use crate::encoder::Encoder;
use crate::error::FlushError;
use crate::labels::LabelSet;
use crate::level::Level;
use crate::transport::Transport;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Status the push endpoint answers with when it accepts a batch.
pub const ACCEPTED_STATUS: u16 = 204;

/// A log call in flight from a producer to the worker.
#[derive(Debug)]
pub struct Record {
    /// Extra labels only; base labels are merged in at flush time.
    pub labels: LabelSet,
    pub level: Level,
    pub entry: LogEntry,
}

/// Delivery counters. Written by the worker only.
#[derive(Debug, Default)]
pub struct Counters {
    sent: AtomicUsize,
    buffered: AtomicUsize,
}

impl Counters {
    pub fn sent(&self) -> usize {
        self.sent.load(Ordering::Acquire)
    }

    pub fn buffered(&self) -> usize {
        self.buffered.load(Ordering::Acquire)
    }
}

pub struct DeliveryWorker {
    push_url: String,
    labels: LabelSet,
    batch_wait: Duration,
    batch_entries: usize,
    print_level: Option<Level>,
    encoder: Box<dyn Encoder>,
    transport: Arc<dyn Transport>,
    store: BatchStore,
    rx: mpsc::Receiver<Record>,
    shutdown: CancellationToken,
    counters: Arc<Counters>,
}

impl DeliveryWorker {
    /// Creates a worker and the sending half of its queue.
    ///
    /// The worker does nothing until [`DeliveryWorker::run`] is spawned.
    pub fn new(
        config: &ClientConfig,
        encoder: Box<dyn Encoder>,
        transport: Arc<dyn Transport>,
        shutdown: CancellationToken,
        counters: Arc<Counters>,
    ) -> (Self, mpsc::Sender<Record>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let worker = Self {
            push_url: config.push_url.clone(),
            labels: config.labels.clone(),
            batch_wait: config.batch_wait,
            batch_entries: config.batch_entries,
            print_level: config.print_level,
            encoder,
            transport,
            store: BatchStore::new(),
            rx,
            shutdown,
            counters,
        };
        (worker, tx)
    }

    /// Processes records until shutdown, then drains and flushes what is left.
    ///
    /// Shutdown is requested through the cancellation token, or implied when
    /// every sender has been dropped.
    pub async fn run(mut self) {
        debug!("PROMTAIL | Delivery worker started");

        let deadline = sleep(self.batch_wait);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => break,
                record = self.rx.recv() => {
                    let Some(record) = record else {
                        debug!("PROMTAIL | All producers gone, stopping delivery worker");
                        break;
                    };
                    self.accept(record);
                    if self.store.len() >= self.batch_entries {
                        self.flush().await;
                        deadline.as_mut().reset(Instant::now() + self.batch_wait);
                    }
                }
                () = &mut deadline => {
                    if !self.store.is_empty() {
                        self.flush().await;
                    }
                    deadline.as_mut().reset(Instant::now() + self.batch_wait);
                }
            }
        }

        debug!("PROMTAIL | Delivery worker shutting down");
        self.drain_queue().await;
        self.flush().await;
        debug!("PROMTAIL | Delivery worker stopped");
    }

    /// Closes the queue and moves whatever is still in it into the store.
    async fn drain_queue(&mut self) {
        self.rx.close();
        while let Ok(record) = self.rx.try_recv() {
            self.accept(record);
            if self.store.len() >= self.batch_entries {
                self.flush().await;
            }
        }
    }

    fn accept(&mut self, record: Record) {
        self.counters.buffered.fetch_add(1, Ordering::AcqRel);

        if let Some(threshold) = self.print_level {
            if record.level.is_at_least(threshold) {
                info!(severity = %record.level, labels = %record.labels, "{}", record.entry.line);
            }
        }

        self.store.append(&record.labels, record.entry);
    }

    /// Drains the store and ships it. A no-op when nothing is buffered.
    async fn flush(&mut self) {
        let batch = self.store.drain();
        let count = entry_count(&batch);
        if count == 0 {
            return;
        }

        debug!("PROMTAIL | Flushing {count} entries in {} streams", batch.len());
        let result = self.send(batch).await;

        self.counters.buffered.fetch_sub(count, Ordering::AcqRel);
        match result {
            Ok(()) => {
                self.counters.sent.fetch_add(count, Ordering::AcqRel);
                debug!("PROMTAIL | Successfully flushed {count} entries");
            }
            Err(e) => {
                error!("PROMTAIL | Dropped batch of {count} entries: {e}");
            }
        }
    }

    async fn send(&self, batch: Batch) -> Result<(), FlushError> {
        let payload = self.encoder.encode(&self.labels, batch)?;
        let response = self
            .transport
            .post(&self.push_url, payload.content_type, payload.body)
            .await?;

        if response.status != ACCEPTED_STATUS {
            return Err(FlushError::Status {
                status: response.status,
                body: response.body,
            });
        }
        Ok(())
    }
}
