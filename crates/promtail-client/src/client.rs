// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::batch::LogEntry;
use crate::config::ClientConfig;
use crate::encoder;
use crate::error::ClientError;
use crate::labels::LabelSet;
use crate::level::Level;
use crate::transport::{ReqwestTransport, Transport};
use crate::worker::{Counters, DeliveryWorker, Record};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::error;

/// Handle used by application code to ship log lines.
///
/// Creating a client spawns one delivery task on the current tokio runtime.
/// Log calls only enqueue; all network I/O happens on that task. Call
/// [`Client::shutdown`] to flush what is buffered before exiting. Dropping
/// every handle without shutting down also flushes, but nobody waits for it.
pub struct Client {
    tx: mpsc::Sender<Record>,
    shutdown: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
    counters: Arc<Counters>,
}

impl Client {
    /// Validates `config` and starts the delivery task.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self, ClientError> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ClientError::Runtime(e.to_string()))?;

        let shutdown = CancellationToken::new();
        let counters = Arc::new(Counters::default());
        let (worker, tx) = DeliveryWorker::new(
            &config,
            encoder::for_format(config.format),
            transport,
            shutdown.clone(),
            Arc::clone(&counters),
        );
        let handle = runtime.spawn(worker.run());

        Ok(Self {
            tx,
            shutdown,
            worker: Mutex::new(Some(handle)),
            counters,
        })
    }

    /// Starts a client that pushes over HTTP, giving up on a request after
    /// `timeout`.
    pub fn with_reqwest(config: ClientConfig, timeout: Duration) -> Result<Self, ClientError> {
        Self::new(config, Arc::new(ReqwestTransport::new(timeout)))
    }

    /// Queues `line` stamped with the current time.
    ///
    /// `extra` labels are overlaid on the client's base labels when the
    /// batch is flushed. Waits only when the internal queue is full.
    pub async fn log(
        &self,
        line: impl Into<String>,
        level: Level,
        extra: &LabelSet,
    ) -> Result<(), ClientError> {
        self.enqueue(LogEntry::now(line), level, extra).await
    }

    /// Like [`Client::log`] with a caller-supplied timestamp.
    pub async fn log_at(
        &self,
        line: impl Into<String>,
        level: Level,
        timestamp: DateTime<Utc>,
        extra: &LabelSet,
    ) -> Result<(), ClientError> {
        self.enqueue(LogEntry::new(timestamp, line), level, extra)
            .await
    }

    pub async fn debug(&self, line: impl Into<String>) -> Result<(), ClientError> {
        self.log(line, Level::Debug, &LabelSet::new()).await
    }

    pub async fn info(&self, line: impl Into<String>) -> Result<(), ClientError> {
        self.log(line, Level::Info, &LabelSet::new()).await
    }

    pub async fn warn(&self, line: impl Into<String>) -> Result<(), ClientError> {
        self.log(line, Level::Warning, &LabelSet::new()).await
    }

    pub async fn error(&self, line: impl Into<String>) -> Result<(), ClientError> {
        self.log(line, Level::Error, &LabelSet::new()).await
    }

    async fn enqueue(
        &self,
        entry: LogEntry,
        level: Level,
        extra: &LabelSet,
    ) -> Result<(), ClientError> {
        if self.shutdown.is_cancelled() {
            return Err(ClientError::Closed);
        }
        self.tx
            .send(Record {
                labels: extra.clone(),
                level,
                entry,
            })
            .await
            .map_err(|_| ClientError::Closed)
    }

    /// Flushes everything buffered and waits for the delivery task to exit.
    ///
    /// Log calls made afterwards fail with [`ClientError::Closed`]. Calling
    /// this again is a no-op that returns once the first drain is done.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let mut worker = self.worker.lock().await;
        if let Some(handle) = worker.take() {
            if let Err(e) = handle.await {
                error!("PROMTAIL | Delivery worker failed: {e}");
            }
        }
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Entries delivered so far.
    #[must_use]
    pub fn sent(&self) -> usize {
        self.counters.sent()
    }

    /// Entries received by the delivery task and not yet flushed.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.counters.buffered()
    }
}
