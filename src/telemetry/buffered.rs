//! In-process buffer in front of an exporter.

use std::sync::Mutex;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tracing::debug;

use super::{Exporter, RequestRecord, TARGET, Telemetry, TelemetryError, measure};
use crate::identity::RunIdentity;
use crate::outcome::Outcome;

/// Buffers request records until [`Telemetry::flush`] hands them to the exporter.
///
/// Every request is kept; nothing is sampled out. A failed export puts the
/// batch back so a later flush can retry it.
#[derive(Debug)]
pub struct BufferedTelemetry<X> {
    exporter: X,
    pending: Mutex<Vec<RequestRecord>>,
}

impl<X: Exporter> BufferedTelemetry<X> {
    pub fn new(exporter: X) -> Self {
        Self {
            exporter,
            pending: Mutex::new(Vec::new()),
        }
    }

    /// Records waiting for the next flush.
    pub fn pending(&self) -> Vec<RequestRecord> {
        self.pending.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn exporter(&self) -> &X {
        &self.exporter
    }

    fn push(&self, record: RequestRecord) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(record);
        }
    }

    fn drain(&self) -> Vec<RequestRecord> {
        self.pending
            .lock()
            .map(|mut p| std::mem::take(&mut *p))
            .unwrap_or_default()
    }

    fn restore(&self, mut batch: Vec<RequestRecord>) {
        if let Ok(mut pending) = self.pending.lock() {
            batch.append(&mut pending);
            *pending = batch;
        }
    }
}

#[async_trait]
impl<X: Exporter> Telemetry for BufferedTelemetry<X> {
    async fn track_operation(&self, identity: &RunIdentity, work: BoxFuture<'_, Outcome>) -> Outcome {
        let (outcome, record) = measure(identity, work).await;
        debug!(
            target: TARGET,
            operation = %record.operation,
            duration_ms = record.duration_ms,
            result = %record.result,
            "request tracked"
        );
        self.push(record);
        outcome
    }

    async fn flush(&self) -> Result<(), TelemetryError> {
        let batch = self.drain();
        if batch.is_empty() {
            return Ok(());
        }

        let count = batch.len();
        match self.exporter.export(&batch).await {
            Ok(()) => {
                debug!(target: TARGET, count, "telemetry flushed");
                Ok(())
            }
            Err(e) => {
                self.restore(batch);
                Err(e)
            }
        }
    }
}
