//! Telemetry client - request tracking and flushing.
//!
//! The runner only ever calls two things on a [`Telemetry`] client: it wraps
//! the whole engine run with [`Telemetry::track_operation`] and it calls
//! [`Telemetry::flush`] once the outcome is known. Everything behind that
//! (buffering, exporting) belongs to the implementation.

mod buffered;
mod exporter;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use serde::Serialize;
use thiserror::Error;
use tracing::Instrument;

use crate::config::{ExportProtocol, TelemetrySettings};
use crate::identity::RunIdentity;
use crate::outcome::Outcome;

pub use buffered::BufferedTelemetry;
pub use exporter::{CONNECTION_HEADER, Exporter, HttpExporter, LogExporter};

pub(crate) const TARGET: &str = "robot::telemetry";

/// Errors raised while exporting or flushing telemetry.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// Exporter rejected or could not deliver a batch
    #[error("export failed: {0}")]
    Export(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Flush did not finish within the configured wait
    #[error("flush timed out after {0:?}")]
    Timeout(Duration),
}

/// One tracked unit of work.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestRecord {
    pub service: String,
    pub operation: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
    pub result: String,
}

impl RequestRecord {
    fn new(identity: &RunIdentity, started_at: DateTime<Utc>, elapsed: Duration, outcome: &Outcome) -> Self {
        Self {
            service: identity.job_name().to_string(),
            operation: identity.operation_name().to_string(),
            started_at,
            duration_ms: elapsed.as_millis() as u64,
            success: outcome.is_success(),
            result: outcome.label().to_string(),
        }
    }
}

/// Telemetry client consumed by the lifecycle runner.
#[async_trait]
pub trait Telemetry: Send + Sync {
    /// Runs `work` as one tracked request correlated under the operation name.
    async fn track_operation(&self, identity: &RunIdentity, work: BoxFuture<'_, Outcome>) -> Outcome;

    /// Pushes buffered telemetry out. Dropping the returned future abandons the flush.
    async fn flush(&self) -> Result<(), TelemetryError>;
}

/// Runs `work` inside a request span and measures it.
pub async fn measure(identity: &RunIdentity, work: BoxFuture<'_, Outcome>) -> (Outcome, RequestRecord) {
    let span = tracing::info_span!(
        target: TARGET,
        "request",
        job = identity.job_name(),
        operation = identity.operation_name()
    );
    let started_at = Utc::now();
    let start = Instant::now();
    let outcome = work.instrument(span).await;
    let record = RequestRecord::new(identity, started_at, start.elapsed(), &outcome);
    (outcome, record)
}

/// Telemetry that tracks nothing and flushes instantly.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

#[async_trait]
impl Telemetry for NoopTelemetry {
    async fn track_operation(&self, _identity: &RunIdentity, work: BoxFuture<'_, Outcome>) -> Outcome {
        work.await
    }

    async fn flush(&self) -> Result<(), TelemetryError> {
        Ok(())
    }
}

/// Picks the telemetry client for the configured exporter.
///
/// HTTP export needs an endpoint; without one records go to the log. Export
/// requests time out after the configured flush wait.
pub fn from_settings(settings: &TelemetrySettings) -> Arc<dyn Telemetry> {
    match (settings.exporter.protocol, settings.exporter.endpoint.as_deref()) {
        (ExportProtocol::Http, Some(endpoint)) if !endpoint.trim().is_empty() => {
            match HttpExporter::new(endpoint, settings.connection_string.clone(), settings.flush_wait()) {
                Ok(exporter) => {
                    tracing::debug!(target: TARGET, endpoint = exporter.endpoint(), "exporting telemetry over HTTP");
                    Arc::new(BufferedTelemetry::new(exporter))
                }
                Err(e) => {
                    tracing::warn!(target: TARGET, error = %e, "HTTP telemetry client unavailable, logging instead");
                    Arc::new(BufferedTelemetry::new(LogExporter))
                }
            }
        }
        (ExportProtocol::Http, _) => {
            tracing::warn!(target: TARGET, "HTTP telemetry export configured without an endpoint, logging instead");
            Arc::new(BufferedTelemetry::new(LogExporter))
        }
        (ExportProtocol::Log, _) => Arc::new(BufferedTelemetry::new(LogExporter)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExporterSettings;
    use futures::FutureExt;

    #[tokio::test]
    async fn test_measure_records_outcome() {
        let id = RunIdentity::with_operation("billing-sync", "nightly-run");
        let (outcome, record) = measure(&id, async { Outcome::Cancelled }.boxed()).await;

        assert!(matches!(outcome, Outcome::Cancelled));
        assert_eq!(record.service, "billing-sync");
        assert_eq!(record.operation, "nightly-run");
        assert!(record.success);
        assert_eq!(record.result, "cancelled");
    }

    #[tokio::test]
    async fn test_measure_times_the_work() {
        let id = RunIdentity::new("job");
        let work = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            Outcome::Failed(eyre::eyre!("late"))
        };
        let (_, record) = measure(&id, work.boxed()).await;

        assert!(record.duration_ms >= 20);
        assert!(!record.success);
    }

    #[tokio::test]
    async fn test_noop_telemetry_passes_outcome_through() {
        let telemetry = NoopTelemetry;
        let outcome = telemetry
            .track_operation(&RunIdentity::new("job"), async { Outcome::Completed }.boxed())
            .await;

        assert!(matches!(outcome, Outcome::Completed));
        assert!(telemetry.flush().await.is_ok());
    }

    #[tokio::test]
    async fn test_from_settings_without_endpoint_still_tracks() {
        let settings = TelemetrySettings {
            exporter: ExporterSettings {
                protocol: ExportProtocol::Http,
                endpoint: None,
            },
            ..TelemetrySettings::default()
        };
        let telemetry = from_settings(&settings);
        let outcome = telemetry
            .track_operation(&RunIdentity::new("job"), async { Outcome::Completed }.boxed())
            .await;

        assert!(matches!(outcome, Outcome::Completed));
        assert!(telemetry.flush().await.is_ok());
    }
}
