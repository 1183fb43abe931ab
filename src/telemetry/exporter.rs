//! Exporters - where flushed request records end up.

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use super::{RequestRecord, TARGET, TelemetryError};

/// Header carrying the configured telemetry connection string.
pub const CONNECTION_HEADER: &str = "x-telemetry-connection";

#[async_trait]
pub trait Exporter: Send + Sync {
    async fn export(&self, batch: &[RequestRecord]) -> Result<(), TelemetryError>;
}

/// Writes each record as a structured log event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogExporter;

#[async_trait]
impl Exporter for LogExporter {
    async fn export(&self, batch: &[RequestRecord]) -> Result<(), TelemetryError> {
        for record in batch {
            info!(
                target: TARGET,
                service = %record.service,
                operation = %record.operation,
                started_at = %record.started_at.to_rfc3339(),
                duration_ms = record.duration_ms,
                success = record.success,
                result = %record.result,
                "request"
            );
        }
        Ok(())
    }
}

/// POSTs each batch as a JSON array to a collector endpoint.
#[derive(Debug, Clone)]
pub struct HttpExporter {
    client: reqwest::Client,
    endpoint: String,
    connection_string: Option<String>,
}

impl HttpExporter {
    /// Each export request gives up after `timeout`.
    pub fn new(
        endpoint: impl Into<String>,
        connection_string: Option<String>,
        timeout: Duration,
    ) -> Result<Self, TelemetryError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            connection_string,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Exporter for HttpExporter {
    async fn export(&self, batch: &[RequestRecord]) -> Result<(), TelemetryError> {
        let mut request = self.client.post(&self.endpoint).json(batch);
        if let Some(connection) = &self.connection_string {
            request = request.header(CONNECTION_HEADER, connection);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Export(format!(
                "collector at {} returned {}",
                self.endpoint, status
            )));
        }
        Ok(())
    }
}
