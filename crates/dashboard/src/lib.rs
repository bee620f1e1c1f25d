use crate::error::DashboardError;
use calculator::CombinedMetricsRecord;
use configuration::{DashboardSettings, Secret};
use reqwest::Client;

pub mod error;
pub mod payload;

pub use payload::{DailyMetric, DashboardPayload, MetricCard, MetricCards};

const UPDATE_PATH: &str = "/api/metrics/update";

/// A client for publishing metrics records to the dashboard API.
pub struct DashboardClient {
    client: Client,
    update_url: String,
    api_key: Secret,
}

impl DashboardClient {
    /// Creates a new `DashboardClient`.
    ///
    /// Fails when no API URL is configured, so a misconfigured run stops before
    /// any upstream data is collected.
    pub fn new(settings: &DashboardSettings, api_key: Secret) -> Result<Self, DashboardError> {
        let base = settings.api_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(DashboardError::NotConfigured("dashboard.api_url is empty".to_string()));
        }
        Ok(Self {
            client: Client::new(),
            update_url: format!("{base}{UPDATE_PATH}"),
            api_key,
        })
    }

    /// Replaces the dashboard's current metrics with `record`.
    pub async fn push(&self, record: &CombinedMetricsRecord) -> Result<(), DashboardError> {
        let payload = DashboardPayload::from(record);
        tracing::info!(
            total_spend = %record.total_spend,
            total_revenue = %record.total_revenue,
            days = payload.daily_metrics.len(),
            "Pushing metrics to the dashboard"
        );

        let response = self
            .client
            .post(&self.update_url)
            .bearer_auth(self.api_key.expose())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to decode error response".to_string());
            return Err(DashboardError::Api {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!("Successfully pushed metrics to the dashboard");
        Ok(())
    }
}
