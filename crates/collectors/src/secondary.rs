use crate::error::CollectorError;
use crate::responses::PartnerDashboard;
use crate::retry::RetryPolicy;
use crate::Collector;
use async_trait::async_trait;
use chrono::NaiveDate;
use configuration::{CredentialStore, SecondarySource};
use core_types::{SecondaryTicketSeries, SourceKind, SourceSnapshot};
use reqwest::header::{HeaderValue, COOKIE};
use std::sync::Arc;

const SESSION_COOKIE: &str = "BLT_partner_session";

/// Collects daily ticket counts from the secondary marketplace's partner dashboard.
///
/// The marketplace has no API keys; requests carry a browser session cookie that
/// expires and has to be rotated through the shared [`CredentialStore`].
pub struct SecondaryTicketsCollector {
    client: reqwest::Client,
    url: String,
    credentials: Arc<CredentialStore>,
    retry: RetryPolicy,
}

impl SecondaryTicketsCollector {
    pub fn new(
        source: &SecondarySource,
        credentials: Arc<CredentialStore>,
        retry: RetryPolicy,
    ) -> Result<Self, CollectorError> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            url: source.url.clone(),
            credentials,
            retry,
        })
    }

    async fn fetch_dashboard(&self) -> Result<PartnerDashboard, CollectorError> {
        let key = self.credentials.current().ok_or(CollectorError::SessionExpired)?;
        let cookie = HeaderValue::from_str(&format!("{SESSION_COOKIE}={}", key.expose()))?;

        let response = self
            .retry
            .send(SourceKind::SecondaryTickets, || {
                self.client.get(&self.url).header(COOKIE, cookie.clone())
            })
            .await;
        let response = match response {
            Ok(response) => response,
            Err(CollectorError::Api { status, .. }) if (400..500).contains(&status) => {
                tracing::warn!(status, "Secondary marketplace rejected the session key");
                return Err(CollectorError::SessionExpired);
            }
            Err(e) => return Err(e),
        };

        // An expired session is answered with the login page instead of JSON.
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::warn!(error = %e, "Secondary marketplace returned a non-JSON body");
            CollectorError::SessionExpired
        })
    }

    /// Reports whether the current session key is accepted, without building a snapshot.
    pub async fn check_session(&self) -> Result<bool, CollectorError> {
        match self.fetch_dashboard().await {
            Ok(_) => Ok(true),
            Err(CollectorError::SessionExpired) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Collector for SecondaryTicketsCollector {
    fn source(&self) -> SourceKind {
        SourceKind::SecondaryTickets
    }

    async fn collect(&self) -> Result<SourceSnapshot, CollectorError> {
        let dashboard = self.fetch_dashboard().await?;
        let series = tickets_by_day(&dashboard)?;
        series.validate()?;

        tracing::info!(
            days = series.iter().count(),
            total_tickets = series.total_tickets()?,
            "Collected secondary marketplace data"
        );
        Ok(SourceSnapshot::SecondaryTickets(series))
    }
}

/// Sums tickets sold per calendar day, using the date part of each interval start.
pub fn tickets_by_day(dashboard: &PartnerDashboard) -> Result<SecondaryTicketSeries, CollectorError> {
    let mut series = SecondaryTicketSeries::new();
    for summary in &dashboard.sales_by_experience.interval_summaries {
        let day = summary.interval_start.split('T').next().unwrap_or_default();
        let date = NaiveDate::parse_from_str(day, "%Y-%m-%d").map_err(|e| {
            CollectorError::invalid(
                SourceKind::SecondaryTickets,
                format!("intervalStart '{}': {e}", summary.interval_start),
            )
        })?;
        series.record(date, summary.tickets_sold);
    }
    Ok(series)
}
