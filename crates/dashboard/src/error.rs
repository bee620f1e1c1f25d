use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("Dashboard API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Dashboard API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Dashboard is not configured: {0}")]
    NotConfigured(String),
}
