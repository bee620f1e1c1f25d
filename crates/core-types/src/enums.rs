use serde::{Deserialize, Serialize};
use std::fmt;

/// The four upstream systems that feed a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// The paid advertising platform.
    Ads,
    /// The primary event-ticketing platform.
    Events,
    /// The secondary ticket marketplace (ticket counts only).
    SecondaryTickets,
    /// The corporate-card expense platform.
    Expenses,
}

impl SourceKind {
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Ads,
        SourceKind::Events,
        SourceKind::SecondaryTickets,
        SourceKind::Expenses,
    ];
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Ads => "ads",
            SourceKind::Events => "events",
            SourceKind::SecondaryTickets => "secondary_tickets",
            SourceKind::Expenses => "expenses",
        };
        f.write_str(name)
    }
}

/// Delivery status of a single ad, as reported by the ads platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AdStatus {
    Active,
    Paused,
    Other(String),
}

impl AdStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, AdStatus::Active)
    }
}

impl From<String> for AdStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "ACTIVE" => AdStatus::Active,
            "PAUSED" => AdStatus::Paused,
            _ => AdStatus::Other(value),
        }
    }
}

impl From<AdStatus> for String {
    fn from(value: AdStatus) -> Self {
        match value {
            AdStatus::Active => "ACTIVE".to_string(),
            AdStatus::Paused => "PAUSED".to_string(),
            AdStatus::Other(s) => s,
        }
    }
}
