use serde::Deserialize;

// Wire formats of the upstream APIs. Only the fields the collectors read are modeled.

// --- Ads platform (Graph API) ---

/// A page of `GET act_{id}/ads` or `GET act_{id}/insights`.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphPage<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedRef {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAd {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub effective_status: Option<String>,
    pub campaign: Option<NamedRef>,
}

/// Lifetime insight row for one ad. The Graph API reports every number as a string.
#[derive(Debug, Clone, Deserialize)]
pub struct RawInsight {
    pub ad_id: String,
    pub ad_name: Option<String>,
    pub spend: Option<String>,
    pub impressions: Option<String>,
    pub clicks: Option<String>,
    pub ctr: Option<String>,
    pub cpc: Option<String>,
    pub reach: Option<String>,
    pub frequency: Option<String>,
}

// --- Event platform ---

#[derive(Debug, Clone, Deserialize)]
pub struct EntryList<T> {
    #[serde(default = "Vec::new")]
    pub entries: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarEntry {
    pub event: RawEvent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    pub api_id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuestEntry {
    pub guest: RawGuest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGuest {
    pub email: Option<String>,
    pub registered_at: Option<String>,
    #[serde(default)]
    pub event_tickets: Vec<RawTicket>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawTicket {
    /// Price paid in minor units.
    #[serde(default)]
    pub amount: i64,
}

// --- Secondary marketplace ---

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerDashboard {
    pub sales_by_experience: SalesByExperience,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesByExperience {
    #[serde(default)]
    pub interval_summaries: Vec<IntervalSummary>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalSummary {
    /// ISO timestamp; only the date part is used.
    pub interval_start: String,
    #[serde(default)]
    pub tickets_sold: i64,
}

// --- Expense platform ---

#[derive(Debug, Clone, Deserialize)]
pub struct TransactionPage {
    #[serde(default)]
    pub results: Vec<RawTransaction>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    pub id: Option<String>,
    pub occurred_time: Option<String>,
    pub transaction_type: Option<String>,
    /// Either a JSON number or a numeric string.
    pub amount: Option<serde_json::Value>,
    pub merchant_name: Option<String>,
    pub merchant_category_code: Option<String>,
}
