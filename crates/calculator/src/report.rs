use crate::breakdown::MergedDailyEntry;
use chrono::{DateTime, FixedOffset};
use core_types::{AdRecord, AdSnapshot};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The single aggregate output of a pipeline run.
///
/// This struct is the final output of the `MetricsCalculator` and the payload
/// handed to the dashboard. Money is in major units throughout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedMetricsRecord {
    /// When the record was calculated, in the business timezone.
    pub timestamp: DateTime<FixedOffset>,

    // I. Spend
    pub total_spend: Decimal,
    pub ad_platform_spend: Decimal,
    pub paid_ads_spend: Decimal, // ad platform + historical
    pub influencer_spend: Decimal, // recorded payments + secondary marketplace share

    // II. Revenue and guests
    pub total_revenue: Decimal, // net of processor fees
    pub total_guests: i64,
    pub net_revenue: Decimal,   // revenue minus total spend, may be negative

    // III. Ratios
    pub spend_to_revenue_ratio: Decimal,
    pub revenue_spent_on_ads: Decimal,
    pub cost_per_acquisition: Decimal,

    // IV. Pass-through figures
    pub average_ltv: Decimal,
    pub operational_expenses: Decimal,
    pub ad_metrics: AdMetricsSummary,

    // V. Daily detail
    pub daily_breakdown: Vec<MergedDailyEntry>,
}

/// Ad account totals as reported by the ads platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdMetricsSummary {
    pub total_ads_count: usize,
    pub active_ads_count: usize,
    pub total_impressions: u64,
    pub total_clicks: u64,
    pub ads: Vec<AdRecord>,
}

impl From<&AdSnapshot> for AdMetricsSummary {
    fn from(snapshot: &AdSnapshot) -> Self {
        Self {
            total_ads_count: snapshot.total_ads_count,
            active_ads_count: snapshot.active_ads_count,
            total_impressions: snapshot.total_impressions,
            total_clicks: snapshot.total_clicks,
            ads: snapshot.ads.clone(),
        }
    }
}
