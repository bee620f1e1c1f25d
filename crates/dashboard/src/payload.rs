use calculator::CombinedMetricsRecord;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// One headline card on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    pub label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<&'static str>,
}

impl MetricCard {
    fn money(value: Decimal, label: &'static str) -> Self {
        Self {
            value,
            label,
            prefix: Some("$"),
            suffix: None,
        }
    }

    fn plain(value: Decimal, label: &'static str) -> Self {
        Self {
            value,
            label,
            prefix: None,
            suffix: None,
        }
    }

    fn percent(value: Decimal, label: &'static str) -> Self {
        Self {
            value,
            label,
            prefix: None,
            suffix: Some("%"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricCards {
    pub total_marketing_spend: MetricCard,
    pub influencer_spend: MetricCard,
    pub paid_ads_spend: MetricCard,
    pub net_revenue: MetricCard,
    pub revenue_spent_on_ads: MetricCard,
    pub customer_lifetime_value: MetricCard,
    pub customer_acquisition_cost: MetricCard,
    pub tickets: MetricCard,
    pub revenue: MetricCard,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetric {
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross_revenue: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub net_revenue: Decimal,
    pub daily_guests: i64,
    pub accumulated_guests: i64,
}

/// Body of `POST /api/metrics/update`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardPayload {
    pub metrics: MetricCards,
    pub daily_metrics: Vec<DailyMetric>,
}

impl From<&CombinedMetricsRecord> for DashboardPayload {
    fn from(record: &CombinedMetricsRecord) -> Self {
        Self {
            metrics: MetricCards {
                total_marketing_spend: MetricCard::money(record.total_spend, "Total Marketing Spend"),
                influencer_spend: MetricCard::money(record.influencer_spend, "Influencer Spend"),
                paid_ads_spend: MetricCard::money(record.paid_ads_spend, "Paid Ads Spend"),
                net_revenue: MetricCard::money(record.net_revenue, "Net Revenue"),
                revenue_spent_on_ads: MetricCard::percent(
                    record.revenue_spent_on_ads,
                    "Revenue Spent on Ads",
                ),
                customer_lifetime_value: MetricCard::money(record.average_ltv, "Customer Lifetime Value"),
                customer_acquisition_cost: MetricCard::money(
                    record.cost_per_acquisition,
                    "Customer Acquisition Cost",
                ),
                tickets: MetricCard::plain(Decimal::from(record.total_guests), "Tickets"),
                revenue: MetricCard::money(record.total_revenue, "Revenue"),
            },
            daily_metrics: record
                .daily_breakdown
                .iter()
                .map(|day| DailyMetric {
                    date: day.date,
                    gross_revenue: day.gross_revenue,
                    net_revenue: day.net_revenue,
                    daily_guests: day.daily_guests,
                    accumulated_guests: day.accumulated_guests,
                })
                .collect(),
        }
    }
}
