use crate::enums::{AdStatus, SourceKind};
use crate::error::CoreError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// ==============================================================================
// Ads platform
// ==============================================================================

/// Lifetime delivery metrics for a single ad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdMetrics {
    pub spend: Decimal,
    pub impressions: u64,
    pub clicks: u64,
    #[serde(default)]
    pub ctr: Option<Decimal>,
    #[serde(default)]
    pub cpc: Option<Decimal>,
    #[serde(default)]
    pub reach: Option<u64>,
    #[serde(default)]
    pub frequency: Option<Decimal>,
}

/// One ad as listed by the ads platform, with its metrics when the platform reported any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdRecord {
    pub id: String,
    pub name: String,
    pub status: AdStatus,
    pub campaign: String,
    #[serde(default)]
    pub metrics: Option<AdMetrics>,
}

/// Everything the ads collector knows about the account at collection time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdSnapshot {
    /// Lifetime spend in major units.
    pub total_spend: Decimal,
    pub total_ads_count: usize,
    pub active_ads_count: usize,
    pub total_impressions: u64,
    pub total_clicks: u64,
    pub ads: Vec<AdRecord>,
}

impl AdSnapshot {
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.total_spend.is_sign_negative() {
            return Err(invalid("ads.total_spend", "spend is negative"));
        }
        if self.ads.len() != self.total_ads_count {
            return Err(invalid(
                "ads.total_ads_count",
                format!("{} ads listed but count is {}", self.ads.len(), self.total_ads_count),
            ));
        }
        let active = self.ads.iter().filter(|ad| ad.status.is_active()).count();
        if active != self.active_ads_count {
            return Err(invalid(
                "ads.active_ads_count",
                format!("{active} active ads listed but count is {}", self.active_ads_count),
            ));
        }
        Ok(())
    }
}

// ==============================================================================
// Event ticketing platform
// ==============================================================================

/// Gross ticket sales for one calendar day, pre-summed across events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDailyEntry {
    pub date: NaiveDate,
    /// Gross revenue in minor units.
    pub daily_revenue: i64,
    pub daily_guests: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub daily_data: Vec<EventDailyEntry>,
    pub total_guests: i64,
    /// Average lifetime spend per unique guest, in minor units.
    pub average_ltv: Decimal,
    /// Gross revenue in minor units.
    #[serde(default)]
    pub total_revenue: i64,
    #[serde(default)]
    pub total_unique_guests: u64,
    #[serde(default)]
    pub repeat_guest_count: u64,
    #[serde(default)]
    pub repeat_guest_percentage: Decimal,
}

impl EventSnapshot {
    /// A snapshot for a calendar with no paid registrations.
    pub fn empty() -> Self {
        Self {
            daily_data: Vec::new(),
            total_guests: 0,
            average_ltv: Decimal::ZERO,
            total_revenue: 0,
            total_unique_guests: 0,
            repeat_guest_count: 0,
            repeat_guest_percentage: Decimal::ZERO,
        }
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.daily_data.last().map(|day| day.date)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.total_guests < 0 {
            return Err(invalid("events.total_guests", "guest count is negative"));
        }
        if self.average_ltv.is_sign_negative() {
            return Err(invalid("events.average_ltv", "lifetime value is negative"));
        }
        if self.repeat_guest_percentage < Decimal::ZERO
            || self.repeat_guest_percentage > Decimal::ONE_HUNDRED
        {
            return Err(invalid(
                "events.repeat_guest_percentage",
                format!("{} is outside [0, 100]", self.repeat_guest_percentage),
            ));
        }

        let mut previous: Option<NaiveDate> = None;
        for day in &self.daily_data {
            if day.daily_revenue < 0 || day.daily_guests < 0 {
                return Err(invalid(
                    "events.daily_data",
                    format!("negative figures on {}", day.date),
                ));
            }
            if let Some(prev) = previous {
                if day.date <= prev {
                    return Err(invalid(
                        "events.daily_data",
                        format!("{} does not follow {}", day.date, prev),
                    ));
                }
            }
            previous = Some(day.date);
        }
        Ok(())
    }
}

// ==============================================================================
// Secondary ticket marketplace
// ==============================================================================

/// Tickets sold per day on the secondary marketplace. No revenue breakdown is available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecondaryTicketSeries(BTreeMap<NaiveDate, i64>);

impl SecondaryTicketSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `tickets` to the count already recorded for `date`.
    pub fn record(&mut self, date: NaiveDate, tickets: i64) {
        let count = self.0.entry(date).or_insert(0);
        *count = count.saturating_add(tickets);
    }

    pub fn tickets_on(&self, date: NaiveDate) -> i64 {
        self.0.get(&date).copied().unwrap_or(0)
    }

    /// Sum of all daily counts. Fails instead of wrapping on overflow.
    pub fn total_tickets(&self) -> Result<i64, CoreError> {
        self.0.values().try_fold(0i64, |total, tickets| {
            total.checked_add(*tickets).ok_or_else(|| {
                CoreError::Calculation("secondary ticket total overflowed".to_string())
            })
        })
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.0.keys().next_back().copied()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.0.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, i64)> + '_ {
        self.0.iter().map(|(date, tickets)| (*date, *tickets))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some((date, tickets)) = self.0.iter().find(|(_, tickets)| **tickets < 0) {
            return Err(invalid(
                "secondary_tickets",
                format!("{tickets} tickets on {date}"),
            ));
        }
        self.total_tickets().map(|_| ())
    }
}

impl FromIterator<(NaiveDate, i64)> for SecondaryTicketSeries {
    fn from_iter<I: IntoIterator<Item = (NaiveDate, i64)>>(iter: I) -> Self {
        let mut series = Self::new();
        for (date, tickets) in iter {
            series.record(date, tickets);
        }
        series
    }
}

// ==============================================================================
// Expense platform
// ==============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategorySpend {
    pub total: Decimal,
    pub merchants: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySpend {
    pub date: NaiveDate,
    pub spend: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSnapshot {
    /// Operational spend over the trailing window, in major units.
    pub total_spend: Decimal,
    #[serde(default)]
    pub transaction_count: usize,
    #[serde(default)]
    pub spend_by_category: BTreeMap<String, CategorySpend>,
    #[serde(default)]
    pub daily_spend: Vec<DailySpend>,
    #[serde(default)]
    pub window_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub window_end: Option<DateTime<Utc>>,
}

impl ExpenseSnapshot {
    pub fn empty(window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> Self {
        Self {
            total_spend: Decimal::ZERO,
            transaction_count: 0,
            spend_by_category: BTreeMap::new(),
            daily_spend: Vec::new(),
            window_start: Some(window_start),
            window_end: Some(window_end),
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.total_spend.is_sign_negative() {
            return Err(invalid("expenses.total_spend", "spend is negative"));
        }
        if let (Some(start), Some(end)) = (self.window_start, self.window_end) {
            if start > end {
                return Err(invalid("expenses.window", "window starts after it ends"));
            }
        }
        Ok(())
    }
}

// ==============================================================================
// Tagged union and bundle
// ==============================================================================

/// A normalized snapshot from exactly one upstream source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", content = "data", rename_all = "snake_case")]
pub enum SourceSnapshot {
    Ads(AdSnapshot),
    Events(EventSnapshot),
    SecondaryTickets(SecondaryTicketSeries),
    Expenses(ExpenseSnapshot),
}

impl SourceSnapshot {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceSnapshot::Ads(_) => SourceKind::Ads,
            SourceSnapshot::Events(_) => SourceKind::Events,
            SourceSnapshot::SecondaryTickets(_) => SourceKind::SecondaryTickets,
            SourceSnapshot::Expenses(_) => SourceKind::Expenses,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            SourceSnapshot::Ads(s) => s.validate(),
            SourceSnapshot::Events(s) => s.validate(),
            SourceSnapshot::SecondaryTickets(s) => s.validate(),
            SourceSnapshot::Expenses(s) => s.validate(),
        }
    }
}

/// One validated snapshot per source, ready for the calculator.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotBundle {
    pub ads: AdSnapshot,
    pub events: EventSnapshot,
    pub secondary_tickets: SecondaryTicketSeries,
    pub expenses: ExpenseSnapshot,
}

impl SnapshotBundle {
    /// Assembles a bundle, requiring every source exactly once and validating each snapshot.
    pub fn from_snapshots(
        snapshots: impl IntoIterator<Item = SourceSnapshot>,
    ) -> Result<Self, CoreError> {
        let mut ads = None;
        let mut events = None;
        let mut secondary_tickets = None;
        let mut expenses = None;

        for snapshot in snapshots {
            snapshot.validate()?;
            let kind = snapshot.kind();
            let duplicate = match snapshot {
                SourceSnapshot::Ads(s) => ads.replace(s).is_some(),
                SourceSnapshot::Events(s) => events.replace(s).is_some(),
                SourceSnapshot::SecondaryTickets(s) => secondary_tickets.replace(s).is_some(),
                SourceSnapshot::Expenses(s) => expenses.replace(s).is_some(),
            };
            if duplicate {
                return Err(CoreError::DuplicateSource(kind));
            }
        }

        Ok(Self {
            ads: ads.ok_or(CoreError::MissingSource(SourceKind::Ads))?,
            events: events.ok_or(CoreError::MissingSource(SourceKind::Events))?,
            secondary_tickets: secondary_tickets
                .ok_or(CoreError::MissingSource(SourceKind::SecondaryTickets))?,
            expenses: expenses.ok_or(CoreError::MissingSource(SourceKind::Expenses))?,
        })
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> CoreError {
    CoreError::InvalidInput(field.to_string(), reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn ad(id: &str, status: &str) -> AdRecord {
        AdRecord {
            id: id.into(),
            name: format!("Ad {id}"),
            status: AdStatus::from(status.to_string()),
            campaign: "Spring".into(),
            metrics: None,
        }
    }

    fn ads_snapshot() -> AdSnapshot {
        AdSnapshot {
            total_spend: dec!(120.50),
            total_ads_count: 2,
            active_ads_count: 1,
            total_impressions: 1000,
            total_clicks: 40,
            ads: vec![ad("1", "ACTIVE"), ad("2", "PAUSED")],
        }
    }

    fn events_snapshot() -> EventSnapshot {
        EventSnapshot {
            daily_data: vec![EventDailyEntry {
                date: date("2024-01-01"),
                daily_revenue: 10000,
                daily_guests: 10,
            }],
            total_guests: 10,
            average_ltv: dec!(5000),
            ..EventSnapshot::empty()
        }
    }

    fn expenses_snapshot() -> ExpenseSnapshot {
        ExpenseSnapshot {
            total_spend: dec!(42),
            transaction_count: 1,
            spend_by_category: BTreeMap::new(),
            daily_spend: Vec::new(),
            window_start: None,
            window_end: None,
        }
    }

    #[test]
    fn ad_counts_must_match_listing() {
        assert!(ads_snapshot().validate().is_ok());

        let mut wrong_total = ads_snapshot();
        wrong_total.total_ads_count = 3;
        assert!(wrong_total.validate().is_err());

        let mut wrong_active = ads_snapshot();
        wrong_active.active_ads_count = 2;
        assert!(wrong_active.validate().is_err());
    }

    #[test]
    fn event_dates_must_ascend() {
        let mut snapshot = events_snapshot();
        snapshot.daily_data.push(EventDailyEntry {
            date: date("2024-01-01"),
            daily_revenue: 100,
            daily_guests: 1,
        });
        let err = snapshot.validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(ref field, _) if field == "events.daily_data"));
    }

    #[test]
    fn secondary_series_accumulates_per_date() {
        let series: SecondaryTicketSeries = vec![
            (date("2024-05-02"), 3),
            (date("2024-05-01"), 2),
            (date("2024-05-02"), 4),
        ]
        .into_iter()
        .collect();

        assert_eq!(series.tickets_on(date("2024-05-02")), 7);
        assert_eq!(series.tickets_on(date("2024-05-03")), 0);
        assert_eq!(series.total_tickets().unwrap(), 9);
        assert_eq!(series.latest_date(), Some(date("2024-05-02")));
    }

    #[test]
    fn secondary_series_reads_a_date_map() {
        let series: SecondaryTicketSeries =
            serde_json::from_str(r#"{"2024-01-02": 4, "2024-01-01": 5}"#).unwrap();
        assert_eq!(series.total_tickets().unwrap(), 9);
        assert_eq!(series.dates().next(), Some(date("2024-01-01")));
    }

    #[test]
    fn secondary_total_overflow_is_rejected() {
        let series: SecondaryTicketSeries = vec![
            (date("2024-05-01"), i64::MAX),
            (date("2024-05-02"), 1),
        ]
        .into_iter()
        .collect();

        assert!(matches!(series.total_tickets(), Err(CoreError::Calculation(_))));
        assert!(series.validate().is_err());
    }

    #[test]
    fn tagged_snapshot_round_trips_through_json() {
        let json = r#"{"source": "secondary_tickets", "data": {"2024-01-01": 5}}"#;
        let snapshot: SourceSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.kind(), SourceKind::SecondaryTickets);
    }

    #[test]
    fn event_snapshot_requires_daily_data() {
        let json = r#"{"total_guests": 0, "average_ltv": 0}"#;
        assert!(serde_json::from_str::<EventSnapshot>(json).is_err());
    }

    #[test]
    fn bundle_requires_every_source_once() {
        let complete = vec![
            SourceSnapshot::Ads(ads_snapshot()),
            SourceSnapshot::Events(events_snapshot()),
            SourceSnapshot::SecondaryTickets(SecondaryTicketSeries::new()),
            SourceSnapshot::Expenses(expenses_snapshot()),
        ];
        assert!(SnapshotBundle::from_snapshots(complete.clone()).is_ok());

        let missing = complete[..3].to_vec();
        assert_eq!(
            SnapshotBundle::from_snapshots(missing).unwrap_err(),
            CoreError::MissingSource(SourceKind::Expenses)
        );

        let mut duplicated = complete.clone();
        duplicated.push(SourceSnapshot::Ads(ads_snapshot()));
        assert_eq!(
            SnapshotBundle::from_snapshots(duplicated).unwrap_err(),
            CoreError::DuplicateSource(SourceKind::Ads)
        );
    }

    #[test]
    fn bundle_rejects_invalid_snapshots() {
        let mut bad_expenses = expenses_snapshot();
        bad_expenses.total_spend = dec!(-1);
        let snapshots = vec![
            SourceSnapshot::Ads(ads_snapshot()),
            SourceSnapshot::Events(events_snapshot()),
            SourceSnapshot::SecondaryTickets(SecondaryTicketSeries::new()),
            SourceSnapshot::Expenses(bad_expenses),
        ];
        assert!(matches!(
            SnapshotBundle::from_snapshots(snapshots),
            Err(CoreError::InvalidInput(..))
        ));
    }
}
