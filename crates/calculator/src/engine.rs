use crate::breakdown::{merge_daily_breakdown, FreshnessCutoffs};
use crate::error::CalculatorError;
use crate::reconciler::{DailyFeeReconciler, FeeSchedule};
use crate::report::{AdMetricsSummary, CombinedMetricsRecord};
use crate::validation::validate_record;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use configuration::{Pricing, Settings, SpendConstants};
use core_types::money::{minor_decimal_to_major, minor_to_major, ratio_or_zero};
use core_types::{
    AdSnapshot, CoreError, EventSnapshot, ExpenseSnapshot, SecondaryTicketSeries, SnapshotBundle,
};
use rust_decimal::Decimal;

/// A stateless calculator that combines every source snapshot into one metrics record.
#[derive(Debug, Clone)]
pub struct MetricsCalculator {
    pricing: Pricing,
    spend: SpendConstants,
    timezone: Tz,
}

impl MetricsCalculator {
    pub fn new(pricing: Pricing, spend: SpendConstants, timezone: Tz) -> Self {
        Self {
            pricing,
            spend,
            timezone,
        }
    }

    pub fn from_settings(settings: &Settings, spend: SpendConstants) -> Self {
        Self::new(settings.pricing.clone(), spend, settings.business.timezone)
    }

    pub fn calculate_bundle(
        &self,
        bundle: &SnapshotBundle,
    ) -> Result<CombinedMetricsRecord, CalculatorError> {
        self.calculate(
            &bundle.ads,
            &bundle.events,
            &bundle.secondary_tickets,
            &bundle.expenses,
        )
    }

    /// The main entry point for calculating the combined metrics.
    ///
    /// # Arguments
    ///
    /// * `ads` - Lifetime spend and delivery figures from the ads platform.
    /// * `events` - Daily gross ticket sales from the event platform.
    /// * `secondary` - Daily ticket counts from the secondary marketplace.
    /// * `expenses` - Operational spend over the trailing window.
    ///
    /// # Returns
    ///
    /// A validated `CombinedMetricsRecord`, or a `CalculatorError` if an input
    /// snapshot is malformed or the result breaks an invariant.
    pub fn calculate(
        &self,
        ads: &AdSnapshot,
        events: &EventSnapshot,
        secondary: &SecondaryTicketSeries,
        expenses: &ExpenseSnapshot,
    ) -> Result<CombinedMetricsRecord, CalculatorError> {
        self.calculate_at(ads, events, secondary, expenses, Utc::now())
    }

    /// Same as [`MetricsCalculator::calculate`], stamping the record with `now`.
    pub fn calculate_at(
        &self,
        ads: &AdSnapshot,
        events: &EventSnapshot,
        secondary: &SecondaryTicketSeries,
        expenses: &ExpenseSnapshot,
        now: DateTime<Utc>,
    ) -> Result<CombinedMetricsRecord, CalculatorError> {
        ads.validate()?;
        events.validate()?;
        secondary.validate()?;
        expenses.validate()?;

        // --- Secondary marketplace ---
        let secondary_tickets = secondary.total_tickets()?;
        let secondary_revenue = Decimal::from(secondary_tickets) * self.pricing.secondary_ticket_price;
        let secondary_influencer_fee = secondary_revenue * self.pricing.secondary_fee_share;

        // --- Spend ---
        let paid_ads_spend = ads.total_spend + self.spend.historical_spend;
        let influencer_spend = self.spend.influencer_spend + secondary_influencer_fee;
        let total_spend = paid_ads_spend + influencer_spend;

        // --- Revenue and guests ---
        let reconciler = DailyFeeReconciler::new(FeeSchedule::from(&self.pricing));
        let reconciled = reconciler.reconcile(&events.daily_data)?;
        if reconciled.total_guests() != events.total_guests {
            tracing::warn!(
                reported = events.total_guests,
                daily_sum = reconciled.total_guests(),
                "Event total guests disagree with the daily series; using the daily series"
            );
        }

        let total_revenue = minor_to_major(reconciled.total_revenue_after_fees()) + secondary_revenue;
        let total_guests = reconciled
            .total_guests()
            .checked_add(secondary_tickets)
            .ok_or_else(|| CoreError::Calculation("total guests overflowed".to_string()))?;

        // --- Ratios ---
        let spend_to_revenue_ratio = ratio_or_zero(total_spend, total_revenue);
        let cost_per_acquisition = ratio_or_zero(total_spend, Decimal::from(total_guests));
        let net_revenue = total_revenue - total_spend;

        // --- Daily detail ---
        let cutoffs = FreshnessCutoffs::from_sources(&reconciled, secondary);
        let daily_breakdown = merge_daily_breakdown(
            &reconciled,
            secondary,
            self.pricing.secondary_ticket_price,
            cutoffs,
        )?;

        tracing::info!(
            ad_platform_spend = %ads.total_spend,
            historical_spend = %self.spend.historical_spend,
            %paid_ads_spend,
            %influencer_spend,
            %total_spend,
            "Marketing spend breakdown"
        );
        tracing::info!(
            total_ads = ads.total_ads_count,
            active_ads = ads.active_ads_count,
            "Ads platform status"
        );
        tracing::info!(
            operational_expenses = %expenses.total_spend,
            "Operational expenses for the trailing window"
        );

        let record = CombinedMetricsRecord {
            timestamp: now.with_timezone(&self.timezone).fixed_offset(),
            total_spend,
            ad_platform_spend: ads.total_spend,
            paid_ads_spend,
            influencer_spend,
            total_revenue,
            total_guests,
            net_revenue,
            spend_to_revenue_ratio,
            // A fraction of revenue (1 means spend equals revenue), kept unscaled.
            revenue_spent_on_ads: spend_to_revenue_ratio,
            cost_per_acquisition,
            average_ltv: minor_decimal_to_major(events.average_ltv),
            operational_expenses: expenses.total_spend,
            ad_metrics: AdMetricsSummary::from(ads),
            daily_breakdown,
        };

        if let Err(failure) = validate_record(&record) {
            tracing::error!(%failure, "Calculated metrics failed validation");
            return Err(failure.into());
        }

        tracing::info!(days = record.daily_breakdown.len(), "Successfully calculated combined metrics");
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use core_types::{AdRecord, AdStatus, CoreError, EventDailyEntry};
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn calculator(spend: SpendConstants) -> MetricsCalculator {
        MetricsCalculator::new(Pricing::default(), spend, chrono_tz::America::New_York)
    }

    fn ads(spend: Decimal) -> AdSnapshot {
        AdSnapshot {
            total_spend: spend,
            total_ads_count: 1,
            active_ads_count: 1,
            total_impressions: 5_000,
            total_clicks: 120,
            ads: vec![AdRecord {
                id: "120".into(),
                name: "Launch".into(),
                status: AdStatus::Active,
                campaign: "Launch".into(),
                metrics: None,
            }],
        }
    }

    fn events(days: &[(&str, i64, i64)]) -> EventSnapshot {
        let daily_data: Vec<EventDailyEntry> = days
            .iter()
            .map(|(d, revenue, guests)| EventDailyEntry {
                date: date(d),
                daily_revenue: *revenue,
                daily_guests: *guests,
            })
            .collect();
        EventSnapshot {
            total_guests: daily_data.iter().map(|d| d.daily_guests).sum(),
            total_revenue: daily_data.iter().map(|d| d.daily_revenue).sum(),
            daily_data,
            average_ltv: dec!(4550),
            ..EventSnapshot::empty()
        }
    }

    fn secondary(days: &[(&str, i64)]) -> SecondaryTicketSeries {
        days.iter().map(|(d, tickets)| (date(d), *tickets)).collect()
    }

    fn expenses(total: Decimal) -> ExpenseSnapshot {
        ExpenseSnapshot {
            total_spend: total,
            transaction_count: 3,
            spend_by_category: BTreeMap::new(),
            daily_spend: Vec::new(),
            window_start: None,
            window_end: None,
        }
    }

    #[test]
    fn single_day_from_each_source() {
        let record = calculator(SpendConstants::default())
            .calculate(
                &ads(Decimal::ZERO),
                &events(&[("2024-01-01", 10_000, 10)]),
                &secondary(&[("2024-01-01", 5)]),
                &expenses(dec!(250)),
            )
            .unwrap();

        assert_eq!(record.total_revenue, dec!(419.10));
        assert_eq!(record.total_guests, 15);
        // 23% of 325.00 secondary revenue is paid to influencers.
        assert_eq!(record.influencer_spend, dec!(74.75));
        assert_eq!(record.total_spend, dec!(74.75));
        assert_eq!(record.net_revenue, dec!(344.35));
        assert_eq!(record.operational_expenses, dec!(250));
        assert_eq!(record.average_ltv, dec!(45.50));
        assert_eq!(record.daily_breakdown.len(), 1);
        assert_eq!(record.daily_breakdown[0].net_revenue, record.total_revenue);
    }

    #[test]
    fn spend_components_are_combined() {
        let record = calculator(SpendConstants::new(dec!(300), dec!(1200)))
            .calculate(
                &ads(dec!(500.25)),
                &events(&[("2024-01-01", 100_000, 20)]),
                &secondary(&[("2024-01-02", 4)]),
                &expenses(Decimal::ZERO),
            )
            .unwrap();

        assert_eq!(record.ad_platform_spend, dec!(500.25));
        assert_eq!(record.paid_ads_spend, dec!(1700.25));
        // 4 tickets * 65 = 260, 23% of which is 59.80
        assert_eq!(record.influencer_spend, dec!(359.80));
        assert_eq!(record.total_spend, dec!(2060.05));
        assert_eq!(record.total_guests, 24);
        assert_eq!(record.cost_per_acquisition, record.total_spend / dec!(24));
        assert_eq!(
            record.spend_to_revenue_ratio,
            record.total_spend / record.total_revenue
        );
        assert_eq!(record.revenue_spent_on_ads, record.spend_to_revenue_ratio);
    }

    #[test]
    fn zero_revenue_and_guests_give_zero_ratios() {
        let record = calculator(SpendConstants::new(dec!(100), Decimal::ZERO))
            .calculate(
                &ads(Decimal::ZERO),
                &events(&[]),
                &SecondaryTicketSeries::new(),
                &expenses(Decimal::ZERO),
            )
            .unwrap();

        assert_eq!(record.total_revenue, Decimal::ZERO);
        assert_eq!(record.spend_to_revenue_ratio, Decimal::ZERO);
        assert_eq!(record.cost_per_acquisition, Decimal::ZERO);
        assert_eq!(record.net_revenue, dec!(-100));
        assert!(record.daily_breakdown.is_empty());
    }

    #[test]
    fn fee_heavy_day_does_not_invalidate_the_record() {
        let record = calculator(SpendConstants::default())
            .calculate(
                &ads(Decimal::ZERO),
                &events(&[("2024-01-01", 10_000, 10), ("2024-01-02", 20, 1)]),
                &SecondaryTicketSeries::new(),
                &expenses(Decimal::ZERO),
            )
            .unwrap();

        assert_eq!(record.daily_breakdown[0].net_revenue, dec!(94.10));
        assert_eq!(record.daily_breakdown[1].net_revenue, dec!(93.99));
        assert_eq!(record.total_revenue, dec!(93.99));
        assert_eq!(record.total_guests, 11);
    }

    #[test]
    fn timestamp_uses_the_business_timezone() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 17, 30, 0).unwrap();
        let record = calculator(SpendConstants::default())
            .calculate_at(
                &ads(Decimal::ZERO),
                &events(&[]),
                &SecondaryTicketSeries::new(),
                &expenses(Decimal::ZERO),
                now,
            )
            .unwrap();

        assert_eq!(record.timestamp.to_rfc3339(), "2024-01-15T12:30:00-05:00");
    }

    #[test]
    fn unordered_event_dates_are_a_precondition_error() {
        let err = calculator(SpendConstants::default())
            .calculate(
                &ads(Decimal::ZERO),
                &events(&[("2024-01-02", 1_000, 1), ("2024-01-01", 1_000, 1)]),
                &SecondaryTicketSeries::new(),
                &expenses(Decimal::ZERO),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            CalculatorError::Precondition(CoreError::InvalidInput(..))
        ));
    }

    #[test]
    fn spend_far_above_revenue_fails_validation() {
        // 1 ticket at 65 against 10,000 of spend: ratio ~153.8, outside [0, 100].
        let err = calculator(SpendConstants::new(Decimal::ZERO, dec!(10000)))
            .calculate(
                &ads(Decimal::ZERO),
                &events(&[]),
                &secondary(&[("2024-01-01", 1)]),
                &expenses(Decimal::ZERO),
            )
            .unwrap_err();
        assert!(matches!(err, CalculatorError::Validation(_)));
    }
}
