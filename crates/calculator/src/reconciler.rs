use chrono::NaiveDate;
use configuration::Pricing;
use core_types::money::{major_to_minor, minor_to_major};
use core_types::{CoreError, EventDailyEntry};
use rust_decimal::Decimal;
use serde::Serialize;

/// Card-processor fees deducted from every ticket sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    /// Percentage of gross revenue, e.g. 0.029 for 2.9%.
    pub percentage_rate: Decimal,
    /// Flat amount per guest in major units.
    pub flat_fee_per_guest: Decimal,
}

impl From<&Pricing> for FeeSchedule {
    fn from(pricing: &Pricing) -> Self {
        Self {
            percentage_rate: pricing.processing_fee_rate,
            flat_fee_per_guest: pricing.flat_fee_per_guest,
        }
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::from(&Pricing::default())
    }
}

/// Fee deduction for one day, in major units and before quantization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeBreakdown {
    pub percentage_fee: Decimal,
    pub flat_fee: Decimal,
    pub net: Decimal,
}

impl FeeBreakdown {
    pub fn total_fees(&self) -> Decimal {
        self.percentage_fee + self.flat_fee
    }
}

/// One day of ticket revenue after processor fees. All money is in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconciledDailyEntry {
    pub date: NaiveDate,
    pub gross_revenue: i64,
    pub guest_count: i64,
    pub fees: i64,
    pub revenue_after_fees: i64,
    pub accumulated_revenue_after_fees: i64,
    pub accumulated_guests: i64,
}

/// The reconciled series for one source, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciledSeries {
    entries: Vec<ReconciledDailyEntry>,
}

impl ReconciledSeries {
    pub fn entries(&self) -> &[ReconciledDailyEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, date: NaiveDate) -> Option<&ReconciledDailyEntry> {
        self.entries
            .binary_search_by_key(&date, |entry| entry.date)
            .ok()
            .map(|idx| &self.entries[idx])
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.entries.last().map(|entry| entry.date)
    }

    /// Net revenue across the whole series, in minor units.
    pub fn total_revenue_after_fees(&self) -> i64 {
        self.entries
            .last()
            .map_or(0, |entry| entry.accumulated_revenue_after_fees)
    }

    /// Gross revenue across the whole series, in minor units.
    pub fn total_gross_revenue(&self) -> i64 {
        self.entries.iter().map(|entry| entry.gross_revenue).sum()
    }

    pub fn total_guests(&self) -> i64 {
        self.entries.last().map_or(0, |entry| entry.accumulated_guests)
    }
}

/// Converts per-day gross ticket revenue into revenue net of processor fees.
///
/// Stateless; every call to [`DailyFeeReconciler::reconcile`] starts its
/// accumulators from zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyFeeReconciler {
    fees: FeeSchedule,
}

impl DailyFeeReconciler {
    pub fn new(fees: FeeSchedule) -> Self {
        Self { fees }
    }

    /// Applies the fee formula to one day's gross revenue (major units) and guest count.
    pub fn net_of_fees(&self, gross: Decimal, guests: i64) -> FeeBreakdown {
        let percentage_fee = gross * self.fees.percentage_rate;
        let flat_fee = Decimal::from(guests) * self.fees.flat_fee_per_guest;
        FeeBreakdown {
            percentage_fee,
            flat_fee,
            net: gross - percentage_fee - flat_fee,
        }
    }

    /// Reconciles an ordered series of daily entries.
    ///
    /// Dates are expected to be unique and ascending. Each day's net revenue is
    /// quantized to whole minor units and the fee is whatever remains of the gross,
    /// so `fees + revenue_after_fees == gross_revenue` holds for every entry and the
    /// running totals are exact sums of the stored daily figures.
    pub fn reconcile(&self, days: &[EventDailyEntry]) -> Result<ReconciledSeries, CoreError> {
        let mut entries = Vec::with_capacity(days.len());
        let mut accumulated_revenue_after_fees: i64 = 0;
        let mut accumulated_guests: i64 = 0;

        for day in days {
            let breakdown = self.net_of_fees(minor_to_major(day.daily_revenue), day.daily_guests);
            let revenue_after_fees = major_to_minor(breakdown.net)?;
            let fees = day.daily_revenue - revenue_after_fees;

            accumulated_revenue_after_fees = accumulated_revenue_after_fees
                .checked_add(revenue_after_fees)
                .ok_or_else(|| overflow("accumulated revenue after fees", day.date))?;
            accumulated_guests = accumulated_guests
                .checked_add(day.daily_guests)
                .ok_or_else(|| overflow("accumulated guests", day.date))?;

            tracing::debug!(
                date = %day.date,
                gross = day.daily_revenue,
                fees,
                revenue_after_fees,
                "Reconciled daily ticket revenue"
            );

            entries.push(ReconciledDailyEntry {
                date: day.date,
                gross_revenue: day.daily_revenue,
                guest_count: day.daily_guests,
                fees,
                revenue_after_fees,
                accumulated_revenue_after_fees,
                accumulated_guests,
            });
        }

        Ok(ReconciledSeries { entries })
    }
}

fn overflow(what: &str, date: NaiveDate) -> CoreError {
    CoreError::Calculation(format!("{what} overflowed on {date}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn day(d: &str, revenue: i64, guests: i64) -> EventDailyEntry {
        EventDailyEntry {
            date: date(d),
            daily_revenue: revenue,
            daily_guests: guests,
        }
    }

    #[test]
    fn fee_formula_matches_processor_pricing() {
        let reconciler = DailyFeeReconciler::default();
        let breakdown = reconciler.net_of_fees(dec!(100.00), 10);
        assert_eq!(breakdown.percentage_fee, dec!(2.9));
        assert_eq!(breakdown.flat_fee, dec!(3.0));
        assert_eq!(breakdown.total_fees(), dec!(5.9));
        assert_eq!(breakdown.net, dec!(94.10));
    }

    #[test]
    fn net_never_exceeds_gross() {
        let reconciler = DailyFeeReconciler::default();
        for gross_cents in [0_i64, 1, 99, 4_500, 123_456, 9_999_999] {
            for guests in [0_i64, 1, 3, 250] {
                let gross = minor_to_major(gross_cents);
                let breakdown = reconciler.net_of_fees(gross, guests);
                assert_eq!(
                    breakdown.net,
                    gross - gross * dec!(0.029) - Decimal::from(guests) * dec!(0.30)
                );
                assert!(breakdown.net <= gross);
            }
        }
    }

    #[test]
    fn empty_series_reconciles_to_nothing() {
        let series = DailyFeeReconciler::default().reconcile(&[]).unwrap();
        assert!(series.is_empty());
        assert_eq!(series.total_revenue_after_fees(), 0);
        assert_eq!(series.total_guests(), 0);
        assert_eq!(series.latest_date(), None);
    }

    #[test]
    fn single_day_is_stored_in_cents() {
        let series = DailyFeeReconciler::default()
            .reconcile(&[day("2024-01-01", 10_000, 10)])
            .unwrap();
        let entry = series.entries()[0];
        assert_eq!(entry.revenue_after_fees, 9_410);
        assert_eq!(entry.fees, 590);
        assert_eq!(entry.accumulated_revenue_after_fees, 9_410);
        assert_eq!(entry.accumulated_guests, 10);
    }

    #[test]
    fn accumulators_carry_across_days() {
        let series = DailyFeeReconciler::default()
            .reconcile(&[
                day("2024-01-01", 10_000, 10),
                day("2024-01-02", 0, 0),
                day("2024-01-03", 5_000, 2),
            ])
            .unwrap();

        // 50.00 - 1.45 - 0.60 = 47.95
        assert_eq!(series.entries()[2].revenue_after_fees, 4_795);
        assert_eq!(series.entries()[1].accumulated_revenue_after_fees, 9_410);
        assert_eq!(series.total_revenue_after_fees(), 9_410 + 4_795);
        assert_eq!(series.total_guests(), 12);
        assert_eq!(series.total_gross_revenue(), 15_000);
        assert_eq!(series.get(date("2024-01-02")).unwrap().gross_revenue, 0);
        assert!(series.get(date("2024-01-04")).is_none());
    }

    #[test]
    fn rounding_goes_to_the_nearest_cent() {
        // 12.34 gross, 1 guest: 12.34 - 0.35786 - 0.30 = 11.68214
        let series = DailyFeeReconciler::default()
            .reconcile(&[day("2024-02-01", 1_234, 1)])
            .unwrap();
        let entry = series.entries()[0];
        assert_eq!(entry.revenue_after_fees, 1_168);
        assert_eq!(entry.fees + entry.revenue_after_fees, entry.gross_revenue);
    }

    #[test]
    fn custom_schedule_is_applied() {
        let reconciler = DailyFeeReconciler::new(FeeSchedule {
            percentage_rate: dec!(0.05),
            flat_fee_per_guest: Decimal::ZERO,
        });
        let series = reconciler.reconcile(&[day("2024-03-01", 20_000, 4)]).unwrap();
        assert_eq!(series.total_revenue_after_fees(), 19_000);
    }
}
