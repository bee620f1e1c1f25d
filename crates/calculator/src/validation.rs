use crate::error::ValidationFailure;
use crate::report::CombinedMetricsRecord;
use rust_decimal::Decimal;

/// Inclusive bounds for the revenue-spent-on-ads metric.
const REVENUE_SPENT_ON_ADS_RANGE: (Decimal, Decimal) = (Decimal::ZERO, Decimal::ONE_HUNDRED);

/// Checks a finished record against the invariants the dashboard relies on.
///
/// Returns the first violated invariant; a record is either fully valid or rejected.
pub fn validate_record(record: &CombinedMetricsRecord) -> Result<(), ValidationFailure> {
    check_totals(record)?;
    check_daily_breakdown(record)?;
    check_summary_matches_detail(record)?;
    Ok(())
}

fn check_totals(record: &CombinedMetricsRecord) -> Result<(), ValidationFailure> {
    let totals = [
        ("total spend", record.total_spend),
        ("total revenue", record.total_revenue),
        ("total guests", Decimal::from(record.total_guests)),
    ];
    for (metric, value) in totals {
        if value < Decimal::ZERO {
            return Err(ValidationFailure::NegativeTotal { metric, value });
        }
    }

    let (low, high) = REVENUE_SPENT_ON_ADS_RANGE;
    if record.revenue_spent_on_ads < low || record.revenue_spent_on_ads > high {
        return Err(ValidationFailure::RevenueSpentOnAdsOutOfRange(
            record.revenue_spent_on_ads,
        ));
    }
    Ok(())
}

fn check_daily_breakdown(record: &CombinedMetricsRecord) -> Result<(), ValidationFailure> {
    let mut previous_net = None;
    for day in &record.daily_breakdown {
        if day.gross_revenue < Decimal::ZERO || day.net_revenue < Decimal::ZERO {
            return Err(ValidationFailure::NegativeDailyRevenue(day.date));
        }
        if day.daily_guests < 0 {
            return Err(ValidationFailure::NegativeDailyGuests(day.date));
        }

        // A day whose processor fees exceed its gross lowers cumulative net revenue.
        if previous_net.is_some_and(|net| day.net_revenue < net) {
            tracing::warn!(
                date = %day.date,
                net_revenue = %day.net_revenue,
                "Cumulative net revenue decreased"
            );
        }
        previous_net = Some(day.net_revenue);
    }
    Ok(())
}

fn check_summary_matches_detail(record: &CombinedMetricsRecord) -> Result<(), ValidationFailure> {
    let (detail_revenue, detail_guests) = record
        .daily_breakdown
        .last()
        .map_or((Decimal::ZERO, 0), |day| (day.net_revenue, day.accumulated_guests));

    if record.total_revenue != detail_revenue {
        return Err(ValidationFailure::SummaryMismatch {
            field: "revenue",
            summary: record.total_revenue,
            detail: detail_revenue,
        });
    }
    if record.total_guests != detail_guests {
        return Err(ValidationFailure::SummaryMismatch {
            field: "guests",
            summary: Decimal::from(record.total_guests),
            detail: Decimal::from(detail_guests),
        });
    }
    Ok(())
}
