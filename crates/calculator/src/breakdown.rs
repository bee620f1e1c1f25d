use crate::reconciler::ReconciledSeries;
use chrono::NaiveDate;
use core_types::money::minor_to_major;
use core_types::{CoreError, SecondaryTicketSeries};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// One row of the dashboard's daily chart.
///
/// Revenue fields are cumulative over the merged date sequence, in major units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedDailyEntry {
    pub date: NaiveDate,
    pub gross_revenue: Decimal,
    pub net_revenue: Decimal,
    pub daily_guests: i64,
    pub accumulated_guests: i64,
}

/// The last date each source has reported data for.
///
/// A source contributes nothing to dates after its cutoff, and a source with no
/// cutoff contributes nothing at all. Without this, a day where the event source
/// simply has not reported yet would show up as a zero-revenue day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreshnessCutoffs {
    pub events: Option<NaiveDate>,
    pub secondary: Option<NaiveDate>,
}

impl FreshnessCutoffs {
    /// Uses each source's latest reported date as its cutoff.
    pub fn from_sources(events: &ReconciledSeries, secondary: &SecondaryTicketSeries) -> Self {
        Self {
            events: events.latest_date(),
            secondary: secondary.latest_date(),
        }
    }

    pub fn events_fresh_on(&self, date: NaiveDate) -> bool {
        self.events.is_some_and(|cutoff| date <= cutoff)
    }

    pub fn secondary_fresh_on(&self, date: NaiveDate) -> bool {
        self.secondary.is_some_and(|cutoff| date <= cutoff)
    }
}

/// Merges the reconciled event series and the secondary ticket counts into one
/// date-aligned series over the union of both sources' dates.
///
/// Secondary tickets are valued at `ticket_price` and carry no processor fees, so
/// they add the same amount to gross and net revenue. Guest counts that overflow
/// are reported as [`CoreError::Calculation`].
pub fn merge_daily_breakdown(
    events: &ReconciledSeries,
    secondary: &SecondaryTicketSeries,
    ticket_price: Decimal,
    cutoffs: FreshnessCutoffs,
) -> Result<Vec<MergedDailyEntry>, CoreError> {
    let dates: BTreeSet<NaiveDate> = events
        .entries()
        .iter()
        .map(|entry| entry.date)
        .chain(secondary.dates())
        .collect();

    let mut breakdown = Vec::with_capacity(dates.len());
    let mut accumulated_gross = Decimal::ZERO;
    let mut accumulated_net = Decimal::ZERO;
    let mut accumulated_guests: i64 = 0;

    for date in dates {
        let use_events = cutoffs.events_fresh_on(date);
        let use_secondary = cutoffs.secondary_fresh_on(date);

        let (event_gross, event_net, event_guests) = match events.get(date) {
            Some(entry) if use_events => (
                minor_to_major(entry.gross_revenue),
                minor_to_major(entry.revenue_after_fees),
                entry.guest_count,
            ),
            _ => (Decimal::ZERO, Decimal::ZERO, 0),
        };

        let secondary_tickets = if use_secondary {
            secondary.tickets_on(date)
        } else {
            0
        };
        let secondary_revenue = Decimal::from(secondary_tickets) * ticket_price;

        let daily_guests = event_guests
            .checked_add(secondary_tickets)
            .ok_or_else(|| guest_overflow("daily guests", date))?;
        accumulated_guests = accumulated_guests
            .checked_add(daily_guests)
            .ok_or_else(|| guest_overflow("accumulated guests", date))?;
        accumulated_gross += event_gross + secondary_revenue;
        accumulated_net += event_net + secondary_revenue;

        tracing::debug!(
            date = %date,
            use_events,
            use_secondary,
            daily_guests,
            "Merged daily breakdown entry"
        );

        breakdown.push(MergedDailyEntry {
            date,
            gross_revenue: accumulated_gross,
            net_revenue: accumulated_net,
            daily_guests,
            accumulated_guests,
        });
    }

    Ok(breakdown)
}

fn guest_overflow(what: &str, date: NaiveDate) -> CoreError {
    CoreError::Calculation(format!("{what} overflowed on {date}"))
}
