use crate::error::CollectorError;
use crate::responses::{CalendarEntry, EntryList, GuestEntry};
use crate::retry::RetryPolicy;
use crate::Collector;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use configuration::{EventsSource, Secret};
use core_types::{EventDailyEntry, EventSnapshot, SourceKind, SourceSnapshot};
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashSet};

const API_KEY_HEADER: &str = "x-luma-api-key";

/// Collects paid registrations from the event-ticketing platform.
pub struct EventsCollector {
    client: reqwest::Client,
    base_url: String,
    track_events: HashSet<String>,
    ignore_events: HashSet<String>,
    retry: RetryPolicy,
}

impl EventsCollector {
    pub fn new(
        source: &EventsSource,
        api_key: &Secret,
        retry: RetryPolicy,
    ) -> Result<Self, CollectorError> {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_str(api_key.expose())?);

        Ok(Self {
            client: reqwest::Client::builder().default_headers(headers).build()?,
            base_url: source.base_url.trim_end_matches('/').to_string(),
            track_events: source.track_events.iter().cloned().collect(),
            ignore_events: source.ignore_events.iter().cloned().collect(),
            retry,
        })
    }

    /// Ignored events are skipped even when also tracked. Every other event is processed.
    fn should_process(&self, event_id: &str) -> bool {
        !self.ignore_events.contains(event_id)
    }

    async fn list_events(&self) -> Result<Vec<CalendarEntry>, CollectorError> {
        let url = format!("{}/calendar/list-events", self.base_url);
        let list: EntryList<CalendarEntry> = self
            .retry
            .get_json(SourceKind::Events, || self.client.get(&url))
            .await?;
        Ok(list.entries)
    }

    async fn list_guests(&self, event_id: &str) -> Result<Vec<GuestEntry>, CollectorError> {
        let url = format!("{}/event/get-guests", self.base_url);
        let list: EntryList<GuestEntry> = self
            .retry
            .get_json(SourceKind::Events, || {
                self.client.get(&url).query(&[("event_api_id", event_id)])
            })
            .await?;
        Ok(list.entries)
    }
}

#[async_trait]
impl Collector for EventsCollector {
    fn source(&self) -> SourceKind {
        SourceKind::Events
    }

    async fn collect(&self) -> Result<SourceSnapshot, CollectorError> {
        let events = self.list_events().await?;
        if events.is_empty() {
            tracing::warn!("No events found on the calendar");
        }

        let mut ledger = RegistrationLedger::default();
        for entry in events {
            let Some(event_id) = entry.event.api_id else {
                continue;
            };
            let name = entry.event.name.as_deref().unwrap_or("Unnamed Event");
            if !self.should_process(&event_id) {
                tracing::info!(event = name, %event_id, "Skipping ignored event");
                continue;
            }

            tracing::info!(
                event = name,
                %event_id,
                tracked = self.track_events.contains(&event_id),
                "Processing event"
            );
            let guests = self.list_guests(&event_id).await?;
            ledger.record_event(&event_id, &guests)?;
        }

        let snapshot = ledger.into_snapshot();
        snapshot.validate()?;
        tracing::info!(
            total_guests = snapshot.total_guests,
            unique_guests = snapshot.total_unique_guests,
            repeat_guests = snapshot.repeat_guest_count,
            "Collected event platform data"
        );
        Ok(SourceSnapshot::Events(snapshot))
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct DailySales {
    revenue: i64,
    tickets: i64,
}

/// Accumulates paid registrations across events.
///
/// Daily figures are keyed by registration date, read in the timestamp's own
/// offset. For lifetime value each guest keeps the first single-ticket price seen
/// per event.
#[derive(Debug, Default)]
pub struct RegistrationLedger {
    by_date: BTreeMap<NaiveDate, DailySales>,
    // email -> event id -> single-ticket price in minor units
    guests: BTreeMap<String, BTreeMap<String, i64>>,
}

impl RegistrationLedger {
    pub fn record_event(&mut self, event_id: &str, entries: &[GuestEntry]) -> Result<(), CollectorError> {
        for entry in entries {
            let guest = &entry.guest;
            let Some(email) = guest.email.as_deref().filter(|e| !e.is_empty()) else {
                continue;
            };
            if guest.event_tickets.is_empty() {
                continue;
            }

            let total_amount: i64 = guest.event_tickets.iter().map(|t| t.amount).sum();
            if total_amount == 0 {
                tracing::debug!(%event_id, "Skipping free registration");
                continue;
            }
            let ticket_count = guest.event_tickets.len() as i64;
            let single_ticket_amount = total_amount.div_euclid(ticket_count);

            let purchase_date = registration_date(guest.registered_at.as_deref())?;
            let day = self.by_date.entry(purchase_date).or_default();
            day.revenue += total_amount;
            day.tickets += ticket_count;

            self.guests
                .entry(email.to_string())
                .or_default()
                .entry(event_id.to_string())
                .or_insert(single_ticket_amount);
        }
        Ok(())
    }

    pub fn into_snapshot(self) -> EventSnapshot {
        let daily_data: Vec<EventDailyEntry> = self
            .by_date
            .iter()
            .map(|(date, sales)| EventDailyEntry {
                date: *date,
                daily_revenue: sales.revenue,
                daily_guests: sales.tickets,
            })
            .collect();

        let unique_guests = self.guests.len() as u64;
        let repeat_guests = self.guests.values().filter(|events| events.len() > 1).count() as u64;
        let lifetime_total: i64 = self.guests.values().flat_map(|events| events.values()).sum();

        let (average_ltv, repeat_percentage) = if unique_guests == 0 {
            (Decimal::ZERO, Decimal::ZERO)
        } else {
            let unique = Decimal::from(unique_guests);
            (
                Decimal::from(lifetime_total) / unique,
                Decimal::from(repeat_guests) * Decimal::ONE_HUNDRED / unique,
            )
        };

        EventSnapshot {
            total_guests: daily_data.iter().map(|d| d.daily_guests).sum(),
            total_revenue: daily_data.iter().map(|d| d.daily_revenue).sum(),
            daily_data,
            average_ltv,
            total_unique_guests: unique_guests,
            repeat_guest_count: repeat_guests,
            repeat_guest_percentage: repeat_percentage,
        }
    }
}

fn registration_date(raw: Option<&str>) -> Result<NaiveDate, CollectorError> {
    let raw = raw.ok_or_else(|| CollectorError::invalid(SourceKind::Events, "registration without registered_at"))?;
    // The calendar date in the timestamp's own offset, not in UTC.
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.date_naive())
        .map_err(|e| CollectorError::invalid(SourceKind::Events, format!("registered_at '{raw}': {e}")))
}
