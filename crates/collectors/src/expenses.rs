use crate::error::CollectorError;
use crate::responses::{RawTransaction, TransactionPage};
use crate::retry::RetryPolicy;
use crate::Collector;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use configuration::{ExpensesSource, Secret};
use core_types::{CategorySpend, DailySpend, ExpenseSnapshot, SourceKind, SourceSnapshot};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::str::FromStr;

const API_TOKEN_HEADER: &str = "apitoken";
const DECLINED: &str = "DECLINE";

/// Collects corporate-card spend over a trailing window from the expense platform.
pub struct ExpensesCollector {
    client: reqwest::Client,
    base_url: String,
    window: Duration,
    retry: RetryPolicy,
}

impl ExpensesCollector {
    pub fn new(
        source: &ExpensesSource,
        api_token: &Secret,
        retry: RetryPolicy,
    ) -> Result<Self, CollectorError> {
        let mut headers = HeaderMap::new();
        headers.insert(API_TOKEN_HEADER, HeaderValue::from_str(api_token.expose())?);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Ok(Self {
            client: reqwest::Client::builder().default_headers(headers).build()?,
            base_url: source.base_url.trim_end_matches('/').to_string(),
            window: Duration::days(i64::from(source.window_days)),
            retry,
        })
    }

    async fn fetch_transactions(&self) -> Result<Vec<RawTransaction>, CollectorError> {
        let url = format!("{}/spend/transactions", self.base_url);
        let page: TransactionPage = self
            .retry
            .get_json(SourceKind::Expenses, || self.client.get(&url))
            .await?;
        tracing::debug!(count = page.results.len(), "Fetched card transactions");
        Ok(page.results)
    }
}

#[async_trait]
impl Collector for ExpensesCollector {
    fn source(&self) -> SourceKind {
        SourceKind::Expenses
    }

    async fn collect(&self) -> Result<SourceSnapshot, CollectorError> {
        let window_end = Utc::now();
        let window_start = window_end - self.window;

        let transactions = self.fetch_transactions().await?;
        let snapshot = summarize_transactions(&transactions, window_start, window_end);
        snapshot.validate()?;

        tracing::info!(
            total_spend = %snapshot.total_spend,
            transactions = snapshot.transaction_count,
            categories = snapshot.spend_by_category.len(),
            "Collected expense platform data"
        );
        Ok(SourceSnapshot::Expenses(snapshot))
    }
}

/// Totals settled transactions that occurred inside `[window_start, window_end]`.
///
/// Declined transactions are skipped. Rows with a missing or unparsable timestamp or
/// amount are skipped with a warning rather than failing the whole collection.
pub fn summarize_transactions(
    transactions: &[RawTransaction],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> ExpenseSnapshot {
    let mut snapshot = ExpenseSnapshot::empty(window_start, window_end);
    let mut by_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();

    for transaction in transactions {
        if transaction.transaction_type.as_deref() == Some(DECLINED) {
            continue;
        }
        let id = transaction.id.as_deref().unwrap_or("unknown");

        let Some(occurred) = transaction.occurred_time.as_deref().and_then(parse_timestamp) else {
            tracing::warn!(transaction = id, "Skipping transaction without a valid occurredTime");
            continue;
        };
        if occurred < window_start || occurred > window_end {
            continue;
        }
        let Some(amount) = transaction.amount.as_ref().and_then(parse_amount) else {
            tracing::warn!(transaction = id, "Skipping transaction without a valid amount");
            continue;
        };

        let merchant = transaction.merchant_name.clone().unwrap_or_else(|| "Unknown".to_string());
        let category = transaction
            .merchant_category_code
            .clone()
            .unwrap_or_else(|| "Uncategorized".to_string());

        snapshot.total_spend += amount;
        snapshot.transaction_count += 1;
        let bucket: &mut CategorySpend = snapshot.spend_by_category.entry(category).or_default();
        bucket.total += amount;
        bucket.merchants.insert(merchant);
        *by_day.entry(occurred.date_naive()).or_default() += amount;
    }

    snapshot.daily_spend = by_day
        .into_iter()
        .map(|(date, spend)| DailySpend { date, spend })
        .collect();
    snapshot
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

fn parse_amount(raw: &serde_json::Value) -> Option<Decimal> {
    match raw {
        serde_json::Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        serde_json::Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}
