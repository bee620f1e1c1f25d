use crate::error::CollectorError;
use crate::responses::{GraphPage, RawAd, RawInsight};
use crate::retry::RetryPolicy;
use crate::Collector;
use async_trait::async_trait;
use configuration::{AdsSource, Secret};
use core_types::{AdMetrics, AdRecord, AdSnapshot, AdStatus, SourceKind, SourceSnapshot};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

const AD_FIELDS: &str = "id,name,status,effective_status,configured_status,campaign{name},adset{name}";
const INSIGHT_FIELDS: &str = "ad_id,ad_name,spend,impressions,clicks,ctr,cpc,reach,frequency";
const PAGE_LIMIT: &str = "1000";

/// Collects lifetime spend and delivery figures from the ads platform.
pub struct AdsCollector {
    client: reqwest::Client,
    base_url: String,
    account_id: String,
    access_token: Secret,
    retry: RetryPolicy,
}

impl AdsCollector {
    pub fn new(
        source: &AdsSource,
        access_token: Secret,
        retry: RetryPolicy,
    ) -> Result<Self, CollectorError> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            base_url: format!(
                "{}/{}",
                source.base_url.trim_end_matches('/'),
                source.api_version
            ),
            account_id: source.ad_account_id.clone(),
            access_token,
            retry,
        })
    }

    async fn list_ads(&self) -> Result<Vec<RawAd>, CollectorError> {
        let url = format!("{}/act_{}/ads", self.base_url, self.account_id);
        let page: GraphPage<RawAd> = self
            .retry
            .get_json(SourceKind::Ads, || {
                self.client.get(&url).query(&[
                    ("fields", AD_FIELDS),
                    ("limit", PAGE_LIMIT),
                    ("access_token", self.access_token.expose()),
                ])
            })
            .await?;
        Ok(page.data)
    }

    async fn fetch_insights(&self) -> Result<Vec<RawInsight>, CollectorError> {
        let url = format!("{}/act_{}/insights", self.base_url, self.account_id);
        let page: GraphPage<RawInsight> = self
            .retry
            .get_json(SourceKind::Ads, || {
                self.client.get(&url).query(&[
                    ("fields", INSIGHT_FIELDS),
                    ("date_preset", "maximum"),
                    ("level", "ad"),
                    ("access_token", self.access_token.expose()),
                ])
            })
            .await?;
        Ok(page.data)
    }
}

#[async_trait]
impl Collector for AdsCollector {
    fn source(&self) -> SourceKind {
        SourceKind::Ads
    }

    async fn collect(&self) -> Result<SourceSnapshot, CollectorError> {
        let ads = self.list_ads().await?;
        let insights = self.fetch_insights().await?;
        let snapshot = build_ad_snapshot(ads, insights)?;
        snapshot.validate()?;

        tracing::info!(
            total_spend = %snapshot.total_spend,
            total_ads = snapshot.total_ads_count,
            active_ads = snapshot.active_ads_count,
            "Collected ads platform data"
        );
        Ok(SourceSnapshot::Ads(snapshot))
    }
}

/// Joins the ad list with its insight rows.
///
/// Insight rows for ads that are not listed are ignored. An ad with no insight row
/// carries no metrics and contributes nothing to the totals.
pub fn build_ad_snapshot(
    ads: Vec<RawAd>,
    insights: Vec<RawInsight>,
) -> Result<AdSnapshot, CollectorError> {
    let mut metrics_by_ad: HashMap<String, AdMetrics> = HashMap::new();
    for insight in insights {
        if !ads.iter().any(|ad| ad.id == insight.ad_id) || metrics_by_ad.contains_key(&insight.ad_id) {
            continue;
        }
        let metrics = parse_metrics(&insight)?;
        tracing::debug!(
            ad = insight.ad_name.as_deref().unwrap_or(&insight.ad_id),
            spend = %metrics.spend,
            "Ad lifetime spend"
        );
        metrics_by_ad.insert(insight.ad_id, metrics);
    }

    let mut status_counts: HashMap<String, usize> = HashMap::new();
    let records: Vec<AdRecord> = ads
        .into_iter()
        .map(|ad| {
            let status = AdStatus::from(ad.effective_status.unwrap_or_else(|| "UNKNOWN".to_string()));
            *status_counts.entry(String::from(status.clone())).or_default() += 1;
            AdRecord {
                metrics: metrics_by_ad.get(&ad.id).cloned(),
                campaign: ad
                    .campaign
                    .and_then(|c| c.name)
                    .unwrap_or_else(|| "N/A".to_string()),
                id: ad.id,
                name: ad.name,
                status,
            }
        })
        .collect();
    tracing::info!(?status_counts, "Ad status breakdown");

    let measured = metrics_by_ad.values();
    let (total_spend, total_impressions, total_clicks) = measured.fold(
        (Decimal::ZERO, 0u64, 0u64),
        |(spend, impressions, clicks), m| (spend + m.spend, impressions + m.impressions, clicks + m.clicks),
    );

    Ok(AdSnapshot {
        total_spend,
        total_ads_count: records.len(),
        active_ads_count: records.iter().filter(|ad| ad.status.is_active()).count(),
        total_impressions,
        total_clicks,
        ads: records,
    })
}

fn parse_metrics(insight: &RawInsight) -> Result<AdMetrics, CollectorError> {
    Ok(AdMetrics {
        spend: parse_decimal("spend", insight.spend.as_deref())?.unwrap_or(Decimal::ZERO),
        impressions: parse_count("impressions", insight.impressions.as_deref())?.unwrap_or(0),
        clicks: parse_count("clicks", insight.clicks.as_deref())?.unwrap_or(0),
        ctr: parse_decimal("ctr", insight.ctr.as_deref())?,
        cpc: parse_decimal("cpc", insight.cpc.as_deref())?,
        reach: parse_count("reach", insight.reach.as_deref())?,
        frequency: parse_decimal("frequency", insight.frequency.as_deref())?,
    })
}

fn parse_decimal(field: &str, raw: Option<&str>) -> Result<Option<Decimal>, CollectorError> {
    raw.map(|value| {
        Decimal::from_str(value)
            .map_err(|e| CollectorError::invalid(SourceKind::Ads, format!("{field} '{value}': {e}")))
    })
    .transpose()
}

fn parse_count(field: &str, raw: Option<&str>) -> Result<Option<u64>, CollectorError> {
    raw.map(|value| {
        value
            .parse::<u64>()
            .map_err(|e| CollectorError::invalid(SourceKind::Ads, format!("{field} '{value}': {e}")))
    })
    .transpose()
}
