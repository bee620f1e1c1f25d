use crate::error::ConfigError;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::path::PathBuf;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub business: Business,
    #[serde(default)]
    pub pricing: Pricing,
    #[serde(default)]
    pub spend: SpendSettings,
    pub sources: Sources,
    pub dashboard: DashboardSettings,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Checks the cross-field rules that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pricing.validate()?;
        self.retry.validate()?;
        if self.sources.expenses.window_days == 0 {
            return Err(ConfigError::ValidationError(
                "sources.expenses.window_days must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Business {
    /// Timezone in which metrics records are stamped.
    pub timezone: Tz,
}

impl Default for Business {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::New_York,
        }
    }
}

/// Fee and price constants used by the calculator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Pricing {
    /// Percentage fee charged by the card processor. 0.029 corresponds to 2.9%.
    pub processing_fee_rate: Decimal,
    /// Flat processor fee charged per guest, in major units.
    pub flat_fee_per_guest: Decimal,
    /// Fixed price per secondary-marketplace ticket, in major units.
    pub secondary_ticket_price: Decimal,
    /// Share of secondary revenue paid out as influencer fees.
    pub secondary_fee_share: Decimal,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            processing_fee_rate: dec!(0.029),
            flat_fee_per_guest: dec!(0.30),
            secondary_ticket_price: dec!(65),
            secondary_fee_share: dec!(0.23),
        }
    }
}

impl Pricing {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("pricing.processing_fee_rate", self.processing_fee_rate),
            ("pricing.flat_fee_per_guest", self.flat_fee_per_guest),
            ("pricing.secondary_ticket_price", self.secondary_ticket_price),
        ];
        for (name, value) in non_negative {
            if value.is_sign_negative() {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must not be negative (got {value})"
                )));
            }
        }
        if self.processing_fee_rate >= Decimal::ONE {
            return Err(ConfigError::ValidationError(
                "pricing.processing_fee_rate must be below 1".to_string(),
            ));
        }
        if self.secondary_fee_share < Decimal::ZERO || self.secondary_fee_share > Decimal::ONE {
            return Err(ConfigError::ValidationError(
                "pricing.secondary_fee_share must be between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Manually recorded spend figures, kept as raw strings until parsed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpendSettings {
    /// Comma-separated list of influencer payments, e.g. "250, 1200.50, 75".
    pub influencer: Option<String>,
    /// A single historical ad-spend figure.
    pub historical: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sources {
    pub ads: AdsSource,
    #[serde(default)]
    pub events: EventsSource,
    pub secondary: SecondarySource,
    #[serde(default)]
    pub expenses: ExpensesSource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdsSource {
    #[serde(default = "default_ads_base_url")]
    pub base_url: String,
    #[serde(default = "default_ads_api_version")]
    pub api_version: String,
    pub ad_account_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventsSource {
    pub base_url: String,
    /// Events that are always processed.
    pub track_events: Vec<String>,
    /// Events that are never processed, e.g. free community meetups.
    pub ignore_events: Vec<String>,
}

impl Default for EventsSource {
    fn default() -> Self {
        Self {
            base_url: "https://api.lu.ma/public/v1".to_string(),
            track_events: Vec::new(),
            ignore_events: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecondarySource {
    /// Full URL of the partner sales summary endpoint.
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExpensesSource {
    pub base_url: String,
    /// Length of the trailing window summed into operational expenses.
    pub window_days: u32,
}

impl Default for ExpensesSource {
    fn default() -> Self {
        Self {
            base_url: "https://gateway.prod.bill.com/connect/v3".to_string(),
            window_days: 90,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardSettings {
    /// Base URL of the dashboard backend, without a trailing slash.
    pub api_url: String,
}

/// Retry policy shared by every outbound HTTP call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub min_backoff_secs: u64,
    pub max_backoff_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_backoff_secs: 4,
            max_backoff_secs: 10,
        }
    }
}

impl RetrySettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.min_backoff_secs > self.max_backoff_secs {
            return Err(ConfigError::ValidationError(
                "retry.min_backoff_secs must not exceed retry.max_backoff_secs".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file_prefix: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("logs"),
            file_prefix: "pulse.log".to_string(),
        }
    }
}

fn default_ads_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_ads_api_version() -> String {
    "v19.0".to_string()
}
