use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod credentials;
pub mod error;
pub mod logging;
pub mod settings;
pub mod spend;

// Re-export the core types to provide a clean public API.
pub use credentials::{CredentialStore, Secret, Secrets};
pub use settings::{
    AdsSource, Business, DashboardSettings, EventsSource, ExpensesSource, LoggingSettings,
    Pricing, RetrySettings, SecondarySource, Settings, Sources, SpendSettings,
};
pub use spend::SpendConstants;

/// Loads the application configuration from `config.toml`.
///
/// Values can be overridden with `PULSE__`-prefixed environment variables, using
/// `__` between nested keys (e.g. `PULSE__SPEND__HISTORICAL=1500`).
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from(Path::new("config.toml"))
}

/// Same as [`load_config`], reading the file at `path`.
pub fn load_config_from(path: &Path) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(
            config::Environment::with_prefix("PULSE")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    // Attempt to deserialize the entire configuration into our `Settings` struct
    let settings = builder.try_deserialize::<Settings>()?;
    settings.validate()?;

    Ok(settings)
}

/// Parses settings from an in-memory TOML document, without environment overrides.
pub fn settings_from_toml(toml: &str) -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?
        .try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const MINIMAL: &str = r#"
[sources.ads]
ad_account_id = "1770605100340015"

[sources.secondary]
url = "https://partners.example.com/v2/1045/"

[dashboard]
api_url = "https://dashboard.example.com"
"#;

    #[test]
    fn minimal_config_uses_defaults() {
        let settings = settings_from_toml(MINIMAL).unwrap();
        assert_eq!(settings.business.timezone, chrono_tz::America::New_York);
        assert_eq!(settings.pricing, Pricing::default());
        assert_eq!(settings.pricing.processing_fee_rate, dec!(0.029));
        assert_eq!(settings.retry, RetrySettings::default());
        assert_eq!(settings.sources.expenses.window_days, 90);
        assert_eq!(settings.sources.ads.api_version, "v19.0");
        assert_eq!(settings.spend.constants().unwrap(), SpendConstants::default());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let toml = format!(
            r#"{MINIMAL}
[business]
timezone = "Europe/London"

[pricing]
secondary_ticket_price = 70
secondary_fee_share = 0.2

[spend]
influencer = "100, 50.25"
historical = 1500

[retry]
max_attempts = 5
"#
        );
        let settings = settings_from_toml(&toml).unwrap();
        assert_eq!(settings.business.timezone, chrono_tz::Europe::London);
        assert_eq!(settings.pricing.secondary_ticket_price, dec!(70));
        assert_eq!(settings.pricing.secondary_fee_share, dec!(0.2));
        assert_eq!(settings.pricing.flat_fee_per_guest, dec!(0.30));
        assert_eq!(settings.retry.max_attempts, 5);

        let constants = settings.spend.constants().unwrap();
        assert_eq!(constants.influencer_spend, dec!(150.25));
        assert_eq!(constants.historical_spend, dec!(1500));
    }

    #[test]
    fn invalid_fee_share_is_rejected() {
        let toml = format!("{MINIMAL}\n[pricing]\nsecondary_fee_share = 1.5\n");
        assert!(matches!(
            settings_from_toml(&toml),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn inverted_backoff_is_rejected() {
        let toml = format!("{MINIMAL}\n[retry]\nmin_backoff_secs = 30\nmax_backoff_secs = 10\n");
        assert!(settings_from_toml(&toml).is_err());
    }

    #[test]
    fn missing_dashboard_section_fails_to_load() {
        let toml = r#"
[sources.ads]
ad_account_id = "1"

[sources.secondary]
url = "https://partners.example.com"
"#;
        assert!(matches!(settings_from_toml(toml), Err(ConfigError::LoadError(_))));
    }
}
