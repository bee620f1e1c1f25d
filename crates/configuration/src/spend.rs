use crate::error::ConfigError;
use crate::settings::SpendSettings;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Spend figures recorded by hand outside of any upstream platform.
///
/// Loaded once per run and handed to the calculator as plain inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpendConstants {
    /// Sum of all recorded influencer payments, in major units.
    pub influencer_spend: Decimal,
    /// Ad spend that predates the ads platform's reporting window, in major units.
    pub historical_spend: Decimal,
}

impl SpendConstants {
    pub fn new(influencer_spend: Decimal, historical_spend: Decimal) -> Self {
        Self {
            influencer_spend,
            historical_spend,
        }
    }
}

impl SpendSettings {
    /// Parses the recorded figures. A missing figure counts as zero.
    pub fn constants(&self) -> Result<SpendConstants, ConfigError> {
        let influencer_spend = match self.influencer.as_deref() {
            Some(raw) => parse_spend_list("spend.influencer", raw)?,
            None => {
                tracing::warn!("No influencer spend recorded, using 0");
                Decimal::ZERO
            }
        };
        let historical_spend = match self.historical.as_deref() {
            Some(raw) => parse_spend_figure("spend.historical", raw)?,
            None => {
                tracing::warn!("No historical spend recorded, using 0");
                Decimal::ZERO
            }
        };

        tracing::info!(%influencer_spend, %historical_spend, "Loaded recorded spend figures");
        Ok(SpendConstants::new(influencer_spend, historical_spend))
    }
}

/// Sums a comma-separated list of figures. Empty entries are skipped.
fn parse_spend_list(field: &str, raw: &str) -> Result<Decimal, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_spend_figure(field, part))
        .sum()
}

fn parse_spend_figure(field: &str, raw: &str) -> Result<Decimal, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }
    let value = Decimal::from_str(trimmed).map_err(|e| {
        ConfigError::ValidationError(format!("{field}: '{trimmed}' is not a number ({e})"))
    })?;
    if value.is_sign_negative() {
        return Err(ConfigError::ValidationError(format!(
            "{field}: '{trimmed}' must not be negative"
        )));
    }
    Ok(value)
}
