use chrono::NaiveDate;
use core_types::CoreError;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalculatorError {
    #[error("Input snapshot rejected: {0}")]
    Precondition(#[from] CoreError),

    #[error("Calculated metrics failed validation: {0}")]
    Validation(#[from] ValidationFailure),
}

/// The single invariant a metrics record violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationFailure {
    #[error("{metric} is negative ({value})")]
    NegativeTotal { metric: &'static str, value: Decimal },

    #[error("revenue spent on ads ({0}) is outside [0, 100]")]
    RevenueSpentOnAdsOutOfRange(Decimal),

    #[error("negative cumulative revenue on {0}")]
    NegativeDailyRevenue(NaiveDate),

    #[error("negative guest count on {0}")]
    NegativeDailyGuests(NaiveDate),

    #[error("{field} total ({summary}) differs from the daily breakdown ({detail})")]
    SummaryMismatch {
        field: &'static str,
        summary: Decimal,
        detail: Decimal,
    },
}
