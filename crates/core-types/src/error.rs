use crate::enums::SourceKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),

    #[error("Calculation error: {0}")]
    Calculation(String),

    #[error("No snapshot was supplied for source '{0}'")]
    MissingSource(SourceKind),

    #[error("More than one snapshot was supplied for source '{0}'")]
    DuplicateSource(SourceKind),
}
