use crate::error::ConfigError;
use std::fmt;
use std::sync::RwLock;

pub const ADS_ACCESS_TOKEN: &str = "ADS_ACCESS_TOKEN";
pub const EVENTS_API_KEY: &str = "EVENTS_API_KEY";
pub const EXPENSES_API_TOKEN: &str = "EXPENSES_API_TOKEN";
pub const DASHBOARD_API_KEY: &str = "DASHBOARD_API_KEY";
pub const SECONDARY_SESSION_KEY: &str = "SECONDARY_SESSION_KEY";

/// A credential that never prints its value.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// API credentials read from the process environment.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub ads_access_token: Secret,
    pub events_api_key: Secret,
    pub expenses_api_token: Secret,
    pub dashboard_api_key: Secret,
    /// Optional here because it can also be supplied on the command line.
    pub secondary_session_key: Option<Secret>,
}

impl Secrets {
    /// Reads every credential from the environment, reporting all missing ones at once.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut required = |name: &str| match lookup(name).filter(|v| !v.trim().is_empty()) {
            Some(value) => Secret::new(value),
            None => {
                missing.push(name.to_string());
                Secret::new(String::new())
            }
        };

        let ads_access_token = required(ADS_ACCESS_TOKEN);
        let events_api_key = required(EVENTS_API_KEY);
        let expenses_api_token = required(EXPENSES_API_TOKEN);
        let dashboard_api_key = required(DASHBOARD_API_KEY);

        if !missing.is_empty() {
            return Err(ConfigError::MissingEnv(missing));
        }

        Ok(Self {
            ads_access_token,
            events_api_key,
            expenses_api_token,
            dashboard_api_key,
            secondary_session_key: lookup(SECONDARY_SESSION_KEY)
                .filter(|v| !v.trim().is_empty())
                .map(Secret::new),
        })
    }
}

/// Holds the secondary marketplace session key, which expires and has to be
/// replaced while the process is running.
///
/// Readers take a snapshot with [`CredentialStore::current`]; the only way to
/// change the key is [`CredentialStore::rotate`].
#[derive(Debug, Default)]
pub struct CredentialStore {
    session_key: RwLock<Option<Secret>>,
}

impl CredentialStore {
    pub fn new(initial: Option<Secret>) -> Self {
        Self {
            session_key: RwLock::new(initial),
        }
    }

    pub fn current(&self) -> Option<Secret> {
        self.session_key
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replaces the session key. Blank keys are rejected and leave the old key in place.
    pub fn rotate(&self, new_key: impl Into<String>) -> Result<(), ConfigError> {
        let new_key = new_key.into();
        let trimmed = new_key.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::ValidationError(
                "session key must not be empty".to_string(),
            ));
        }

        let mut guard = self
            .session_key
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(Secret::new(trimmed));
        tracing::info!("Secondary marketplace session key rotated");
        Ok(())
    }
}
