use thiserror::Error;

/// Rejected before any request is issued
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("minimum price {min} is greater than maximum price {max}")]
    InvalidRange { min: u64, max: u64 },
}

/// Failure of a List API call
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    /// The response body carried an `error` field
    #[error("api error: {message}")]
    Api { message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

/// Failure populating a reference list. Shared by every coalesced caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceLoadError {
    #[error("failed to load {kind} for locale {locale}: {message}")]
    Fetch {
        kind: String,
        locale: String,
        message: String,
    },

    /// The locale changed while the page was in flight
    #[error("{kind} load superseded by locale change")]
    Invalidated { kind: String },

    #[error("{kind} has not been loaded yet")]
    NotLoaded { kind: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}
