//! ==============================================================================
//! error.rs - failure kinds at the acquisition boundary
//! ==============================================================================
//!
//! every kind here is recoverable. a `FetchError` removes one endpoint from
//! the live set for one cycle; an `Unavailable` swaps the whole view model
//! for the static baseline. nothing in this crate turns them into a crash.
//!
//! ==============================================================================

/// why a single backend request produced no data
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("unexpected payload from {url}: {reason}")]
    Decode { url: String, reason: String },
}

impl FetchError {
    /// classify a reqwest error for the given url
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            FetchError::Timeout { url }
        } else if let Some(status) = err.status() {
            FetchError::Status { url, status: status.as_u16() }
        } else if err.is_decode() {
            FetchError::Decode { url, reason: err.to_string() }
        } else {
            FetchError::Transport { url, reason: err.to_string() }
        }
    }
}

/// no live data could be assembled for a view model
#[derive(Debug, thiserror::Error)]
pub enum Unavailable {
    #[error("all {0} sensor endpoints failed")]
    NoSensorData(usize),

    #[error("parking backend incomplete: {0}")]
    Parking(String),
}

/// a sensor feed could not deliver a snapshot at all
#[derive(Debug, thiserror::Error)]
#[error("sensor feed failed: {0}")]
pub struct FeedError(pub String);
