//! ==============================================================================
//! backend.rs - access to the sensor and parking backends
//! ==============================================================================
//!
//! purpose:
//!     one trait for everything the hub asks of the outside world, and the
//!     reqwest implementation that talks to the two local http services.
//!     tests swap in an in-memory fake.
//!
//! backends:
//!     - io backend (port 8000): `/sensor/{i}/distance`, `/status`,
//!       `/led/{i}/{on|off}`, `/gate/{open|close}`, `/bell/{ring|stop}`
//!     - parking backend (port 5000): `/status`, `/api/parking_spots`
//!
//! every call is a single GET bounded by the configured timeout. no retries.
//!
//! ==============================================================================

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::config::BackendConfig;
use crate::domain::{ParkingSpot, ParkingSystemStatus};
use crate::error::FetchError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LedAction {
    On,
    Off,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateAction {
    Open,
    Close,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BellAction {
    Ring,
    Stop,
}

macro_rules! path_action {
    ($ty:ident { $($variant:ident => $word:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $word),+
                }
            }

            pub fn parse(word: &str) -> Option<Self> {
                match word {
                    $($word => Some($ty::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

path_action!(LedAction { On => "on", Off => "off" });
path_action!(GateAction { Open => "open", Close => "close" });
path_action!(BellAction { Ring => "ring", Stop => "stop" });

#[async_trait]
pub trait TelemetryBackend: Send + Sync {
    /// latest distance (cm) reported by sensor `index` (0-based)
    async fn sensor_distance(&self, index: usize) -> Result<f64, FetchError>;
    /// io backend status, passed through untouched
    async fn io_status(&self) -> Result<serde_json::Value, FetchError>;
    async fn parking_status(&self) -> Result<ParkingSystemStatus, FetchError>;
    async fn parking_spots(&self) -> Result<Vec<ParkingSpot>, FetchError>;
    async fn set_led(&self, index: usize, action: LedAction) -> Result<(), FetchError>;
    async fn gate(&self, action: GateAction) -> Result<(), FetchError>;
    async fn bell(&self, action: BellAction) -> Result<(), FetchError>;
}

#[derive(Deserialize)]
struct DistancePayload {
    distance: f64,
}

/// reqwest client for both backends
#[derive(Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    sensor_base: String,
    parking_base: String,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| FetchError::Transport {
                url: config.sensor_api_url.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            sensor_base: config.sensor_api_url.trim_end_matches('/').to_string(),
            parking_base: config.parking_api_url.trim_end_matches('/').to_string(),
            timeout: config.request_timeout(),
        })
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let response = self
            .client
            .get(url)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status: status.as_u16() });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let response = self.send(url).await?;
        // read the body first so a slow body still counts as a timeout
        let body = response.bytes().await.map_err(|e| FetchError::from_reqwest(url, e))?;
        serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// control endpoints only report success through the status code
    async fn get_ack(&self, url: &str) -> Result<(), FetchError> {
        self.send(url).await.map(|_| ())
    }
}

#[async_trait]
impl TelemetryBackend for HttpBackend {
    async fn sensor_distance(&self, index: usize) -> Result<f64, FetchError> {
        let url = format!("{}/sensor/{}/distance", self.sensor_base, index);
        let payload: DistancePayload = self.get_json(&url).await?;
        if !payload.distance.is_finite() || payload.distance < 0.0 {
            return Err(FetchError::Decode {
                url,
                reason: format!("distance out of range: {}", payload.distance),
            });
        }
        Ok(payload.distance)
    }

    async fn io_status(&self) -> Result<serde_json::Value, FetchError> {
        self.get_json(&format!("{}/status", self.sensor_base)).await
    }

    async fn parking_status(&self) -> Result<ParkingSystemStatus, FetchError> {
        self.get_json(&format!("{}/status", self.parking_base)).await
    }

    async fn parking_spots(&self) -> Result<Vec<ParkingSpot>, FetchError> {
        self.get_json(&format!("{}/api/parking_spots", self.parking_base)).await
    }

    async fn set_led(&self, index: usize, action: LedAction) -> Result<(), FetchError> {
        self.get_ack(&format!("{}/led/{}/{}", self.sensor_base, index, action.as_str())).await
    }

    async fn gate(&self, action: GateAction) -> Result<(), FetchError> {
        self.get_ack(&format!("{}/gate/{}", self.sensor_base, action.as_str())).await
    }

    async fn bell(&self, action: BellAction) -> Result<(), FetchError> {
        self.get_ack(&format!("{}/bell/{}", self.sensor_base, action.as_str())).await
    }
}
