//! ==============================================================================
//! acquisition.rs - live data with static fallback
//! ==============================================================================
//!
//! purpose:
//!     turns whatever the backends answer into a view model that always
//!     exists. two policies live here and are kept apart on purpose:
//!
//! ```text
//!     - sensors: every endpoint stands alone. any one success makes the
//!       snapshot live; sensors without data keep their baseline values.
//!     - parking: status and spot list belong together. both must succeed
//!       or the whole snapshot is the baseline.
//! ```
//!
//! relationships:
//!     - uses: backend.rs (TelemetryBackend)
//!     - used by: state.rs (poller), monitor.rs (sensor feed), server.rs
//!
//! ==============================================================================

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::backend::{BellAction, GateAction, LedAction, TelemetryBackend};
use crate::domain::{
    baseline_parking, baseline_sensors, ParkingSnapshot, ParkingSpot, ParkingSystemStatus,
    ParkingZones, SensorReading, SensorSnapshot,
};
use crate::error::{FetchError, Unavailable};

/// merge live distances onto the baseline, positionally
///
/// `live[i]` belongs to `baseline[i]`; extra entries on either side are
/// left alone. fails when no baseline slot received a live value.
pub fn merge_sensor_readings(
    baseline: &[SensorReading],
    live: &[Option<f64>],
) -> Result<Vec<SensorReading>, Unavailable> {
    if !live.iter().take(baseline.len()).any(Option::is_some) {
        return Err(Unavailable::NoSensorData(live.len()));
    }

    Ok(baseline
        .iter()
        .enumerate()
        .map(|(i, sensor)| match live.get(i).copied().flatten() {
            Some(distance) => sensor.with_live_distance(distance),
            None => sensor.clone(),
        })
        .collect())
}

/// build zones from a complete backend answer
pub fn assemble_parking(
    status: Result<ParkingSystemStatus, FetchError>,
    spots: Result<Vec<ParkingSpot>, FetchError>,
) -> Result<(ParkingZones, ParkingSystemStatus), Unavailable> {
    match (status, spots) {
        (Ok(status), Ok(spots)) => Ok((ParkingZones::from_spots(&spots), status)),
        (Err(e), _) | (_, Err(e)) => Err(Unavailable::Parking(e.to_string())),
    }
}

#[derive(Clone)]
pub struct AcquisitionService {
    backend: Arc<dyn TelemetryBackend>,
    baseline: Vec<SensorReading>,
    sensor_count: usize,
}

impl AcquisitionService {
    pub fn new(backend: Arc<dyn TelemetryBackend>, sensor_count: usize) -> Self {
        Self::with_baseline(backend, sensor_count, baseline_sensors())
    }

    pub fn with_baseline(
        backend: Arc<dyn TelemetryBackend>,
        sensor_count: usize,
        baseline: Vec<SensorReading>,
    ) -> Self {
        Self { backend, baseline, sensor_count }
    }

    /// query every sensor endpoint concurrently and merge
    pub async fn try_live_sensors(&self) -> Result<Vec<SensorReading>, Unavailable> {
        let requests = (0..self.sensor_count).map(|index| {
            let backend = self.backend.clone();
            async move {
                match backend.sensor_distance(index).await {
                    Ok(distance) => Some(distance),
                    Err(e) => {
                        warn!("sensor {} unavailable: {}", index, e);
                        None
                    }
                }
            }
        });
        // join_all yields in request order, not arrival order
        let live: Vec<Option<f64>> = join_all(requests).await;
        debug!("sensor poll: {}/{} live", live.iter().flatten().count(), live.len());

        merge_sensor_readings(&self.baseline, &live)
    }

    pub async fn fetch_sensor_readings(&self) -> SensorSnapshot {
        match self.try_live_sensors().await {
            Ok(sensors) => SensorSnapshot { sensors, is_live: true },
            Err(e) => {
                warn!("using baseline sensor data: {}", e);
                SensorSnapshot { sensors: self.baseline.clone(), is_live: false }
            }
        }
    }

    /// status and spots together, or nothing
    pub async fn try_live_parking(&self) -> Result<(ParkingZones, ParkingSystemStatus), Unavailable> {
        let (status, spots) = tokio::join!(self.backend.parking_status(), self.backend.parking_spots());
        assemble_parking(status, spots)
    }

    pub async fn fetch_parking_snapshot(&self) -> ParkingSnapshot {
        match self.try_live_parking().await {
            Ok((zones, status)) => ParkingSnapshot {
                zones,
                is_live: true,
                system_status: Some(status),
            },
            Err(e) => {
                warn!("using baseline parking data: {}", e);
                baseline_parking()
            }
        }
    }

    /// io backend status, `None` when unreachable
    pub async fn fetch_io_status(&self) -> Option<serde_json::Value> {
        match self.backend.io_status().await {
            Ok(status) => Some(status),
            Err(e) => {
                warn!("io status unavailable: {}", e);
                None
            }
        }
    }

    pub async fn control_led(&self, index: usize, action: LedAction) -> bool {
        report("led", self.backend.set_led(index, action).await)
    }

    pub async fn control_gate(&self, action: GateAction) -> bool {
        report("gate", self.backend.gate(action).await)
    }

    pub async fn control_bell(&self, action: BellAction) -> bool {
        report("bell", self.backend.bell(action).await)
    }
}

fn report(what: &str, result: Result<(), FetchError>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("{} control failed: {}", what, e);
            false
        }
    }
}

// ==============================================================================
// in-memory backend for tests
// ==============================================================================
