use serde::{Deserialize, Serialize};

/// parking spaces per zone in this deployment
pub const SPOTS_PER_ZONE: usize = 4;

/// occupancy classification of one ultrasonic sensor
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorStatus {
    Normal,
    Occupied,
    Error,
}

impl SensorStatus {
    /// a space is occupied when something sits closer than the threshold
    pub fn classify(distance: f64, threshold: f64) -> Self {
        if distance < threshold {
            SensorStatus::Occupied
        } else {
            SensorStatus::Normal
        }
    }
}

/// one ultrasonic distance sample
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// stable identity of the physical sensor
    pub id: u32,
    /// display label (e.g. "US-01")
    pub name: String,
    pub location: String,
    pub zone: String,
    /// distance in centimeters
    pub distance: f64,
    /// below this distance the space counts as occupied
    pub threshold: f64,
    pub status: SensorStatus,
    /// battery percentage, display only
    pub battery: u8,
}

impl SensorReading {
    /// same sensor with a fresh live distance and its derived status
    pub fn with_live_distance(&self, distance: f64) -> Self {
        Self {
            distance,
            status: SensorStatus::classify(distance, self.threshold),
            ..self.clone()
        }
    }
}

/// one spot record from the parking backend
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParkingSpot {
    pub id: i64,
    pub occupied: bool,
    #[serde(default)]
    pub vehicle_id: Option<serde_json::Value>,
    #[serde(default)]
    pub vehicle_color: Option<String>,
}

/// aggregated occupancy for one zone
///
/// `occupied` is always the count of `true` entries in `spaces`; the only
/// way to build one is [`ParkingZoneState::from_spaces`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParkingZoneState {
    pub total: usize,
    pub occupied: usize,
    pub spaces: Vec<bool>,
}

impl ParkingZoneState {
    pub fn from_spaces(spaces: Vec<bool>) -> Self {
        Self {
            total: spaces.len(),
            occupied: spaces.iter().filter(|s| **s).count(),
            spaces,
        }
    }

    pub fn empty(total: usize) -> Self {
        Self::from_spaces(vec![false; total])
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParkingZones {
    pub zone_a: ParkingZoneState,
    pub zone_b: ParkingZoneState,
}

impl ParkingZones {
    /// map spot records onto the two zones
    ///
    /// ids 1..=4 land in zone A at `id - 1`, ids 5..=8 in zone B at `id - 5`,
    /// anything else is ignored. occupancy counts are recomputed afterwards.
    pub fn from_spots(spots: &[ParkingSpot]) -> Self {
        let mut a = vec![false; SPOTS_PER_ZONE];
        let mut b = vec![false; SPOTS_PER_ZONE];
        let per_zone = SPOTS_PER_ZONE as i64;

        for spot in spots {
            match spot.id {
                id if (1..=per_zone).contains(&id) => a[(id - 1) as usize] = spot.occupied,
                id if (per_zone + 1..=2 * per_zone).contains(&id) => {
                    b[(id - per_zone - 1) as usize] = spot.occupied
                }
                _ => {}
            }
        }

        Self {
            zone_a: ParkingZoneState::from_spaces(a),
            zone_b: ParkingZoneState::from_spaces(b),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleCounts {
    #[serde(default)]
    pub blue: u32,
    #[serde(default)]
    pub yellow: u32,
    #[serde(default)]
    pub white: u32,
}

/// telemetry snapshot from the parking backend, used to enrich the view
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParkingSystemStatus {
    pub status: String,
    pub resolution: String,
    pub fps: f64,
    pub frame_count: u64,
    pub total_vehicles: u32,
    pub vehicle_counts: VehicleCounts,
    pub active_warnings: u32,
    #[serde(default)]
    pub parking_status: Vec<ParkingSpot>,
    #[serde(default)]
    pub warnings: Vec<serde_json::Value>,
    #[serde(default)]
    pub current_time: Option<String>,
    #[serde(default)]
    pub gpio_available: bool,
}

/// one distance-drop notification
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Alert {
    pub id: String,
    /// creation time, unix epoch milliseconds
    pub timestamp_ms: u64,
    pub sensor_id: u32,
    pub sensor_name: String,
    pub previous_distance: f64,
    pub current_distance: f64,
    /// previous - current, always positive
    pub change: f64,
    pub message: String,
}

/// sensor view model
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SensorSnapshot {
    pub sensors: Vec<SensorReading>,
    pub is_live: bool,
}

/// parking view model
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ParkingSnapshot {
    pub zones: ParkingZones,
    pub is_live: bool,
    pub system_status: Option<ParkingSystemStatus>,
}

// ==============================================================================
// static baseline
// ==============================================================================
// what the dashboard shows when the backends are down. live sensor data is
// merged on top of this, positionally.

pub fn baseline_sensors() -> Vec<SensorReading> {
    let sensor = |id: u32, location: &str, zone: &str, distance: f64, status, battery| SensorReading {
        id,
        name: format!("US-{:02}", id),
        location: location.to_string(),
        zone: zone.to_string(),
        distance,
        threshold: 50.0,
        status,
        battery,
    };

    vec![
        sensor(1, "Zone A entrance", "Zone A", 45.0, SensorStatus::Normal, 92),
        sensor(2, "Zone A interior", "Zone A", 12.0, SensorStatus::Occupied, 87),
        sensor(3, "Zone B entrance", "Zone B", 78.0, SensorStatus::Normal, 76),
        sensor(4, "Zone B interior", "Zone B", 8.0, SensorStatus::Occupied, 65),
    ]
}

pub fn baseline_zones() -> ParkingZones {
    ParkingZones {
        zone_a: ParkingZoneState::from_spaces(vec![true, true, true, false]),
        zone_b: ParkingZoneState::from_spaces(vec![true, false, true, false]),
    }
}

pub fn baseline_parking() -> ParkingSnapshot {
    ParkingSnapshot {
        zones: baseline_zones(),
        is_live: false,
        system_status: None,
    }
}

/// current time in unix epoch milliseconds
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
