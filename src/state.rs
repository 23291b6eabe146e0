//! ==============================================================================
//! state.rs - shared view model and the page refresh poller
//! ==============================================================================
//!
//! the poller writes, the web api reads. every published snapshot carries the
//! number of the poll cycle that produced it, and a snapshot from an older
//! cycle never replaces one from a newer cycle. a slow cycle that settles late
//! therefore cannot bring stale data back.
//!
//! ==============================================================================

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::acquisition::AcquisitionService;
use crate::domain::{baseline_parking, baseline_sensors, now_ms, ParkingSnapshot, SensorSnapshot};

#[derive(Clone, Debug, Serialize)]
pub struct DashboardState {
    pub sensors: SensorSnapshot,
    pub parking: ParkingSnapshot,
    /// unix timestamp (ms) of the last applied update
    pub last_update: u64,
    #[serde(skip)]
    sensors_cycle: u64,
    #[serde(skip)]
    parking_cycle: u64,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            sensors: SensorSnapshot { sensors: baseline_sensors(), is_live: false },
            parking: baseline_parking(),
            last_update: 0,
            sensors_cycle: 0,
            parking_cycle: 0,
        }
    }
}

impl DashboardState {
    /// apply a sensor snapshot unless a newer cycle already landed
    pub fn publish_sensors(&mut self, cycle: u64, snapshot: SensorSnapshot) -> bool {
        if cycle <= self.sensors_cycle {
            debug!("dropping stale sensor snapshot from cycle {}", cycle);
            return false;
        }
        self.sensors_cycle = cycle;
        self.sensors = snapshot;
        self.last_update = now_ms();
        true
    }

    /// apply a parking snapshot unless a newer cycle already landed
    pub fn publish_parking(&mut self, cycle: u64, snapshot: ParkingSnapshot) -> bool {
        if cycle <= self.parking_cycle {
            debug!("dropping stale parking snapshot from cycle {}", cycle);
            return false;
        }
        self.parking_cycle = cycle;
        self.parking = snapshot;
        self.last_update = now_ms();
        true
    }
}

pub type SharedState = Arc<RwLock<DashboardState>>;

/// page-level refresh timer
#[derive(Clone)]
pub struct Poller {
    service: AcquisitionService,
    state: SharedState,
    cycle: Arc<AtomicU64>,
    show_data: bool,
}

impl Poller {
    pub fn new(service: AcquisitionService, state: SharedState, show_data: bool) -> Self {
        Self {
            service,
            state,
            cycle: Arc::new(AtomicU64::new(0)),
            show_data,
        }
    }

    /// reserve the next cycle number
    pub fn next_cycle(&self) -> u64 {
        self.cycle.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// one refresh: both acquisitions concurrently, then publish
    pub async fn refresh(&self) -> u64 {
        let cycle = self.next_cycle();
        let (sensors, parking) = tokio::join!(
            self.service.fetch_sensor_readings(),
            self.service.fetch_parking_snapshot()
        );

        if self.show_data {
            for s in &sensors.sensors {
                info!("[{}] {:.1}cm ({:?}){}", s.name, s.distance, s.status, if sensors.is_live { "" } else { " [baseline]" });
            }
            info!(
                "[PARKING] A {}/{} | B {}/{}{}",
                parking.zones.zone_a.occupied,
                parking.zones.zone_a.total,
                parking.zones.zone_b.occupied,
                parking.zones.zone_b.total,
                if parking.is_live { "" } else { " [baseline]" }
            );
        }

        let mut guard = self.state.write().await;
        guard.publish_sensors(cycle, sensors);
        guard.publish_parking(cycle, parking);
        cycle
    }

    /// refresh forever; each cycle runs on its own task so a slow one
    /// never delays the timer
    pub async fn run(self, period: Duration) {
        let mut interval = tokio::time::interval(period);
        info!("[POLLER] Refreshing every {}s", period.as_secs());
        loop {
            interval.tick().await;
            let poller = self.clone();
            tokio::spawn(async move {
                poller.refresh().await;
            });
        }
    }
}
