//! ==============================================================================
//! monitor.rs - distance drop alerts
//! ==============================================================================
//!
//! purpose:
//!     watches consecutive readings per sensor and raises an alert when the
//!     distance shrinks by at least the configured threshold (something moved
//!     closer, fast). growing distances never alert. a sensor's first reading
//!     only seeds its state.
//!
//! ownership:
//!     - the previous-distance map lives inside `AlertMonitor` and is only
//!       touched by its tick.
//!     - the alert list lives in `AlertLog`, a cloneable handle the web api
//!       uses for dismissal.
//!
//! ==============================================================================

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{info, warn};

use crate::acquisition::AcquisitionService;
use crate::config::AlertsConfig;
use crate::domain::{now_ms, Alert, SensorReading, SensorSnapshot};
use crate::error::FeedError;

/// where the monitor gets its readings from
#[async_trait]
pub trait SensorFeed: Send + Sync {
    async fn next_snapshot(&self) -> Result<SensorSnapshot, FeedError>;
}

#[async_trait]
impl SensorFeed for AcquisitionService {
    async fn next_snapshot(&self) -> Result<SensorSnapshot, FeedError> {
        Ok(self.fetch_sensor_readings().await)
    }
}

// ==============================================================================
// alert log
// ==============================================================================

/// bounded, newest-first alert list
#[derive(Clone)]
pub struct AlertLog {
    inner: Arc<Mutex<VecDeque<Alert>>>,
    capacity: usize,
}

impl AlertLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Alert>> {
        // a panic elsewhere must not take the alert list down with it
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// newest alert goes first; the oldest ones fall off past capacity
    pub fn push(&self, alert: Alert) {
        let mut alerts = self.lock();
        alerts.push_front(alert);
        alerts.truncate(self.capacity);
    }

    /// remove one alert by id, returns whether it existed
    pub fn dismiss(&self, id: &str) -> bool {
        let mut alerts = self.lock();
        match alerts.iter().position(|a| a.id == id) {
            Some(pos) => {
                alerts.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn dismiss_all(&self) {
        self.lock().clear();
    }

    /// copy of the current list, newest first
    pub fn snapshot(&self) -> Vec<Alert> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

// ==============================================================================
// monitor
// ==============================================================================

pub struct AlertMonitor {
    previous: HashMap<u32, f64>,
    log: AlertLog,
    threshold_cm: f64,
    poll_interval: Duration,
    seq: u64,
}

impl AlertMonitor {
    pub fn new(config: &AlertsConfig, log: AlertLog) -> Self {
        Self {
            previous: HashMap::new(),
            log,
            threshold_cm: config.threshold_cm,
            poll_interval: Duration::from_secs(config.poll_interval_seconds.max(1)),
            seq: 0,
        }
    }

    pub fn log(&self) -> &AlertLog {
        &self.log
    }

    /// last distance seen for a sensor, if any
    pub fn previous_distance(&self, sensor_id: u32) -> Option<f64> {
        self.previous.get(&sensor_id).copied()
    }

    /// evaluate one batch of readings, returns the alerts it raised
    pub fn observe(&mut self, sensors: &[SensorReading], now: u64) -> Vec<Alert> {
        let mut raised = Vec::new();

        for sensor in sensors {
            if let Some(previous) = self.previous.get(&sensor.id).copied() {
                let change = previous - sensor.distance;
                if change > 0.0 && change >= self.threshold_cm {
                    let alert = self.build_alert(sensor, previous, change, now);
                    info!("[ALERT] {}", alert.message);
                    self.log.push(alert.clone());
                    raised.push(alert);
                }
            }
            self.previous.insert(sensor.id, sensor.distance);
        }

        raised
    }

    fn build_alert(&mut self, sensor: &SensorReading, previous: f64, change: f64, now: u64) -> Alert {
        self.seq += 1;
        Alert {
            id: format!("{}-{}-{}", sensor.id, now, self.seq),
            timestamp_ms: now,
            sensor_id: sensor.id,
            sensor_name: sensor.name.clone(),
            previous_distance: previous,
            current_distance: sensor.distance,
            change,
            message: format!(
                "{}: sudden distance change detected! {}cm -> {}cm ({}cm closer)",
                sensor.name,
                previous.round(),
                sensor.distance.round(),
                change.round()
            ),
        }
    }

    /// one timer tick: fetch, then evaluate
    ///
    /// a failed fetch skips evaluation and leaves the per-sensor state as is.
    pub async fn tick(&mut self, feed: &dyn SensorFeed) -> Vec<Alert> {
        match feed.next_snapshot().await {
            Ok(snapshot) => self.observe(&snapshot.sensors, now_ms()),
            Err(e) => {
                warn!("alert check skipped: {}", e);
                Vec::new()
            }
        }
    }

    /// run ticks forever on the configured period
    pub async fn run(mut self, feed: Arc<dyn SensorFeed>) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!("[MONITOR] Watching sensors every {}s", self.poll_interval.as_secs());

        loop {
            interval.tick().await;
            self.tick(feed.as_ref()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::baseline_sensors;

    fn monitor() -> AlertMonitor {
        AlertMonitor::new(&AlertsConfig::default(), AlertLog::new(20))
    }

    fn reading(id: u32, distance: f64) -> SensorReading {
        let mut sensor = baseline_sensors()[(id - 1) as usize].clone();
        sensor.distance = distance;
        sensor
    }

    #[test]
    fn rising_distance_never_alerts_even_with_non_positive_threshold() {
        let config = AlertsConfig { threshold_cm: -10.0, ..AlertsConfig::default() };
        let mut monitor = AlertMonitor::new(&config, AlertLog::new(20));
        assert!(monitor.observe(&[reading(1, 50.0)], 1).is_empty());
        assert!(monitor.observe(&[reading(1, 55.0)], 2).is_empty());
        assert!(monitor.observe(&[reading(1, 55.0)], 3).is_empty());
        assert!(monitor.log().is_empty());
    }

    #[test]
    fn first_reading_never_alerts() {
        let mut m = monitor();
        assert!(m.observe(&[reading(1, 500.0)], 1).is_empty());
        assert_eq!(m.previous_distance(1), Some(500.0));
    }

    #[test]
    fn drop_sequence_fires_on_large_drops_only() {
        let mut m = monitor();
        m.observe(&[reading(1, 100.0)], 1);

        let fired = m.observe(&[reading(1, 60.0)], 2);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].change, 40.0);

        assert!(m.observe(&[reading(1, 55.0)], 3).is_empty());

        let fired = m.observe(&[reading(1, 10.0)], 4);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].change, 45.0);
        assert_eq!(m.log().len(), 2);
    }

    #[test]
    fn us02_scenario() {
        let mut m = monitor();
        m.observe(&[reading(2, 85.0)], 1_000);
        let fired = m.observe(&[reading(2, 45.0)], 4_000);
        assert_eq!(fired.len(), 1);
        let alert = &fired[0];
        assert_eq!(alert.sensor_name, "US-02");
        assert_eq!(alert.previous_distance, 85.0);
        assert_eq!(alert.current_distance, 45.0);
        assert_eq!(alert.change, 40.0);
        assert_eq!(alert.message, "US-02: sudden distance change detected! 85cm -> 45cm (40cm closer)");

        assert!(m.observe(&[reading(2, 40.0)], 7_000).is_empty());
    }

    #[test]
    fn exact_threshold_fires_and_growth_never_does() {
        let mut m = monitor();
        m.observe(&[reading(3, 80.0)], 1);
        assert_eq!(m.observe(&[reading(3, 50.0)], 2).len(), 1);
        assert!(m.observe(&[reading(3, 200.0)], 3).is_empty());
        assert!(m.observe(&[reading(3, 171.0)], 4).is_empty());
    }

    #[test]
    fn sensors_are_tracked_independently() {
        let mut m = monitor();
        m.observe(&[reading(1, 100.0), reading(2, 100.0)], 1);
        let fired = m.observe(&[reading(1, 95.0), reading(2, 10.0)], 2);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].sensor_id, 2);
    }

    #[test]
    fn ids_are_unique_within_one_millisecond() {
        let mut m = monitor();
        m.observe(&[reading(1, 100.0)], 5);
        let a = m.observe(&[reading(1, 10.0)], 5);
        m.observe(&[reading(1, 100.0)], 5);
        let b = m.observe(&[reading(1, 10.0)], 5);
        assert_ne!(a[0].id, b[0].id);
    }

    #[test]
    fn log_keeps_newest_within_capacity() {
        let log = AlertLog::new(20);
        let mut m = AlertMonitor::new(&AlertsConfig::default(), log.clone());
        // alternating far/near raises an alert on every odd tick, 22 in total
        for t in 0..45u64 {
            let distance = if t % 2 == 0 { 100.0 } else { 10.0 };
            m.observe(&[reading(1, distance)], t);
        }
        let alerts = log.snapshot();
        assert_eq!(alerts.len(), 20);
        assert_eq!(alerts[0].timestamp_ms, 43);
        assert!(alerts.windows(2).all(|w| w[0].timestamp_ms > w[1].timestamp_ms));
    }

    #[test]
    fn dismiss_removes_one_and_keeps_order() {
        let log = AlertLog::new(20);
        let mut m = AlertMonitor::new(&AlertsConfig::default(), log.clone());
        for t in 0..6u64 {
            let distance = if t % 2 == 0 { 100.0 } else { 10.0 };
            m.observe(&[reading(1, distance)], t);
        }
        let before = log.snapshot();
        assert_eq!(before.len(), 3);

        assert!(log.dismiss(&before[1].id));
        let after = log.snapshot();
        assert_eq!(after, vec![before[0].clone(), before[2].clone()]);

        assert!(!log.dismiss("no-such-alert"));
        assert_eq!(log.len(), 2);

        log.dismiss_all();
        assert!(log.is_empty());
        log.dismiss_all();
        assert!(log.is_empty());
    }

    struct FailingFeed;

    #[async_trait]
    impl SensorFeed for FailingFeed {
        async fn next_snapshot(&self) -> Result<SensorSnapshot, FeedError> {
            Err(FeedError("backend exploded".to_string()))
        }
    }

    struct FixedFeed(Vec<SensorReading>);

    #[async_trait]
    impl SensorFeed for FixedFeed {
        async fn next_snapshot(&self) -> Result<SensorSnapshot, FeedError> {
            Ok(SensorSnapshot { sensors: self.0.clone(), is_live: true })
        }
    }

    #[tokio::test]
    async fn failed_tick_keeps_previous_state() {
        let mut m = monitor();
        m.tick(&FixedFeed(vec![reading(1, 90.0)])).await;
        assert!(m.tick(&FailingFeed).await.is_empty());
        assert_eq!(m.previous_distance(1), Some(90.0));

        let fired = m.tick(&FixedFeed(vec![reading(1, 50.0)])).await;
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].previous_distance, 90.0);
    }
}
