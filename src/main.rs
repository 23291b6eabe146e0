//! ==============================================================================
//! main.rs - parking monitor entry point
//! ==============================================================================
//!
//! purpose:
//!     runs the hub process: one page-level poller, one alert monitor and the
//!     json api, all on a single-threaded runtime.
//!
//! responsibilities:
//!     - load configuration (monitor.toml or defaults)
//!     - initialize logging
//!     - build the http backend and acquisition service
//!     - spawn the poller, the alert monitor and the web server
//!     - stop on ctrl-c
//!
//! ==============================================================================

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info};

use parking_monitor::acquisition::AcquisitionService;
use parking_monitor::backend::HttpBackend;
use parking_monitor::config::MonitorConfig;
use parking_monitor::monitor::{AlertLog, AlertMonitor};
use parking_monitor::server::{run_server, ApiState};
use parking_monitor::state::{DashboardState, Poller};
use parking_monitor::telemetry::init_tracing;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // step 0: configuration, then logging at the configured level
    let (config, source) = MonitorConfig::discover();
    init_tracing(&config.logging.level);
    source.log();

    info!("===========================================================");
    info!("  Parking Monitor - live sensor hub");
    info!("===========================================================");
    config.print_summary();

    // step 1: backend + acquisition
    let backend = HttpBackend::new(&config.backend)?;
    let service = AcquisitionService::new(Arc::new(backend), config.sensors.count);

    // step 2: shared state
    let state = Arc::new(RwLock::new(DashboardState::default()));
    let alerts = AlertLog::new(config.alerts.capacity);

    // step 3: page refresh poller
    let poller = Poller::new(service.clone(), state.clone(), config.logging.show_sensor_data);
    let refresh = Duration::from_secs(config.polling.refresh_interval_seconds.max(1));
    tokio::spawn(poller.run(refresh));

    // step 4: alert monitor on its own timer
    let monitor = AlertMonitor::new(&config.alerts, alerts.clone());
    tokio::spawn(monitor.run(Arc::new(service.clone())));

    // step 5: web api
    let api = ApiState { state, service, alerts };
    let bind = config.server.bind.clone();
    tokio::spawn(async move {
        if let Err(e) = run_server(&bind, api).await {
            error!("[ERROR] Web server error: {:#}", e);
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("[SHUTDOWN] ctrl-c received, exiting");
    Ok(())
}
