//! ==============================================================================
//! parking-monitor - sensor hub core
//! ==============================================================================
//!
//! polls the io backend (ultrasonic sensors, led/gate/bell) and the parking
//! backend (camera-based spot tracking), keeps a view model that always
//! exists even when both are down, and raises alerts when a sensor reports
//! something approaching fast.
//!
//! ```text
//!     ┌──────────────┐   ┌──────────────┐
//!     │ poller (5s)  │   │ monitor (3s) │
//!     └──────┬───────┘   └──────┬───────┘
//!            │                  │
//!            └────────┬─────────┘
//!                     │
//!              ┌──────┴──────┐
//!              │ acquisition │ <- live data, baseline fallback
//!              └──────┬──────┘
//!                     │ http (reqwest)
//!          ┌──────────┴──────────┐
//!          ▼                     ▼
//!     io backend :8000     parking backend :5000
//! ```
//!
//! ==============================================================================

pub mod acquisition;
pub mod backend;
pub mod config;
pub mod domain;
pub mod error;
pub mod monitor;
pub mod server;
pub mod state;
pub mod telemetry;
