//! On-device monitoring agent.
//!
//! [`Monitor`] drives a capture device, shows privacy-masked frames on a
//! [`surface::Surface`], sends periodic snapshots to the analysis service
//! and keeps the indicator panel, alert feed and status badge current.

pub mod capture;
pub mod config;
pub mod monitor;
pub mod render;
pub mod sampler;
pub mod scheduler;
pub mod surface;

pub use monitor::{Monitor, SessionPhase, StartOutcome};
