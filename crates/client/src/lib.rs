//! HTTP client for the Vigil analysis and storage service.
//!
//! Provides the [`MonitorBackend`] trait the agent depends on and the
//! [`MonitorApi`] implementation built on `reqwest`.

pub mod api;
pub mod backend;

pub use api::{MonitorApi, MonitorApiError};
pub use backend::MonitorBackend;
