//! Pure domain logic for the Vigil monitoring client.
//!
//! Nothing in this crate performs I/O: frame buffers, the privacy
//! filter, indicator derivation, alert classification and status
//! mapping are all deterministic functions that the agent drives.

pub mod alert;
pub mod analysis;
pub mod error;
pub mod frame;
pub mod indicator;
pub mod privacy;
pub mod region;
pub mod status;
pub mod types;
