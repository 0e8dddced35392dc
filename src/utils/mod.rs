//! Utilities module
//!
//! Contains error handling, logging and telemetry helpers

pub mod error;
pub mod logging;
pub mod telemetry;
