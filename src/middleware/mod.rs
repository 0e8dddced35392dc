//! Middleware module
//!
//! Request logging and trace header propagation

pub mod logging;
pub mod trace;

pub use trace::{TraceContext, SPAN_ID_HEADER, TRACE_ID_HEADER};
