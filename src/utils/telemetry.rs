//! OpenTelemetry wiring
//!
//! Spans recorded through [`telemetry_layer`] carry W3C trace and span ids.
//! No exporter is installed; the ids serve propagation and log correlation.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing::Subscriber;
use tracing_subscriber::{filter::LevelFilter, registry::LookupSpan, Layer};

/// Instrumentation scope name of the service tracer
pub const TRACER_NAME: &str = env!("CARGO_PKG_NAME");

/// Tracing layer that attaches an OpenTelemetry span context to every info-level span
///
/// Filtered on its own so request spans get ids whatever `RUST_LOG` says.
pub fn telemetry_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let provider = SdkTracerProvider::builder().build();
    let tracer = provider.tracer(TRACER_NAME);

    tracing_opentelemetry::layer()
        .with_tracer(tracer)
        .with_filter(LevelFilter::INFO)
}
