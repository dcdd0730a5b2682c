//! Logging, span export and the tracing-backed telemetry sink.
//!
//! Call [`init_tracing`] once at process startup to wire up the `tracing`
//! subscriber with an optional OTLP span exporter.
//!
//! # Environment variables
//!
//! | Variable | Effect |
//! |---|---|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | OTLP collector base URL (e.g. `http://localhost:4318`). When set the OTLP HTTP exporter is activated. |
//! | `RUST_LOG` | Log filter (default `"info"`). Per-cycle telemetry is logged at `debug` under the `telemetry` target. |
//! | `DEEPSPACE_LOG_FORMAT=json` | Emit newline-delimited JSON logs. |
//!
//! # Example
//!
//! ```rust,no_run
//! // Hold the guard for the entire lifetime of the process.
//! let _guard = deepspace_runtime::telemetry::init_tracing("deepspace");
//! ```

use deepspace_types::{TelemetrySink, TelemetryValue};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

// ─────────────────────────────────────────────────────────────────────────────
// Subscriber
// ─────────────────────────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber with an optional OTLP exporter.
///
/// Without `OTEL_EXPORTER_OTLP_ENDPOINT` only the console formatter is
/// installed.
///
/// The returned [`TracerProviderGuard`] must be held for the lifetime of the
/// process; dropping it flushes pending spans.
pub fn init_tracing(service_name: &str) -> TracerProviderGuard {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let use_json = std::env::var("DEEPSPACE_LOG_FORMAT").as_deref() == Ok("json");

    let provider = build_provider(service_name);

    if let Some(ref p) = provider {
        let tracer = p.tracer("deepspace");
        let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);
        if use_json {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(otel_layer)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(otel_layer)
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
    } else if use_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().compact())
            .init();
    }

    TracerProviderGuard(provider)
}

/// Shuts the OTel [`SdkTracerProvider`] down on drop, flushing pending
/// spans.  Hold one in `main`.
pub struct TracerProviderGuard(Option<SdkTracerProvider>);

impl Drop for TracerProviderGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.0.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("[deepspace] OpenTelemetry provider shutdown error: {e}");
        }
    }
}

/// `None` when `OTEL_EXPORTER_OTLP_ENDPOINT` is unset or the exporter cannot
/// be built (the reason goes to stderr).
fn build_provider(service_name: &str) -> Option<SdkTracerProvider> {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok()?;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| eprintln!("[deepspace] OTLP exporter init failed: {e}"))
        .ok()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    Some(
        SdkTracerProvider::builder()
            .with_resource(resource)
            // Synchronous export: no async runtime exists yet at init time.
            .with_simple_exporter(exporter)
            .build(),
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingSink
// ─────────────────────────────────────────────────────────────────────────────

/// [`TelemetrySink`] that turns every record into a `debug!` event under the
/// `telemetry` target.  Enable with `RUST_LOG=telemetry=debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink {
    records: u64,
}

impl TracingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records forwarded so far.
    pub fn records(&self) -> u64 {
        self.records
    }
}

impl TelemetrySink for TracingSink {
    fn record(&mut self, key: &str, value: TelemetryValue) {
        self.records += 1;
        match value {
            TelemetryValue::Number(v) => tracing::debug!(target: "telemetry", key, value = v),
            TelemetryValue::Flag(v) => tracing::debug!(target: "telemetry", key, value = v),
            TelemetryValue::Text(v) => tracing::debug!(target: "telemetry", key, value = %v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_provider_returns_none_without_endpoint() {
        // SAFETY: single-threaded test; no other thread reads this env-var.
        unsafe { std::env::remove_var("OTEL_EXPORTER_OTLP_ENDPOINT") };
        assert!(
            build_provider("test-service").is_none(),
            "expected None when OTEL_EXPORTER_OTLP_ENDPOINT is absent"
        );
    }

    #[test]
    fn tracer_provider_guard_drop_with_none_is_safe() {
        let guard = TracerProviderGuard(None);
        drop(guard);
    }

    #[test]
    fn tracing_sink_counts_records() {
        let mut sink = TracingSink::new();
        sink.record("leadscrew/inches", 3.5.into());
        sink.record("leadscrew/in_range", true.into());
        sink.record("robot/state", "HATCH_SCORE".into());
        assert_eq!(sink.records(), 3);
    }
}
