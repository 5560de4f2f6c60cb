//! Server-error reporting.
//!
//! Every 500 response is handed to an [`ErrorReporter`] together with the
//! request it belongs to. The default reporter emits a structured event on the
//! `grouperserve::telemetry` target so that a log shipper can forward it.

use crate::config::TelemetryConfig;
use grouperserve_api::ApiError;
use std::sync::Arc;

pub const TELEMETRY_TARGET: &str = "grouperserve::telemetry";

/// Request details attached to a report.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub route: &'static str,
    pub request_id: Option<String>,
    pub version: Option<String>,
}

pub trait ErrorReporter: Send + Sync {
    fn report(&self, error: &ApiError, context: &ErrorContext);
}

pub type DynErrorReporter = Arc<dyn ErrorReporter>;

/// Reports through `tracing`, tagged with environment and code version.
#[derive(Debug, Clone, Default)]
pub struct TracingReporter {
    environment: String,
    code_version: String,
}

impl TracingReporter {
    pub fn new(config: &TelemetryConfig) -> Self {
        Self {
            environment: config.environment.clone().unwrap_or_default(),
            code_version: config
                .code_version
                .clone()
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
        }
    }
}

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &ApiError, context: &ErrorContext) {
        tracing::error!(
            target: TELEMETRY_TARGET,
            environment = %self.environment,
            code_version = %self.code_version,
            route = context.route,
            request_id = context.request_id.as_deref().unwrap_or(""),
            version = context.version.as_deref().unwrap_or(""),
            error = %error.message(),
            "server error"
        );
    }
}

/// Drops all reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl ErrorReporter for NoopReporter {
    fn report(&self, _error: &ApiError, _context: &ErrorContext) {}
}

/// Reporter selected by the telemetry configuration.
pub fn reporter_from_config(config: &TelemetryConfig) -> DynErrorReporter {
    if config.enabled {
        Arc::new(TracingReporter::new(config))
    } else {
        Arc::new(NoopReporter)
    }
}
