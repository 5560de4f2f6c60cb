pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod params;
pub mod server;
pub mod telemetry;

pub use config::{AppConfig, LoggingConfig, ServerConfig, TelemetryConfig};
pub use grouperserve_engine::GrouperConfig;
pub use observability::init_tracing;
pub use server::{AppState, GrouperServer, ServerBuilder, build_app, router};
pub use telemetry::{ErrorContext, ErrorReporter, TracingReporter};
