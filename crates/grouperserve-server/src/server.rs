use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use grouperserve_engine::{EngineCache, GroupingService, RegistryError, SystemRegistry};
use grouperserve_kernel::{JsonSpecificationLoader, UrlCaseParser};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::middleware::RequestId;
use crate::telemetry::{DynErrorReporter, reporter_from_config};
use crate::{config::AppConfig, handlers, middleware as app_middleware};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<GroupingService>,
    pub reporter: DynErrorReporter,
}

impl AppState {
    /// Load the systems list and catalogues and wire the grouping pipeline.
    pub fn from_config(cfg: &AppConfig) -> Result<Self, RegistryError> {
        let registry = Arc::new(SystemRegistry::load(&cfg.grouper)?);
        tracing::info!(
            systems = registry.len(),
            specs_dir = %registry.specs_dir().display(),
            "System registry loaded"
        );
        let cache = Arc::new(EngineCache::new(
            registry.clone(),
            Arc::new(JsonSpecificationLoader::new()),
            cfg.grouper.cache_capacity,
        ));
        let service = GroupingService::new(registry, cache, Arc::new(UrlCaseParser::new()));
        Ok(Self {
            service: Arc::new(service),
            reporter: reporter_from_config(&cfg.telemetry),
        })
    }

    pub fn with_reporter(mut self, reporter: DynErrorReporter) -> Self {
        self.reporter = reporter;
        self
    }
}

pub struct GrouperServer {
    addr: SocketAddr,
    app: Router,
}

pub fn build_app(cfg: &AppConfig) -> Result<Router, RegistryError> {
    let state = AppState::from_config(cfg)?;
    Ok(router(state, cfg.server.body_limit_bytes))
}

pub fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/systems", get(handlers::systems))
        .route("/group", post(handlers::group))
        .route("/group_many", post(handlers::group_many))
        .with_state(state)
        // Middleware stack (outermost last: request id -> trace -> compression/cors -> body limit)
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    let req_id = req
                        .extensions()
                        .get::<RequestId>()
                        .and_then(RequestId::as_str)
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %req.method(),
                        http.target = %req.uri(),
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        tracing::info!(
                            http.status = %res.status().as_u16(),
                            elapsed_ms = %latency.as_millis(),
                            "request handled"
                        );
                    },
                ),
        )
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> Result<GrouperServer, RegistryError> {
        let app = build_app(&self.config)?;

        Ok(GrouperServer {
            addr: self.addr,
            app,
        })
    }
}

impl GrouperServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
