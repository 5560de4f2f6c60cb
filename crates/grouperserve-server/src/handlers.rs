use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use grouperserve_api::{ApiError, JsonText, encode};
use grouperserve_engine::{GroupManyRequest, GroupRequest, ServiceResult};
use serde::Serialize;

use crate::middleware::RequestId;
use crate::params::Params;
use crate::server::AppState;
use crate::telemetry::ErrorContext;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// `GET /systems`: the configured systems list.
pub async fn systems(State(state): State<AppState>) -> JsonText {
    JsonText(state.service.systems_json().to_string())
}

/// `POST /group`: group one case given in `pc`.
pub async fn group(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    params: Params,
) -> Result<JsonText, ApiError> {
    let request = GroupRequest {
        version: params.get_owned("version"),
        case: params.get_owned("pc"),
        options: params.options(),
    };
    let result = state.service.group(&request).await;
    respond(
        &state,
        ErrorContext {
            route: "/group",
            request_id: request_id.as_str().map(str::to_string),
            version: request.version,
        },
        result,
        params.pretty(),
    )
}

/// `POST /group_many`: group the JSON array of cases given in `pcs`.
pub async fn group_many(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    params: Params,
) -> Result<JsonText, ApiError> {
    let request = GroupManyRequest {
        version: params.get_owned("version"),
        cases: params.get_owned("pcs"),
        options: params.options(),
    };
    let result = state.service.group_many(&request).await;
    respond(
        &state,
        ErrorContext {
            route: "/group_many",
            request_id: request_id.as_str().map(str::to_string),
            version: request.version,
        },
        result,
        params.pretty(),
    )
}

fn respond<T: Serialize>(
    state: &AppState,
    context: ErrorContext,
    result: ServiceResult<T>,
    pretty: bool,
) -> Result<JsonText, ApiError> {
    let outcome = result
        .map_err(ApiError::from)
        .and_then(|value| encode(&value, pretty).map_err(ApiError::from));

    match outcome {
        Ok(body) => Ok(JsonText(body)),
        Err(err) => {
            if err.is_server_error() {
                tracing::error!(route = context.route, error = %err, "Request failed");
                state.reporter.report(&err, &context);
            } else {
                tracing::debug!(route = context.route, error = %err, "Rejected request");
            }
            Err(err)
        }
    }
}
