//! HTTP request handlers for the rota allocation API.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::allocation::Allocator;

use super::request::AllocationRequest;
use super::response::{ApiError, ApiErrorResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/allocate", post(allocate_handler))
        .with_state(state)
}

/// Handler for POST /allocate.
///
/// Infeasible and solver-error runs are still `200 OK`: the status is part
/// of the result body. Only rejected input and engine failures map to error
/// responses.
async fn allocate_handler(
    State(state): State<AppState>,
    payload: Result<Json<AllocationRequest>, JsonRejection>,
) -> Response {
    // Generate correlation ID for request tracking
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing allocation request");

    let request = match payload {
        Ok(Json(req)) => req,
        // Map JSON extraction failures to API errors
        Err(rejection) => {
            let error = match rejection {
                JsonRejection::JsonDataError(err) => {
                    let body_text = err.body_text();
                    warn!(
                        correlation_id = %correlation_id,
                        error = %body_text,
                        "JSON data error"
                    );
                    // A missing field is a shape problem, not bad JSON
                    if body_text.contains("missing field") {
                        ApiError::validation_error(body_text)
                    } else {
                        ApiError::malformed_json(body_text)
                    }
                }
                JsonRejection::JsonSyntaxError(err) => {
                    warn!(
                        correlation_id = %correlation_id,
                        error = %err,
                        "JSON syntax error"
                    );
                    ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
                }
                JsonRejection::MissingJsonContentType(_) => {
                    ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
                }
                _ => ApiError::malformed_json("Failed to parse request body"),
            };
            return ApiErrorResponse {
                status: StatusCode::BAD_REQUEST,
                error,
            }
            .into_response();
        }
    };

    // Merge per-request overrides onto the server config
    let (input, config) = match request.into_parts(state.config().config()) {
        Ok(parts) => parts,
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Invalid solver options");
            return ApiErrorResponse::from(err).into_response();
        }
    };
    let allocator = match Allocator::new(config) {
        Ok(allocator) => allocator,
        Err(err) => return ApiErrorResponse::from(err).into_response(),
    };

    // The solve is CPU bound; keep it off the async worker threads.
    let start_time = Instant::now();
    let backend = allocator.backend();
    let joined = tokio::task::spawn_blocking(move || allocator.allocate(&input)).await;

    match joined {
        // Every result status is a successful response
        Ok(Ok(result)) => {
            info!(
                correlation_id = %correlation_id,
                run_id = %result.run_id,
                backend,
                status = ?result.status,
                objective = ?result.objective_value,
                allocations = result.allocations.len(),
                duration_us = start_time.elapsed().as_micros(),
                "Allocation request completed"
            );
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/json")],
                Json(result),
            )
                .into_response()
        }
        Ok(Err(err)) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "Allocation failed"
            );
            ApiErrorResponse::from(err).into_response()
        }
        // The blocking task panicked or was cancelled
        Err(join_error) => {
            error!(
                correlation_id = %correlation_id,
                error = %join_error,
                "Allocation task did not complete"
            );
            ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::internal("Allocation task did not complete"),
            }
            .into_response()
        }
    }
}
