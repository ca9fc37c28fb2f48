//! HTTP request handlers
//!
//! `/api/calculate` runs the full pipeline: bearer check, parse, plan
//! authorization, dispatch. The handler task never computes; the response is
//! produced by the dispatcher continuation once the computation finishes and
//! the result has been archived.

use super::parser::RequestParser;
use crate::application::auth::{Authorizer, bearer_credential};
use crate::application::dispatcher::Dispatcher;
use crate::domain::ports::{Ledger, LedgerEntry, SharedLedger};
use crate::error::CalculationError;
use axum::{
    Json, Router,
    body::{Body, to_bytes},
    extract::{Request, State},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::any,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Dependencies shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub authorizer: Authorizer,
    pub dispatcher: Arc<Dispatcher>,
    pub ledger: SharedLedger,
}

impl AppState {
    pub fn new(authorizer: Authorizer, dispatcher: Arc<Dispatcher>, ledger: SharedLedger) -> Self {
        Self {
            authorizer,
            dispatcher,
            ledger,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

impl IntoResponse for CalculationError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/calculate", any(calculate))
        .route("/health", any(health))
        .with_state(state)
}

/// Liveness probe; needs no credential.
pub async fn health(method: Method) -> Response {
    if method != Method::GET {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    (StatusCode::OK, Json(HealthBody { status: "UP" })).into_response()
}

/// The body is only read once the bearer credential has been accepted, and
/// its size is not capped.
pub async fn calculate(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    if parts.method != Method::POST {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(ErrorBody {
                error: "Method not allowed".to_string(),
            }),
        )
            .into_response();
    }

    let authorization = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let credential = match bearer_credential(authorization) {
        Ok(credential) => credential,
        Err(e) => {
            warn!(error = %e, "rejecting request without a usable bearer credential");
            return e.into_response();
        }
    };

    info!("received calculation request");
    let body = match to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(e) => {
            error!(error = %e, "failed to read request body");
            return CalculationError::MalformedRequest(format!("unreadable body: {}", e))
                .into_response();
        }
    };
    let request = match RequestParser::parse(&body) {
        Ok(request) => request,
        Err(e) => {
            error!(error = %e, "failed to prepare calculation request");
            return e.into_response();
        }
    };

    if !state.authorizer.authorize(credential, request.plan()) {
        warn!(plan = request.plan(), "credential does not grant the requested plan");
        return CalculationError::Forbidden(request.plan().to_uppercase()).into_response();
    }

    let client_id = request.client_id();
    let ledger = state.ledger.clone();
    let completion = state.dispatcher.submit(request).on_completion(
        move |result| async move {
            info!(
                proposal_id = %result.proposal_id,
                %client_id,
                "calculation finished, archiving"
            );
            if let Err(e) = ledger.record(LedgerEntry::from(&result)).await {
                warn!(
                    proposal_id = %result.proposal_id,
                    error = %e,
                    "ledger write failed, responding anyway"
                );
            }
            (StatusCode::OK, Json(result)).into_response()
        },
        move |err| async move {
            error!(%client_id, error = %err, "calculation failed");
            err.into_response()
        },
    );

    completion.await.unwrap_or_else(|e| {
        error!(error = %e, "calculation continuation aborted");
        CalculationError::ComputeFailure("calculation aborted before responding".to_string())
            .into_response()
    })
}
