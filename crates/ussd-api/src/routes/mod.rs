//! API route handlers

pub mod account;
pub mod health;
pub mod pool;
pub mod token;

use axum::{routing::get, Json, Router};

use crate::dto::ApiResponse;
use crate::error::RouteError;
use crate::AppState;

/// Handler result: an enveloped JSON body or a mapped error
pub type RouteResult<T> = Result<Json<ApiResponse<T>>, RouteError>;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    let v1 = Router::new()
        .route("/health", get(health::health_check))
        .merge(account::router())
        .merge(token::router())
        .merge(pool::router());

    Router::new().nest("/api/v1", v1).with_state(state)
}

pub(crate) fn respond<T>(description: &str, result: T) -> RouteResult<T> {
    Ok(Json(ApiResponse::new(description, result)))
}
