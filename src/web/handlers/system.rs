//! Accounts, configuration and service information.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::store::AccountRepository;
use crate::sync::SchedulerStatus;
use crate::web::dto::{AccountResponse, ApiResponse, ConfigResponse, VersionResponse};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// GET /api/accounts - Provider accounts without credentials.
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<AccountResponse>>>, ApiError> {
    let accounts = AccountRepository::new(state.db.pool()).list().await?;
    Ok(Json(ApiResponse::new(
        accounts.into_iter().map(AccountResponse::from).collect(),
    )))
}

/// DELETE /api/accounts/:id/delete - Remove a provider account.
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<bool>>, ApiError> {
    if !AccountRepository::new(state.db.pool()).delete(id).await? {
        return Err(ApiError::not_found(format!("account {id} not found")));
    }
    tracing::info!("Deleted account {}", id);
    Ok(Json(ApiResponse::new(true)))
}

/// POST /api/accounts/:id/refresh - Mark an account usable again.
pub async fn refresh_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<AccountResponse>>, ApiError> {
    let repo = AccountRepository::new(state.db.pool());
    if !repo.set_status(id, true, false).await? {
        return Err(ApiError::not_found(format!("account {id} not found")));
    }
    let account = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("account {id} not found")))?;
    tracing::info!("Refreshed account {}", id);
    Ok(Json(ApiResponse::new(AccountResponse::from(account))))
}

/// GET /api/config - Effective configuration, secrets removed.
pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<ApiResponse<ConfigResponse>> {
    let scheduler = state.scheduler.status().await;
    Json(ApiResponse::new(ConfigResponse::new(&state.config, scheduler)))
}

/// GET /api/scheduler - Scheduler state and next run.
pub async fn scheduler_status(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<SchedulerStatus>> {
    Json(ApiResponse::new(state.scheduler.status().await))
}

/// GET /version
pub async fn version() -> Json<ApiResponse<VersionResponse>> {
    Json(ApiResponse::new(VersionResponse::default()))
}

/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
