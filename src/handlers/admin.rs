use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::audit;
use crate::domain::{DeliveryStatus, TransactionStatus};
use crate::error::AppError;
use crate::handlers::Caller;
use crate::services::delivery::DeliveryService;
use crate::services::lifecycle::LifecycleService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct StatusUpdatePayload {
    /// Parsed by hand so an out-of-vocabulary value reports `InvalidStatus`
    /// instead of a generic deserialization failure.
    pub status: String,
}

pub async fn update_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdatePayload>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_admin()?;

    let status = payload
        .status
        .parse::<TransactionStatus>()
        .map_err(AppError::InvalidStatus)?;

    let lifecycle = LifecycleService::new(state.db.clone());
    let updated = lifecycle.apply_status_change(id, status, "admin").await?;

    Ok(Json(updated))
}

#[derive(Debug, Deserialize)]
pub struct DeliveryUpdatePayload {
    pub delivery_status: String,
    pub estimated_ready_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

pub async fn update_delivery(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Json(payload): Json<DeliveryUpdatePayload>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_admin()?;

    let target = payload
        .delivery_status
        .parse::<DeliveryStatus>()
        .map_err(AppError::InvalidStatus)?;

    let service = DeliveryService::new(state.db.clone());
    let updated = service
        .admin_update(id, target, payload.estimated_ready_date, payload.notes)
        .await?;

    Ok(Json(updated))
}

#[derive(Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn get_audit_logs(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
    Query(pagination): Query<Pagination>,
) -> Result<impl IntoResponse, AppError> {
    caller.require_admin()?;

    let limit = pagination.limit.unwrap_or(20);
    let offset = pagination.offset.unwrap_or(0);

    let entries = audit::get_audit_logs(&state.db, id, limit, offset).await?;

    Ok(Json(entries))
}
