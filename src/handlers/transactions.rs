use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Serialize;
use uuid::Uuid;

use crate::db::models::Transaction;
use crate::db::queries;
use crate::error::AppError;
use crate::handlers::{Caller, Role};
use crate::services::checkout::CheckoutService;
use crate::services::dashboard::DashboardService;
use crate::services::lifecycle::LifecycleService;
use crate::AppState;

pub async fn get_transaction(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let tx = queries::get_transaction(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;

    ensure_party(&caller, &tx)?;

    Ok(Json(tx))
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub confirmed: bool,
    pub message: String,
    pub transaction: Transaction,
}

/// Client-side poll racing the webhook. Ambiguous outcomes read as "still
/// pending"; gateway callbacks are eventually consistent.
pub async fn verify_payment(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let tx = queries::get_transaction(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", id)))?;

    if caller.role != Role::Admin && caller.user_id != tx.buyer_id {
        return Err(AppError::Forbidden(
            "only the buyer may verify this payment".to_string(),
        ));
    }

    let service = CheckoutService::new(state.db.clone(), state.gateway.clone());
    let verified = service.verify_payment(id).await?;

    let message = if verified.confirmed {
        "payment confirmed".to_string()
    } else {
        "payment still pending".to_string()
    };

    Ok(Json(VerifyResponse {
        confirmed: verified.confirmed,
        message,
        transaction: verified.transaction,
    }))
}

/// Seller confirmation for cash and other manual settlement paths.
pub async fn confirm_booking(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if caller.role != Role::Seller {
        return Err(AppError::Forbidden(
            "only sellers may confirm a booking".to_string(),
        ));
    }

    let lifecycle = LifecycleService::new(state.db.clone());
    let updated = lifecycle.confirm_booking(id, caller.user_id).await?;

    Ok(Json(updated))
}

pub async fn list_my_purchases(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse, AppError> {
    let service = DashboardService::new(state.db.clone());
    let summary = service.list_my_purchases(caller.user_id).await?;

    Ok(Json(summary))
}

pub async fn list_my_sales(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<impl IntoResponse, AppError> {
    let service = DashboardService::new(state.db.clone());
    let summary = service.list_my_sales(caller.user_id).await?;

    Ok(Json(summary))
}

fn ensure_party(caller: &Caller, tx: &Transaction) -> Result<(), AppError> {
    if caller.role == Role::Admin
        || caller.user_id == tx.buyer_id
        || caller.user_id == tx.seller_id
    {
        return Ok(());
    }
    Err(AppError::Forbidden(
        "not a party to this transaction".to_string(),
    ))
}
