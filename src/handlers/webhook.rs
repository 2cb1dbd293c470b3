use axum::{
    Json,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::domain::TransactionStatus;
use crate::error::AppError;
use crate::services::checkout::ensure_reported_amount;
use crate::services::lifecycle::LifecycleService;
use crate::AppState;

/// Gateway callback for a checkout it has finished processing. Delivery is
/// at-least-once; redelivered outcomes no-op against the terminal row.
#[derive(Debug, Deserialize, Serialize)]
pub struct CallbackPayload {
    pub reference: String,
    pub success: bool,
    /// Decimal string, as the gateway reports it.
    pub amount: Option<String>,
    pub method: Option<String>,
}

pub async fn callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CallbackPayload>,
) -> Result<impl IntoResponse, AppError> {
    let sig = headers
        .get("x-gateway-signature")
        .and_then(|h| h.to_str().ok());

    if sig != Some(state.webhook_secret.as_str()) {
        return Err(AppError::Forbidden("invalid gateway signature".to_string()));
    }

    let tx = queries::get_transaction_by_gateway_reference(&state.db, &payload.reference)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "No transaction for gateway reference {}",
                payload.reference
            ))
        })?;

    let incoming = if payload.success {
        if let Some(reported) = &payload.amount {
            if !tx.status.is_terminal() {
                ensure_reported_amount(&tx, reported)?;
            }
        }
        TransactionStatus::Completed
    } else {
        TransactionStatus::PaymentFailed
    };

    let lifecycle = LifecycleService::new(state.db.clone());
    let updated = lifecycle.apply_status_change(tx.id, incoming, "gateway").await?;

    Ok(Json(updated))
}
