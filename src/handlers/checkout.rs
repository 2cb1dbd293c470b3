use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::{CheckoutShape, Transaction};
use crate::domain::PaymentType;
use crate::error::AppError;
use crate::handlers::{Caller, Role};
use crate::services::checkout::CheckoutService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub vehicle_id: Uuid,
    pub amount: BigDecimal,
    pub payment_type: PaymentType,
    #[serde(default)]
    pub shape: CheckoutShape,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub transaction: Transaction,
    pub checkout_url: Option<String>,
}

pub async fn initiate_checkout(
    State(state): State<AppState>,
    caller: Caller,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, AppError> {
    if caller.role != Role::Buyer {
        return Err(AppError::Forbidden(
            "only buyers may start a checkout".to_string(),
        ));
    }

    let service = CheckoutService::new(state.db.clone(), state.gateway.clone());
    let initiated = service
        .initiate_checkout(
            caller.user_id,
            payload.vehicle_id,
            payload.amount,
            payload.shape,
            payload.payment_type,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CheckoutResponse {
            transaction: initiated.transaction,
            checkout_url: initiated.checkout_url,
        }),
    ))
}
