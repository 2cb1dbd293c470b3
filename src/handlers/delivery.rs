use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::{Caller, Role};
use crate::services::delivery::DeliveryService;
use crate::AppState;

/// Buyer picks the vehicle up. Legal only once an administrator has marked
/// the delivery ready for collection.
pub async fn confirm_collection(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if caller.role != Role::Buyer {
        return Err(AppError::Forbidden(
            "only the buyer may confirm collection".to_string(),
        ));
    }

    let service = DeliveryService::new(state.db.clone());
    let updated = service.confirm_collection(id, caller.user_id).await?;

    Ok(Json(updated))
}
