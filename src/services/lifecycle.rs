use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::audit::{AuditLog, ENTITY_TRANSACTION};
use crate::db::models::Transaction;
use crate::db::queries;
use crate::domain::policy::{self, Decision};
use crate::domain::TransactionStatus;
use crate::error::AppError;

/// Applies money-side status changes. The transaction patch and any vehicle
/// side effect commit in one database transaction or not at all; a settled
/// row with an unsold vehicle (or the reverse) must be impossible to produce.
pub struct LifecycleService {
    pool: PgPool,
}

impl LifecycleService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the transition policy for `incoming` against the stored row.
    ///
    /// The row is locked for the duration, so a webhook racing a client poll
    /// serializes: the loser re-reads the terminal row and no-ops.
    pub async fn apply_status_change(
        &self,
        tx_id: Uuid,
        incoming: TransactionStatus,
        actor: &str,
    ) -> Result<Transaction, AppError> {
        let mut db_tx = self.pool.begin().await?;

        let existing = queries::get_transaction_for_update(&mut db_tx, tx_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", tx_id)))?;

        match policy::apply_status_change(&existing, incoming, Utc::now())? {
            Decision::NoOp => {
                db_tx.rollback().await?;
                tracing::info!(
                    "Transaction {} already {}, redelivery ignored",
                    tx_id,
                    incoming
                );
                Ok(existing)
            }
            Decision::Apply {
                patch,
                vehicle_status,
            } => {
                let old_status = existing.status;
                let updated = queries::apply_transaction_patch(&mut db_tx, tx_id, &patch).await?;

                AuditLog::log_field_update(
                    &mut db_tx,
                    tx_id,
                    ENTITY_TRANSACTION,
                    "status",
                    json!(old_status),
                    json!(patch.status),
                    actor,
                )
                .await?;

                if let Some(new_status) = vehicle_status {
                    // Vehicle missing aborts the whole operation; the
                    // transaction patch above never commits on its own.
                    let vehicle =
                        queries::get_vehicle_for_update(&mut db_tx, existing.vehicle_id)
                            .await?
                            .ok_or_else(|| {
                                AppError::NotFound(format!(
                                    "Vehicle {} not found",
                                    existing.vehicle_id
                                ))
                            })?;

                    if vehicle.status != new_status {
                        queries::update_vehicle_status(
                            &mut db_tx,
                            vehicle.id,
                            vehicle.status,
                            new_status,
                            actor,
                        )
                        .await?;
                    }
                }

                db_tx.commit().await?;

                tracing::info!(
                    "Transaction {} moved {} -> {} by {}",
                    tx_id,
                    old_status,
                    patch.status,
                    actor
                );

                Ok(updated)
            }
        }
    }

    /// Seller confirmation for cash/manual settlement types. Money never
    /// touched the gateway, so there is nothing to verify; the seller's
    /// word finalizes the attempt.
    pub async fn confirm_booking(
        &self,
        tx_id: Uuid,
        seller_id: Uuid,
    ) -> Result<Transaction, AppError> {
        let tx = queries::get_transaction(&self.pool, tx_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", tx_id)))?;

        if tx.seller_id != seller_id {
            return Err(AppError::Forbidden(
                "only the seller may confirm this booking".to_string(),
            ));
        }

        if !tx.payment_type.is_manual_settlement() {
            return Err(AppError::Validation(format!(
                "payment type {} settles through the gateway, not manual confirmation",
                tx.payment_type
            )));
        }

        self.apply_status_change(tx_id, TransactionStatus::Completed, "seller")
            .await
    }
}
