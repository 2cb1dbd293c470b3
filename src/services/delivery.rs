use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::audit::{AuditLog, ENTITY_TRANSACTION};
use crate::db::models::Transaction;
use crate::db::queries;
use crate::domain::delivery;
use crate::domain::DeliveryStatus;
use crate::error::AppError;
use crate::validation;

/// Post-sale delivery progression. Independent of the money machine once a
/// sale is finalized; only administrators drive it, except for the buyer's
/// collection confirmation.
pub struct DeliveryService {
    pool: PgPool,
}

impl DeliveryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn admin_update(
        &self,
        tx_id: Uuid,
        target: DeliveryStatus,
        estimated_ready_date: Option<DateTime<Utc>>,
        notes: Option<String>,
    ) -> Result<Transaction, AppError> {
        if let Some(notes) = &notes {
            validation::validate_max_len(
                "delivery_notes",
                notes,
                validation::DELIVERY_NOTES_MAX_LEN,
            )?;
        }

        let mut db_tx = self.pool.begin().await?;

        let tx = queries::get_transaction_for_update(&mut db_tx, tx_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", tx_id)))?;

        if !tx.is_fully_settled() {
            return Err(AppError::InvalidStateTransition(format!(
                "delivery tracking starts after settlement; transaction {} is {}",
                tx_id, tx.status
            )));
        }

        let transition = delivery::admin_set(tx.delivery_status, target);
        if transition.backward {
            tracing::warn!(
                "Delivery for transaction {} moved backward from {:?} to {}",
                tx_id,
                tx.delivery_status,
                target
            );
        }

        let updated = queries::update_delivery(
            &mut db_tx,
            tx_id,
            transition.target,
            estimated_ready_date,
            notes.as_deref(),
        )
        .await?;

        AuditLog::log_field_update(
            &mut db_tx,
            tx_id,
            ENTITY_TRANSACTION,
            "delivery_status",
            json!(tx.delivery_status),
            json!(transition.target),
            "admin",
        )
        .await?;

        db_tx.commit().await?;
        Ok(updated)
    }

    pub async fn confirm_collection(
        &self,
        tx_id: Uuid,
        buyer_id: Uuid,
    ) -> Result<Transaction, AppError> {
        let mut db_tx = self.pool.begin().await?;

        let tx = queries::get_transaction_for_update(&mut db_tx, tx_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", tx_id)))?;

        if tx.buyer_id != buyer_id {
            return Err(AppError::Forbidden(
                "only the buyer may confirm collection".to_string(),
            ));
        }

        delivery::confirm_collection(tx.delivery_status)?;

        let now = Utc::now();
        let updated = queries::set_collected(&mut db_tx, tx_id, now).await?;

        AuditLog::log_field_update(
            &mut db_tx,
            tx_id,
            ENTITY_TRANSACTION,
            "delivery_status",
            json!(tx.delivery_status),
            json!(DeliveryStatus::Collected),
            "buyer",
        )
        .await?;

        db_tx.commit().await?;

        tracing::info!("Vehicle collected for transaction {}", tx_id);
        Ok(updated)
    }
}
