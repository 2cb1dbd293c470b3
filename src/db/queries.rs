use sqlx::{PgPool, Postgres, Result, Transaction as SqlxTransaction};
use chrono::{DateTime, Utc};
use serde_json::json;
use uuid::Uuid;

use crate::db::audit::{AuditLog, ENTITY_TRANSACTION, ENTITY_VEHICLE};
use crate::db::models::{Transaction, Vehicle};
use crate::domain::{DeliveryStatus, TransactionStatus, VehicleStatus};
use crate::domain::policy::TransactionPatch;

// --- Transaction queries ---

pub async fn insert_transaction(pool: &PgPool, tx: &Transaction) -> Result<Transaction> {
    let mut db_tx = pool.begin().await?;

    let result = sqlx::query_as::<_, Transaction>(
        r#"
        INSERT INTO transactions (
            id, vehicle_id, buyer_id, seller_id, amount, booking_amount, remaining_amount,
            status, payment_type, payment_shape, delivery_status, estimated_ready_date,
            delivery_notes, collected_at, gateway_reference, created_at, updated_at
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
        RETURNING *
        "#,
    )
    .bind(tx.id)
    .bind(tx.vehicle_id)
    .bind(tx.buyer_id)
    .bind(tx.seller_id)
    .bind(&tx.amount)
    .bind(&tx.booking_amount)
    .bind(&tx.remaining_amount)
    .bind(tx.status)
    .bind(tx.payment_type)
    .bind(tx.payment_shape)
    .bind(tx.delivery_status)
    .bind(tx.estimated_ready_date)
    .bind(&tx.delivery_notes)
    .bind(tx.collected_at)
    .bind(&tx.gateway_reference)
    .bind(tx.created_at)
    .bind(tx.updated_at)
    .fetch_one(&mut *db_tx)
    .await?;

    // Audit log: payment attempt created
    AuditLog::log_creation(
        &mut db_tx,
        result.id,
        ENTITY_TRANSACTION,
        json!({
            "vehicle_id": result.vehicle_id,
            "buyer_id": result.buyer_id,
            "seller_id": result.seller_id,
            "amount": result.amount.to_string(),
            "booking_amount": result.booking_amount.as_ref().map(|a| a.to_string()),
            "remaining_amount": result.remaining_amount.as_ref().map(|a| a.to_string()),
            "status": result.status,
            "payment_type": result.payment_type,
            "payment_shape": result.payment_shape,
        }),
        "system",
    )
    .await?;

    db_tx.commit().await?;
    Ok(result)
}

pub async fn get_transaction(pool: &PgPool, id: Uuid) -> Result<Option<Transaction>> {
    sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_transaction_by_gateway_reference(
    pool: &PgPool,
    reference: &str,
) -> Result<Option<Transaction>> {
    sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE gateway_reference = $1",
    )
    .bind(reference)
    .fetch_optional(pool)
    .await
}

/// Locks the row for the rest of the enclosing database transaction, so
/// concurrent status applications serialize instead of racing.
pub async fn get_transaction_for_update(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<Transaction>> {
    sqlx::query_as::<_, Transaction>("SELECT * FROM transactions WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **executor)
        .await
}

pub async fn list_by_buyer(pool: &PgPool, buyer_id: Uuid) -> Result<Vec<Transaction>> {
    sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE buyer_id = $1 ORDER BY created_at DESC",
    )
    .bind(buyer_id)
    .fetch_all(pool)
    .await
}

pub async fn list_by_seller(pool: &PgPool, seller_id: Uuid) -> Result<Vec<Transaction>> {
    sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE seller_id = $1 ORDER BY created_at DESC",
    )
    .bind(seller_id)
    .fetch_all(pool)
    .await
}

pub async fn list_by_vehicle(pool: &PgPool, vehicle_id: Uuid) -> Result<Vec<Transaction>> {
    sqlx::query_as::<_, Transaction>(
        "SELECT * FROM transactions WHERE vehicle_id = $1 ORDER BY created_at DESC",
    )
    .bind(vehicle_id)
    .fetch_all(pool)
    .await
}

/// Applies a policy patch. `None` fields keep their stored value.
pub async fn apply_transaction_patch(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
    patch: &TransactionPatch,
) -> Result<Transaction> {
    sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions SET
            status = $2,
            remaining_amount = COALESCE($3, remaining_amount),
            delivery_status = COALESCE($4, delivery_status),
            estimated_ready_date = COALESCE($5, estimated_ready_date),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(patch.status)
    .bind(&patch.remaining_amount)
    .bind(patch.delivery_status)
    .bind(patch.estimated_ready_date)
    .fetch_one(&mut **executor)
    .await
}

/// Records the gateway session and marks the attempt as in flight.
pub async fn set_gateway_reference(
    pool: &PgPool,
    id: Uuid,
    reference: &str,
) -> Result<Transaction> {
    sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions SET
            gateway_reference = $2,
            status = $3,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(reference)
    .bind(TransactionStatus::PaymentInitiated)
    .fetch_one(pool)
    .await
}

pub async fn update_delivery(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
    target: DeliveryStatus,
    estimated_ready_date: Option<DateTime<Utc>>,
    notes: Option<&str>,
) -> Result<Transaction> {
    sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions SET
            delivery_status = $2,
            estimated_ready_date = COALESCE($3, estimated_ready_date),
            delivery_notes = COALESCE($4, delivery_notes),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(target)
    .bind(estimated_ready_date)
    .bind(notes)
    .fetch_one(&mut **executor)
    .await
}

pub async fn set_collected(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
    collected_at: DateTime<Utc>,
) -> Result<Transaction> {
    sqlx::query_as::<_, Transaction>(
        r#"
        UPDATE transactions SET
            delivery_status = $2,
            collected_at = $3,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(DeliveryStatus::Collected)
    .bind(collected_at)
    .fetch_one(&mut **executor)
    .await
}

// --- Vehicle queries ---

pub async fn insert_vehicle(pool: &PgPool, vehicle: &Vehicle) -> Result<Vehicle> {
    sqlx::query_as::<_, Vehicle>(
        r#"
        INSERT INTO vehicles (id, seller_id, title, price, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(vehicle.id)
    .bind(vehicle.seller_id)
    .bind(&vehicle.title)
    .bind(&vehicle.price)
    .bind(vehicle.status)
    .bind(vehicle.created_at)
    .bind(vehicle.updated_at)
    .fetch_one(pool)
    .await
}

pub async fn get_vehicle(pool: &PgPool, id: Uuid) -> Result<Option<Vehicle>> {
    sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_vehicle_for_update(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
) -> Result<Option<Vehicle>> {
    sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut **executor)
        .await
}

pub async fn update_vehicle_status(
    executor: &mut SqlxTransaction<'_, Postgres>,
    id: Uuid,
    old_status: VehicleStatus,
    new_status: VehicleStatus,
    actor: &str,
) -> Result<Vehicle> {
    let vehicle = sqlx::query_as::<_, Vehicle>(
        "UPDATE vehicles SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(new_status)
    .fetch_one(&mut **executor)
    .await?;

    // Audit log: vehicle status moved as a sale side effect
    AuditLog::log_field_update(
        executor,
        id,
        ENTITY_VEHICLE,
        "status",
        json!(old_status),
        json!(new_status),
        actor,
    )
    .await?;

    Ok(vehicle)
}
