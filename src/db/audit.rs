//! Append-only audit trail, written in the same database transaction as
//! the mutation it records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction as SqlxTransaction};
use uuid::Uuid;

pub const ENTITY_TRANSACTION: &str = "transaction";
pub const ENTITY_VEHICLE: &str = "vehicle";

pub struct AuditLog;

impl AuditLog {
    pub async fn log_creation(
        executor: &mut SqlxTransaction<'_, Postgres>,
        entity_id: Uuid,
        entity_type: &str,
        new_val: serde_json::Value,
        actor: &str,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, entity_id, entity_type, action, new_val, actor)
            VALUES ($1, $2, $3, 'created', $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entity_id)
        .bind(entity_type)
        .bind(new_val)
        .bind(actor)
        .execute(&mut **executor)
        .await?;

        Ok(())
    }

    pub async fn log_field_update(
        executor: &mut SqlxTransaction<'_, Postgres>,
        entity_id: Uuid,
        entity_type: &str,
        field: &str,
        old_val: serde_json::Value,
        new_val: serde_json::Value,
        actor: &str,
    ) -> sqlx::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, entity_id, entity_type, action, field, old_val, new_val, actor)
            VALUES ($1, $2, $3, 'updated', $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entity_id)
        .bind(entity_type)
        .bind(field)
        .bind(old_val)
        .bind(new_val)
        .bind(actor)
        .execute(&mut **executor)
        .await?;

        Ok(())
    }
}

#[derive(Debug, sqlx::FromRow, Serialize)]
pub struct AuditEntry {
    pub id: Uuid,
    pub entity_id: Uuid,
    pub entity_type: String,
    pub action: String,
    pub field: Option<String>,
    pub old_val: Option<serde_json::Value>,
    pub new_val: Option<serde_json::Value>,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
}

pub async fn get_audit_logs(
    pool: &PgPool,
    entity_id: Uuid,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<AuditEntry>> {
    sqlx::query_as::<_, AuditEntry>(
        r#"
        SELECT id, entity_id, entity_type, action, field, old_val, new_val, actor, timestamp
        FROM audit_logs
        WHERE entity_id = $1
        ORDER BY timestamp DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(entity_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}
