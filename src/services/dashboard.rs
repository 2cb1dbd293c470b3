use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::Transaction;
use crate::db::queries;
use crate::domain::reducer::{self, Classification};
use crate::error::AppError;

/// One vehicle's current standing for a viewer, as decided by the reducer.
#[derive(Debug, Serialize)]
pub struct VehicleDeal {
    pub vehicle_id: Uuid,
    pub classification: Classification,
    pub transaction: Transaction,
}

#[derive(Debug, Serialize)]
pub struct DealSummary {
    pub deals: Vec<VehicleDeal>,
    pub purchased: usize,
    pub active_bookings: usize,
}

/// Read surfaces for buyers and sellers. Counts always come from the
/// reducer; a vehicle bought through a failed retry, a booking, and a
/// balance settlement is still one purchase.
pub struct DashboardService {
    pool: PgPool,
}

impl DashboardService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_my_purchases(&self, buyer_id: Uuid) -> Result<DealSummary, AppError> {
        let rows = queries::list_by_buyer(&self.pool, buyer_id).await?;
        Ok(summarize(rows))
    }

    pub async fn list_my_sales(&self, seller_id: Uuid) -> Result<DealSummary, AppError> {
        let rows = queries::list_by_seller(&self.pool, seller_id).await?;
        Ok(summarize(rows))
    }
}

fn summarize(rows: Vec<Transaction>) -> DealSummary {
    let mut deals: Vec<VehicleDeal> = reducer::reduce(rows)
        .into_iter()
        .map(|(vehicle_id, rep)| VehicleDeal {
            vehicle_id,
            classification: rep.classification,
            transaction: rep.transaction,
        })
        .collect();

    // Newest activity first; map iteration order is arbitrary.
    deals.sort_by(|a, b| b.transaction.created_at.cmp(&a.transaction.created_at));

    let purchased = deals
        .iter()
        .filter(|d| d.classification == Classification::Purchase)
        .count();
    let active_bookings = deals
        .iter()
        .filter(|d| d.classification == Classification::Booking)
        .count();

    DealSummary {
        deals,
        purchased,
        active_bookings,
    }
}
