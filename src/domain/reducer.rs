//! Representative-transaction reducer.
//!
//! Every read surface (buyer dashboard, seller dashboard, booking and
//! purchase lists, delivery tracking) answers "what is the current status
//! of this vehicle purchase?" through this one function. A vehicle
//! legitimately accumulates several attempt rows; counting raw rows is
//! always wrong.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::models::Transaction;
use crate::domain::TransactionStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Fully settled with no outstanding balance.
    Purchase,
    /// Payment in flight, or token received with a balance still owed.
    Booking,
    /// No classifiable live attempt.
    None,
}

#[derive(Debug, Clone, Serialize)]
pub struct Representative {
    pub transaction: Transaction,
    pub classification: Classification,
}

/// Collapse a scope's transaction history into one representative per
/// vehicle. Attempts in `payment_failed`, `cancelled`, or `refunded` are
/// excluded entirely; a vehicle with only such rows drops out.
pub fn reduce(transactions: Vec<Transaction>) -> HashMap<Uuid, Representative> {
    let mut winners: HashMap<Uuid, Transaction> = HashMap::new();

    for tx in transactions {
        if tx.status.is_invalid_attempt() {
            continue;
        }
        match winners.get(&tx.vehicle_id) {
            Some(incumbent) if !beats(&tx, incumbent) => {}
            _ => {
                winners.insert(tx.vehicle_id, tx);
            }
        }
    }

    winners
        .into_iter()
        .map(|(vehicle_id, transaction)| {
            let classification = classify(&transaction);
            (
                vehicle_id,
                Representative {
                    transaction,
                    classification,
                },
            )
        })
        .collect()
}

/// Strict priority chain deciding whether `candidate` replaces `incumbent`.
/// Each level only applies when every earlier level ties.
fn beats(candidate: &Transaction, incumbent: &Transaction) -> bool {
    // 1. A valid attempt always beats an invalid one. reduce() filters
    //    invalids up front, but callers merging pre-filtered slices from
    //    two sources still rely on this level.
    let cand_valid = !candidate.status.is_invalid_attempt();
    let inc_valid = !incumbent.status.is_invalid_attempt();
    if cand_valid != inc_valid {
        return cand_valid;
    }

    // 2. Fully settled beats anything still owing or in flight.
    let cand_settled = candidate.is_fully_settled();
    let inc_settled = incumbent.is_fully_settled();
    if cand_settled != inc_settled {
        return cand_settled;
    }

    // 3. Higher booking amount (missing treated as zero).
    let cand_booking = candidate.booking_or_zero();
    let inc_booking = incumbent.booking_or_zero();
    if cand_booking != inc_booking {
        return cand_booking > inc_booking;
    }

    // 4. Newer attempt wins.
    candidate.created_at > incumbent.created_at
}

fn classify(tx: &Transaction) -> Classification {
    if tx.is_fully_settled() {
        return Classification::Purchase;
    }
    match tx.status {
        TransactionStatus::Pending | TransactionStatus::PaymentInitiated => {
            Classification::Booking
        }
        TransactionStatus::Completed if tx.remaining_or_zero() > BigDecimal::from(0) => {
            Classification::Booking
        }
        _ => Classification::None,
    }
}
