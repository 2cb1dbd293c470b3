//! Transition policy for the money side of a transaction.
//!
//! Pure decision function: given the stored attempt and an incoming status,
//! compute the field patch and any required vehicle side effect. Callers
//! commit both in a single database transaction.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Duration, Utc};

use crate::db::models::Transaction;
use crate::domain::{DeliveryStatus, PaymentShape, TransactionStatus, VehicleStatus};
use crate::error::AppError;

/// Days between settlement and the default collection-ready estimate.
const READY_ESTIMATE_DAYS: i64 = 7;

/// Field updates to apply to the transaction row. `None` leaves the
/// stored value untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionPatch {
    pub status: TransactionStatus,
    pub remaining_amount: Option<BigDecimal>,
    pub delivery_status: Option<DeliveryStatus>,
    pub estimated_ready_date: Option<DateTime<Utc>>,
}

impl TransactionPatch {
    fn status_only(status: TransactionStatus) -> Self {
        Self {
            status,
            remaining_amount: None,
            delivery_status: None,
            estimated_ready_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The status is already applied; nothing to write, no side effects.
    NoOp,
    Apply {
        patch: TransactionPatch,
        vehicle_status: Option<VehicleStatus>,
    },
}

/// Decide how an incoming status applies to `existing`.
///
/// Re-applying the terminal status a row already carries is a no-op, so
/// a webhook racing a client poll cannot double-fire the sold side effect.
/// Any other write to a terminal row is rejected.
pub fn apply_status_change(
    existing: &Transaction,
    incoming: TransactionStatus,
    now: DateTime<Utc>,
) -> Result<Decision, AppError> {
    if existing.status.is_terminal() {
        if incoming == existing.status {
            return Ok(Decision::NoOp);
        }
        return Err(AppError::InvalidStateTransition(format!(
            "transaction {} is {} and cannot move to {}",
            existing.id, existing.status, incoming
        )));
    }

    if incoming != TransactionStatus::Completed {
        // Straight status write: no amount or vehicle side effects. A vehicle
        // already marked sold is reverted only by an explicit admin action.
        return Ok(Decision::Apply {
            patch: TransactionPatch::status_only(incoming),
            vehicle_status: None,
        });
    }

    let confirms_booking_only = existing.payment_shape == PaymentShape::BookingToken
        && existing.remaining_or_zero() > BigDecimal::from(0);

    if confirms_booking_only {
        // Token payment received; the buyer still owes the balance. The
        // vehicle stays listed and delivery tracking does not start.
        return Ok(Decision::Apply {
            patch: TransactionPatch::status_only(TransactionStatus::Completed),
            vehicle_status: None,
        });
    }

    // Full direct payment or explicit balance settlement: the sale is final.
    Ok(Decision::Apply {
        patch: TransactionPatch {
            status: TransactionStatus::Completed,
            remaining_amount: Some(BigDecimal::from(0)),
            delivery_status: match existing.delivery_status {
                Some(_) => None,
                None => Some(DeliveryStatus::Processing),
            },
            estimated_ready_date: Some(now + Duration::days(READY_ESTIMATE_DAYS)),
        },
        vehicle_status: Some(VehicleStatus::Sold),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::CheckoutShape;
    use crate::domain::PaymentType;
    use std::str::FromStr;
    use uuid::Uuid;

    fn booking_tx() -> Transaction {
        Transaction::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            BigDecimal::from_str("500000").unwrap(),
            &CheckoutShape::BookingToken {
                booking_amount: BigDecimal::from_str("50000").unwrap(),
            },
            PaymentType::AdvanceUpi,
        )
    }

    fn full_tx() -> Transaction {
        Transaction::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            BigDecimal::from(750000),
            &CheckoutShape::FullPayment,
            PaymentType::FullCard,
        )
    }

    fn balance_tx() -> Transaction {
        Transaction::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            BigDecimal::from(500000),
            &CheckoutShape::BalanceSettlement {
                outstanding: BigDecimal::from(450000),
            },
            PaymentType::SplitQr,
        )
    }

    #[test]
    fn booking_payment_confirms_without_selling_vehicle() {
        let tx = booking_tx();
        let decision =
            apply_status_change(&tx, TransactionStatus::Completed, Utc::now()).unwrap();

        match decision {
            Decision::Apply {
                patch,
                vehicle_status,
            } => {
                assert_eq!(patch.status, TransactionStatus::Completed);
                assert!(patch.remaining_amount.is_none(), "balance must stay owed");
                assert!(patch.delivery_status.is_none());
                assert!(patch.estimated_ready_date.is_none());
                assert!(vehicle_status.is_none(), "vehicle must stay listed");
            }
            other => panic!("expected Apply, got {:?}", other),
        }
    }

    #[test]
    fn full_payment_finalizes_sale() {
        let tx = full_tx();
        let now = Utc::now();
        let decision = apply_status_change(&tx, TransactionStatus::Completed, now).unwrap();

        match decision {
            Decision::Apply {
                patch,
                vehicle_status,
            } => {
                assert_eq!(patch.status, TransactionStatus::Completed);
                assert_eq!(patch.remaining_amount, Some(BigDecimal::from(0)));
                assert_eq!(patch.delivery_status, Some(DeliveryStatus::Processing));
                assert_eq!(
                    patch.estimated_ready_date,
                    Some(now + Duration::days(READY_ESTIMATE_DAYS))
                );
                assert_eq!(vehicle_status, Some(VehicleStatus::Sold));
            }
            other => panic!("expected Apply, got {:?}", other),
        }
    }

    #[test]
    fn balance_settlement_finalizes_sale() {
        let tx = balance_tx();
        let decision =
            apply_status_change(&tx, TransactionStatus::Completed, Utc::now()).unwrap();

        match decision {
            Decision::Apply {
                patch,
                vehicle_status,
            } => {
                assert_eq!(patch.remaining_amount, Some(BigDecimal::from(0)));
                assert_eq!(vehicle_status, Some(VehicleStatus::Sold));
            }
            other => panic!("expected Apply, got {:?}", other),
        }
    }

    #[test]
    fn settlement_keeps_existing_delivery_state() {
        let mut tx = balance_tx();
        tx.delivery_status = Some(DeliveryStatus::Inspection);

        let decision =
            apply_status_change(&tx, TransactionStatus::Completed, Utc::now()).unwrap();

        match decision {
            Decision::Apply { patch, .. } => {
                assert!(
                    patch.delivery_status.is_none(),
                    "an already-progressed delivery must not reset to processing"
                );
            }
            other => panic!("expected Apply, got {:?}", other),
        }
    }

    #[test]
    fn reapplying_terminal_status_is_noop() {
        let mut tx = full_tx();
        tx.status = TransactionStatus::Completed;
        tx.remaining_amount = Some(BigDecimal::from(0));

        let decision =
            apply_status_change(&tx, TransactionStatus::Completed, Utc::now()).unwrap();
        assert_eq!(decision, Decision::NoOp);
    }

    #[test]
    fn terminal_rows_reject_other_statuses() {
        for terminal in [
            TransactionStatus::Completed,
            TransactionStatus::Cancelled,
            TransactionStatus::Refunded,
        ] {
            let mut tx = full_tx();
            tx.status = terminal;

            let result = apply_status_change(&tx, TransactionStatus::Pending, Utc::now());
            assert!(matches!(
                result,
                Err(AppError::InvalidStateTransition(_))
            ));
        }
    }

    #[test]
    fn failure_statuses_write_through_without_side_effects() {
        for incoming in [
            TransactionStatus::PaymentFailed,
            TransactionStatus::Cancelled,
            TransactionStatus::Refunded,
            TransactionStatus::PaymentInitiated,
        ] {
            let tx = booking_tx();
            let decision = apply_status_change(&tx, incoming, Utc::now()).unwrap();

            match decision {
                Decision::Apply {
                    patch,
                    vehicle_status,
                } => {
                    assert_eq!(patch.status, incoming);
                    assert!(patch.remaining_amount.is_none());
                    assert!(patch.delivery_status.is_none());
                    assert!(patch.estimated_ready_date.is_none());
                    assert!(vehicle_status.is_none());
                }
                other => panic!("expected Apply, got {:?}", other),
            }
        }
    }

    #[test]
    fn settled_amounts_reconcile() {
        // booking + remaining must equal the agreed price on any settled
        // attempt the policy produces with both fields present.
        let tx = booking_tx();
        let booking = tx.booking_or_zero();
        let remaining = tx.remaining_or_zero();
        assert_eq!(booking + remaining, tx.amount);
    }
}
