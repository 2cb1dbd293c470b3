//! Delivery progression for a finalized sale.
//!
//! The canonical path is processing → inspection → documentation →
//! ready_for_collection → collected, but administrators may set any
//! forward or backward state explicitly; only the buyer-facing collection
//! confirmation is state-guarded.

use crate::domain::DeliveryStatus;
use crate::error::AppError;

/// Canonical progression order, used for reporting and backward-move logging.
pub const PROGRESSION: [DeliveryStatus; 5] = [
    DeliveryStatus::Processing,
    DeliveryStatus::Inspection,
    DeliveryStatus::Documentation,
    DeliveryStatus::ReadyForCollection,
    DeliveryStatus::Collected,
];

fn step_index(status: DeliveryStatus) -> usize {
    PROGRESSION
        .iter()
        .position(|s| *s == status)
        .unwrap_or(0)
}

/// Administrator transition: any target is accepted. Backward moves are
/// surfaced to the caller so they can be logged as corrections.
pub fn admin_set(current: Option<DeliveryStatus>, target: DeliveryStatus) -> AdminTransition {
    let backward = current
        .map(|c| step_index(target) < step_index(c))
        .unwrap_or(false);
    AdminTransition { target, backward }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminTransition {
    pub target: DeliveryStatus,
    pub backward: bool,
}

/// Buyer transition: legal only from `ready_for_collection`.
pub fn confirm_collection(current: Option<DeliveryStatus>) -> Result<DeliveryStatus, AppError> {
    match current {
        Some(DeliveryStatus::ReadyForCollection) => Ok(DeliveryStatus::Collected),
        Some(other) => Err(AppError::InvalidStateTransition(format!(
            "collection can be confirmed only when ready_for_collection, not {}",
            other
        ))),
        None => Err(AppError::InvalidStateTransition(
            "delivery has not started for this transaction".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_collection_requires_ready_state() {
        for blocked in [
            DeliveryStatus::Processing,
            DeliveryStatus::Inspection,
            DeliveryStatus::Documentation,
            DeliveryStatus::Collected,
        ] {
            let result = confirm_collection(Some(blocked));
            assert!(matches!(result, Err(AppError::InvalidStateTransition(_))));
        }

        assert_eq!(
            confirm_collection(Some(DeliveryStatus::ReadyForCollection)).unwrap(),
            DeliveryStatus::Collected
        );
    }

    #[test]
    fn confirm_collection_rejects_unstarted_delivery() {
        assert!(matches!(
            confirm_collection(None),
            Err(AppError::InvalidStateTransition(_))
        ));
    }

    #[test]
    fn admin_may_move_forward_or_backward() {
        let forward = admin_set(
            Some(DeliveryStatus::Processing),
            DeliveryStatus::Documentation,
        );
        assert_eq!(forward.target, DeliveryStatus::Documentation);
        assert!(!forward.backward);

        let backward = admin_set(
            Some(DeliveryStatus::ReadyForCollection),
            DeliveryStatus::Inspection,
        );
        assert_eq!(backward.target, DeliveryStatus::Inspection);
        assert!(backward.backward);
    }

    #[test]
    fn admin_set_from_unstarted_delivery_is_forward() {
        let t = admin_set(None, DeliveryStatus::Processing);
        assert!(!t.backward);
    }
}
