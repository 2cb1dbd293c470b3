//! Status vocabularies for the transaction lifecycle.
//! Framework-agnostic; persisted as Postgres enum types of the same name.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Money-side status of a payment attempt.
///
/// The upstream gateway vocabulary had both `payment_completed` and
/// `completed` for "money received"; they are collapsed into the single
/// stored value `completed`. The old spelling is still accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    PaymentInitiated,
    #[serde(alias = "payment_completed")]
    Completed,
    PaymentFailed,
    Cancelled,
    Refunded,
}

impl TransactionStatus {
    /// Terminal statuses are never transitioned out of.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Completed
                | TransactionStatus::Cancelled
                | TransactionStatus::Refunded
        )
    }

    /// Attempts in these statuses never represent a live purchase or booking.
    pub fn is_invalid_attempt(&self) -> bool {
        matches!(
            self,
            TransactionStatus::PaymentFailed
                | TransactionStatus::Cancelled
                | TransactionStatus::Refunded
        )
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::PaymentInitiated => "payment_initiated",
            TransactionStatus::Completed => "completed",
            TransactionStatus::PaymentFailed => "payment_failed",
            TransactionStatus::Cancelled => "cancelled",
            TransactionStatus::Refunded => "refunded",
        };
        f.write_str(s)
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TransactionStatus::Pending),
            "payment_initiated" => Ok(TransactionStatus::PaymentInitiated),
            "completed" | "payment_completed" => Ok(TransactionStatus::Completed),
            "payment_failed" => Ok(TransactionStatus::PaymentFailed),
            "cancelled" => Ok(TransactionStatus::Cancelled),
            "refunded" => Ok(TransactionStatus::Refunded),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

/// How the buyer pays. Informational except for the manual-settlement
/// types, which a seller may confirm without gateway verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    FullCard,
    AdvanceUpi,
    CashBooking,
    SplitQr,
    SplitCash,
}

impl PaymentType {
    /// Types a seller may settle manually, outside the gateway.
    pub fn is_manual_settlement(&self) -> bool {
        matches!(self, PaymentType::CashBooking | PaymentType::SplitCash)
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentType::FullCard => "full_card",
            PaymentType::AdvanceUpi => "advance_upi",
            PaymentType::CashBooking => "cash_booking",
            PaymentType::SplitQr => "split_qr",
            PaymentType::SplitCash => "split_cash",
        };
        f.write_str(s)
    }
}

/// What a payment attempt is for, decided at creation time.
///
/// Replaces the legacy convention of encoding "this is a balance payment"
/// as a textual zero in the booking amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_shape", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentShape {
    FullPayment,
    BookingToken,
    BalanceSettlement,
}

/// Post-sale delivery progression, administrator-driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "delivery_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Processing,
    Inspection,
    Documentation,
    ReadyForCollection,
    Collected,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DeliveryStatus::Processing => "processing",
            DeliveryStatus::Inspection => "inspection",
            DeliveryStatus::Documentation => "documentation",
            DeliveryStatus::ReadyForCollection => "ready_for_collection",
            DeliveryStatus::Collected => "collected",
        };
        f.write_str(s)
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(DeliveryStatus::Processing),
            "inspection" => Ok(DeliveryStatus::Inspection),
            "documentation" => Ok(DeliveryStatus::Documentation),
            "ready_for_collection" => Ok(DeliveryStatus::ReadyForCollection),
            "collected" => Ok(DeliveryStatus::Collected),
            other => Err(format!("unknown delivery status: {}", other)),
        }
    }
}

/// Listing status of the vehicle entity. The engine only ever writes `sold`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "vehicle_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    Pending,
    Approved,
    Rejected,
    Sold,
}

impl fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VehicleStatus::Pending => "pending",
            VehicleStatus::Approved => "approved",
            VehicleStatus::Rejected => "rejected",
            VehicleStatus::Sold => "sold",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(TransactionStatus::Completed.is_terminal());
        assert!(TransactionStatus::Cancelled.is_terminal());
        assert!(TransactionStatus::Refunded.is_terminal());
        assert!(!TransactionStatus::Pending.is_terminal());
        assert!(!TransactionStatus::PaymentInitiated.is_terminal());
        assert!(!TransactionStatus::PaymentFailed.is_terminal());
    }

    #[test]
    fn invalid_attempts() {
        assert!(TransactionStatus::PaymentFailed.is_invalid_attempt());
        assert!(TransactionStatus::Cancelled.is_invalid_attempt());
        assert!(TransactionStatus::Refunded.is_invalid_attempt());
        assert!(!TransactionStatus::Completed.is_invalid_attempt());
        assert!(!TransactionStatus::PaymentInitiated.is_invalid_attempt());
    }

    #[test]
    fn parses_legacy_completed_spelling() {
        assert_eq!(
            "payment_completed".parse::<TransactionStatus>().unwrap(),
            TransactionStatus::Completed
        );
        assert_eq!(
            "completed".parse::<TransactionStatus>().unwrap(),
            TransactionStatus::Completed
        );
        assert!("paid".parse::<TransactionStatus>().is_err());
    }

    #[test]
    fn serde_accepts_legacy_completed_alias() {
        let parsed: TransactionStatus =
            serde_json::from_str(r#""payment_completed""#).unwrap();
        assert_eq!(parsed, TransactionStatus::Completed);
        assert_eq!(
            serde_json::to_string(&TransactionStatus::Completed).unwrap(),
            r#""completed""#
        );
    }

    #[test]
    fn manual_settlement_types() {
        assert!(PaymentType::CashBooking.is_manual_settlement());
        assert!(PaymentType::SplitCash.is_manual_settlement());
        assert!(!PaymentType::FullCard.is_manual_settlement());
        assert!(!PaymentType::AdvanceUpi.is_manual_settlement());
        assert!(!PaymentType::SplitQr.is_manual_settlement());
    }

    #[test]
    fn delivery_status_round_trips_through_strings() {
        for status in [
            DeliveryStatus::Processing,
            DeliveryStatus::Inspection,
            DeliveryStatus::Documentation,
            DeliveryStatus::ReadyForCollection,
            DeliveryStatus::Collected,
        ] {
            assert_eq!(status.to_string().parse::<DeliveryStatus>().unwrap(), status);
        }
    }
}
