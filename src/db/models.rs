use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{
    DeliveryStatus, PaymentShape, PaymentType, TransactionStatus, VehicleStatus,
};

/// One row per payment attempt. A vehicle may accumulate several of these:
/// a failed retry, a booking token, then a balance settlement.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub amount: BigDecimal,
    pub booking_amount: Option<BigDecimal>,
    pub remaining_amount: Option<BigDecimal>,
    pub status: TransactionStatus,
    pub payment_type: PaymentType,
    pub payment_shape: PaymentShape,
    pub delivery_status: Option<DeliveryStatus>,
    pub estimated_ready_date: Option<DateTime<Utc>>,
    pub delivery_notes: Option<String>,
    pub collected_at: Option<DateTime<Utc>>,
    pub gateway_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What a checkout pays for, stated explicitly by the initiator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckoutShape {
    /// The full agreed price in one payment.
    FullPayment,
    /// A partial token payment reserving the vehicle.
    BookingToken { booking_amount: BigDecimal },
    /// The balance still owed after an earlier booking.
    BalanceSettlement { outstanding: BigDecimal },
}

impl Default for CheckoutShape {
    fn default() -> Self {
        CheckoutShape::FullPayment
    }
}

impl Transaction {
    pub fn new(
        vehicle_id: Uuid,
        buyer_id: Uuid,
        seller_id: Uuid,
        amount: BigDecimal,
        shape: &CheckoutShape,
        payment_type: PaymentType,
    ) -> Self {
        let (payment_shape, booking_amount, remaining_amount) = match shape {
            CheckoutShape::FullPayment => (PaymentShape::FullPayment, None, None),
            CheckoutShape::BookingToken { booking_amount } => (
                PaymentShape::BookingToken,
                Some(booking_amount.clone()),
                Some(&amount - booking_amount),
            ),
            CheckoutShape::BalanceSettlement { outstanding } => (
                PaymentShape::BalanceSettlement,
                None,
                Some(outstanding.clone()),
            ),
        };

        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            vehicle_id,
            buyer_id,
            seller_id,
            amount,
            booking_amount,
            remaining_amount,
            status: TransactionStatus::Pending,
            payment_type,
            payment_shape,
            delivery_status: None,
            estimated_ready_date: None,
            delivery_notes: None,
            collected_at: None,
            gateway_reference: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Money received and nothing left to pay on this attempt.
    pub fn is_fully_settled(&self) -> bool {
        self.status == TransactionStatus::Completed
            && self
                .remaining_amount
                .as_ref()
                .map_or(true, |r| r <= &BigDecimal::from(0))
    }

    pub fn booking_or_zero(&self) -> BigDecimal {
        self.booking_amount
            .clone()
            .unwrap_or_else(|| BigDecimal::from(0))
    }

    pub fn remaining_or_zero(&self) -> BigDecimal {
        self.remaining_amount
            .clone()
            .unwrap_or_else(|| BigDecimal::from(0))
    }

    /// The amount the gateway is expected to collect for this attempt.
    pub fn expected_charge(&self) -> BigDecimal {
        match self.payment_shape {
            PaymentShape::FullPayment => self.amount.clone(),
            PaymentShape::BookingToken => self.booking_or_zero(),
            PaymentShape::BalanceSettlement => self.remaining_or_zero(),
        }
    }
}

/// Minimal mirror of the externally owned vehicle listing.
/// The engine reads it and mutates only `status`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub title: String,
    pub price: BigDecimal,
    pub status: VehicleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Vehicle {
    pub fn new(seller_id: Uuid, title: String, price: BigDecimal, status: VehicleStatus) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            seller_id,
            title,
            price,
            status,
            created_at: now,
            updated_at: now,
        }
    }
}
