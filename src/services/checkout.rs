use bigdecimal::BigDecimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::models::{CheckoutShape, Transaction};
use crate::db::queries;
use crate::domain::{PaymentType, TransactionStatus, VehicleStatus};
use crate::error::AppError;
use crate::gateway::GatewayClient;
use crate::services::lifecycle::LifecycleService;
use crate::validation;

/// A checkout accepted by the engine and registered with the gateway.
#[derive(Debug)]
pub struct InitiatedCheckout {
    pub transaction: Transaction,
    pub checkout_url: Option<String>,
}

/// Result of polling the gateway for a payment outcome. `confirmed == false`
/// means the gateway has not (yet) seen the money; the attempt stays open.
#[derive(Debug)]
pub struct VerifiedPayment {
    pub transaction: Transaction,
    pub confirmed: bool,
}

pub struct CheckoutService {
    pool: PgPool,
    gateway: GatewayClient,
}

impl CheckoutService {
    pub fn new(pool: PgPool, gateway: GatewayClient) -> Self {
        Self { pool, gateway }
    }

    /// Create the pending attempt row, then register it with the gateway.
    ///
    /// If the gateway call fails the row stays `pending` with no reference;
    /// the caller retries and a fresh checkout supersedes it in the reducer.
    pub async fn initiate_checkout(
        &self,
        buyer_id: Uuid,
        vehicle_id: Uuid,
        amount: BigDecimal,
        shape: CheckoutShape,
        payment_type: PaymentType,
    ) -> Result<InitiatedCheckout, AppError> {
        validation::validate_checkout_shape(&amount, &shape)?;

        let vehicle = queries::get_vehicle(&self.pool, vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Vehicle {} not found", vehicle_id)))?;

        if vehicle.status != VehicleStatus::Approved {
            return Err(AppError::Validation(format!(
                "vehicle {} is {} and not open for purchase",
                vehicle_id, vehicle.status
            )));
        }

        let tx = Transaction::new(
            vehicle.id,
            buyer_id,
            vehicle.seller_id,
            amount,
            &shape,
            payment_type,
        );
        let inserted = queries::insert_transaction(&self.pool, &tx).await?;

        if payment_type.is_manual_settlement() {
            // Money changes hands offline; the seller confirms receipt and
            // there is no gateway session to open.
            tracing::info!(
                "Manual checkout recorded for vehicle {} by buyer {}: transaction {}",
                vehicle.id,
                buyer_id,
                inserted.id
            );
            return Ok(InitiatedCheckout {
                transaction: inserted,
                checkout_url: None,
            });
        }

        let session = self
            .gateway
            .create_checkout(vehicle.id, buyer_id, &inserted.amount, payment_type)
            .await?;

        let updated = queries::set_gateway_reference(&self.pool, inserted.id, &session.reference)
            .await?;

        tracing::info!(
            "Checkout initiated for vehicle {} by buyer {}: transaction {}, gateway ref {}",
            vehicle.id,
            buyer_id,
            updated.id,
            session.reference
        );

        Ok(InitiatedCheckout {
            transaction: updated,
            checkout_url: session.checkout_url,
        })
    }

    /// Ask the gateway for the outcome of an in-flight attempt and apply it.
    ///
    /// Polling a terminal row never re-fires side effects, and an
    /// unconfirmed outcome leaves the row exactly as it was.
    pub async fn verify_payment(&self, tx_id: Uuid) -> Result<VerifiedPayment, AppError> {
        let tx = queries::get_transaction(&self.pool, tx_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {} not found", tx_id)))?;

        if tx.status.is_terminal() {
            let confirmed = tx.status == TransactionStatus::Completed;
            return Ok(VerifiedPayment {
                transaction: tx,
                confirmed,
            });
        }

        let reference = tx.gateway_reference.clone().ok_or_else(|| {
            AppError::Validation(format!(
                "transaction {} has no gateway checkout to verify",
                tx_id
            ))
        })?;

        let outcome = self.gateway.verify(&reference).await?;

        if !outcome.success {
            tracing::info!(
                "Gateway has not confirmed checkout {} yet, transaction {} stays {}",
                reference,
                tx_id,
                tx.status
            );
            return Ok(VerifiedPayment {
                transaction: tx,
                confirmed: false,
            });
        }

        if let Some(reported) = &outcome.amount {
            ensure_reported_amount(&tx, reported)?;
        }

        let lifecycle = LifecycleService::new(self.pool.clone());
        let updated = lifecycle
            .apply_status_change(tx_id, TransactionStatus::Completed, "gateway")
            .await?;

        Ok(VerifiedPayment {
            transaction: updated,
            confirmed: true,
        })
    }
}

/// The gateway's word on what was paid must match what this attempt charges.
/// A mismatch is never guessed around; the row stays untouched and the
/// operator investigates.
pub fn ensure_reported_amount(tx: &Transaction, reported: &str) -> Result<(), AppError> {
    let reported: BigDecimal = reported.parse().map_err(|_| {
        AppError::GatewayUnavailable(format!(
            "gateway reported an unparseable amount for transaction {}",
            tx.id
        ))
    })?;

    let expected = tx.expected_charge();
    if reported != expected {
        return Err(AppError::Inconsistent(format!(
            "gateway reports {} paid for transaction {} but the attempt charges {}",
            reported, tx.id, expected
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn booking_tx() -> Transaction {
        Transaction::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            BigDecimal::from_str("500000").unwrap(),
            &CheckoutShape::BookingToken {
                booking_amount: BigDecimal::from_str("50000").unwrap(),
            },
            crate::domain::PaymentType::AdvanceUpi,
        )
    }

    #[test]
    fn accepts_matching_gateway_amount() {
        let tx = booking_tx();
        assert!(ensure_reported_amount(&tx, "50000").is_ok());
        // Semantically equal decimals pass regardless of trailing zeros.
        assert!(ensure_reported_amount(&tx, "50000.00").is_ok());
    }

    #[test]
    fn rejects_mismatched_gateway_amount() {
        let tx = booking_tx();
        let result = ensure_reported_amount(&tx, "500000");
        assert!(matches!(result, Err(AppError::Inconsistent(_))));
    }

    #[test]
    fn rejects_garbage_gateway_amount() {
        let tx = booking_tx();
        let result = ensure_reported_amount(&tx, "fifty thousand");
        assert!(matches!(result, Err(AppError::GatewayUnavailable(_))));
    }
}
