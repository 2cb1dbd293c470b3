use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::PaymentType;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Checkout reference not found: {0}")]
    ReferenceNotFound(String),
    #[error("Checkout rejected: {0}")]
    CheckoutRejected(String),
    #[error("Invalid response from gateway: {0}")]
    InvalidResponse(String),
    #[error("Circuit breaker open: {0}")]
    CircuitBreakerOpen(String),
}

#[derive(Debug, Serialize)]
struct CreateCheckoutBody {
    vehicle_id: Uuid,
    buyer_id: Uuid,
    /// Decimal string; the gateway is told the exact minor-unit-safe amount.
    amount: String,
    payment_type: PaymentType,
}

/// Checkout intent created at the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub reference: String,
    pub checkout_url: Option<String>,
}

/// Outcome of asking the gateway about a checkout. `success == false` means
/// "not confirmed yet", not "failed"; explicit failures arrive via webhook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub success: bool,
    pub amount: Option<String>,
    pub method: Option<String>,
}

/// HTTP client for the payment gateway.
#[derive(Clone)]
pub struct GatewayClient {
    client: Client,
    base_url: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl GatewayClient {
    /// Creates a new GatewayClient with the specified base URL
    pub fn new(base_url: String) -> Self {
        Self::with_circuit_breaker(base_url, 3, 60)
    }

    /// Creates a new GatewayClient with custom circuit breaker configuration
    pub fn with_circuit_breaker(
        base_url: String,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs * 2),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        GatewayClient {
            client,
            base_url,
            circuit_breaker,
        }
    }

    /// Returns the current state of the circuit breaker
    pub fn circuit_state(&self) -> String {
        if self.circuit_breaker.is_call_permitted() {
            "closed".to_string()
        } else {
            "open".to_string()
        }
    }

    /// Creates a checkout intent for a payment attempt.
    pub async fn create_checkout(
        &self,
        vehicle_id: Uuid,
        buyer_id: Uuid,
        amount: &bigdecimal::BigDecimal,
        payment_type: PaymentType,
    ) -> Result<CheckoutSession, GatewayError> {
        let url = format!("{}/checkouts", self.base_url.trim_end_matches('/'));
        let client = self.client.clone();
        let body = CreateCheckoutBody {
            vehicle_id,
            buyer_id,
            amount: amount.to_string(),
            payment_type,
        };

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client.post(&url).json(&body).send().await?;

                if response.status().is_client_error() {
                    let detail = response.text().await.unwrap_or_default();
                    return Err(GatewayError::CheckoutRejected(detail));
                }

                let session = response.json::<CheckoutSession>().await?;
                if session.reference.is_empty() {
                    return Err(GatewayError::InvalidResponse(
                        "empty checkout reference".to_string(),
                    ));
                }
                Ok(session)
            })
            .await;

        match result {
            Ok(session) => Ok(session),
            Err(FailsafeError::Rejected) => Err(GatewayError::CircuitBreakerOpen(
                "payment gateway circuit breaker is open".to_string(),
            )),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }

    /// Asks the gateway for the current outcome of a checkout.
    pub async fn verify(&self, reference: &str) -> Result<VerificationOutcome, GatewayError> {
        let url = format!(
            "{}/checkouts/{}/status",
            self.base_url.trim_end_matches('/'),
            reference
        );
        let client = self.client.clone();
        let reference = reference.to_string();

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client.get(&url).send().await?;

                if response.status() == 404 {
                    return Err(GatewayError::ReferenceNotFound(reference));
                }

                let outcome = response.json::<VerificationOutcome>().await?;
                Ok(outcome)
            })
            .await;

        match result {
            Ok(outcome) => Ok(outcome),
            Err(FailsafeError::Rejected) => Err(GatewayError::CircuitBreakerOpen(
                "payment gateway circuit breaker is open".to_string(),
            )),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;

    #[test]
    fn test_gateway_client_creation() {
        let client = GatewayClient::new("https://pay.example.com".to_string());
        assert_eq!(client.base_url, "https://pay.example.com");
    }

    #[test]
    fn test_circuit_breaker_starts_closed() {
        let client = GatewayClient::new("https://pay.example.com".to_string());
        assert_eq!(client.circuit_state(), "closed");
    }

    #[tokio::test]
    async fn test_create_checkout_with_mock() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("POST", "/checkouts")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"reference":"chk_123","checkout_url":"https://pay.example.com/c/chk_123"}"#)
            .create_async()
            .await;

        let client = GatewayClient::new(server.url());
        let session = client
            .create_checkout(
                Uuid::new_v4(),
                Uuid::new_v4(),
                &BigDecimal::from(500000),
                PaymentType::AdvanceUpi,
            )
            .await
            .unwrap();

        assert_eq!(session.reference, "chk_123");
        assert!(session.checkout_url.is_some());
    }

    #[tokio::test]
    async fn test_verify_unconfirmed_checkout() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/checkouts/chk_123/status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success":false,"amount":null,"method":null}"#)
            .create_async()
            .await;

        let client = GatewayClient::new(server.url());
        let outcome = client.verify("chk_123").await.unwrap();

        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn test_verify_unknown_reference() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", "/checkouts/missing/status")
            .with_status(404)
            .create_async()
            .await;

        let client = GatewayClient::new(server.url());
        let result = client.verify("missing").await;

        assert!(matches!(result, Err(GatewayError::ReferenceNotFound(_))));
    }

    #[tokio::test]
    async fn test_circuit_breaker_opens_after_failures() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server
            .mock("GET", mockito::Matcher::Regex(r".*/status".into()))
            .with_status(500)
            .expect_at_least(3)
            .create_async()
            .await;

        let client = GatewayClient::with_circuit_breaker(server.url(), 3, 60);

        for _ in 0..3 {
            let _ = client.verify("chk_123").await;
        }

        let result = client.verify("chk_123").await;
        assert!(matches!(result, Err(GatewayError::CircuitBreakerOpen(_))));
    }
}
