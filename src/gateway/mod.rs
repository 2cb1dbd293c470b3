pub mod client;

pub use client::{CheckoutSession, GatewayClient, GatewayError, VerificationOutcome};
