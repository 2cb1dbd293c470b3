pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod services;
pub mod startup;
pub mod validation;

use axum::{
    Router,
    routing::{get, patch, post},
};
use tower_http::cors::CorsLayer;

use crate::gateway::GatewayClient;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub gateway: GatewayClient,
    pub webhook_secret: String,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/checkout", post(handlers::checkout::initiate_checkout))
        .route("/callback", post(handlers::webhook::callback))
        .route(
            "/transactions/:id",
            get(handlers::transactions::get_transaction),
        )
        .route(
            "/transactions/:id/verify",
            post(handlers::transactions::verify_payment),
        )
        .route(
            "/transactions/:id/confirm-booking",
            post(handlers::transactions::confirm_booking),
        )
        .route(
            "/transactions/:id/collect",
            post(handlers::delivery::confirm_collection),
        )
        .route("/purchases", get(handlers::transactions::list_my_purchases))
        .route("/sales", get(handlers::transactions::list_my_sales))
        .route(
            "/admin/transactions/:id/status",
            patch(handlers::admin::update_status),
        )
        .route(
            "/admin/transactions/:id/delivery",
            patch(handlers::admin::update_delivery),
        )
        .route(
            "/admin/transactions/:id/audit",
            get(handlers::admin::get_audit_logs),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
