//! HTTP surface: routes, shared state, and handlers.

pub mod extract;
pub mod handlers;
pub mod state;

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/api/customers",
            get(handlers::accounts::list_customers).post(handlers::accounts::create_customer),
        )
        .route("/api/customers/:id/ledger", get(handlers::accounts::customer_ledger))
        .route(
            "/api/companies",
            get(handlers::accounts::list_companies).post(handlers::accounts::create_company),
        )
        .route("/api/companies/:id/ledger", get(handlers::accounts::company_ledger))
        .route("/api/accounts/:id", delete(handlers::accounts::delete_account))
        .route(
            "/api/travelers",
            get(handlers::travelers::list_travelers).post(handlers::travelers::register_traveler),
        )
        .route("/api/travelers/:id/ledger", get(handlers::travelers::traveler_ledger))
        .route("/api/cashbox", get(handlers::cashbox::get_cashbox))
        .route("/api/cashbox/history", get(handlers::cashbox::get_history))
        .route(
            "/api/transactions",
            get(handlers::transactions::list_transactions)
                .post(handlers::transactions::create_transaction),
        )
        .route("/api/transactions/today", get(handlers::transactions::today_transactions))
        .route("/api/adjustments", post(handlers::transactions::create_adjustment))
        .route("/api/postings", post(handlers::postings::create_posting))
        .route(
            "/api/periods",
            get(handlers::periods::list_periods).post(handlers::periods::open_period),
        )
        .route("/api/periods/:id", get(handlers::periods::get_period))
        .route("/api/periods/:id/close", post(handlers::periods::close_period))
        .route("/api/periods/:id/entries", post(handlers::periods::record_entry))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
