pub mod auth;
pub mod bills;
pub mod categories;
pub mod classifier;
pub mod config;
pub mod constants;
pub mod database;
pub mod ledger;
pub mod models;
pub mod ops;
pub mod plan;
pub mod reserves;
pub mod salary;
pub mod transactions;
pub mod utils;
pub mod wallets;

use axum::{
    Router,
    routing::{get, post, put},
};

pub use crate::classifier::Classifier;
pub use crate::database::Db;

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub classifier: Classifier,
}

/// Builds the full API router. The session layer and CORS are attached by
/// the caller, which lets tests run the same routes with their own layers.
pub fn app_router(app_state: AppState) -> Router {
    Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/auth/logout", post(auth::logout))
        .route("/plan", get(plan::get_plan))
        .route(
            "/wallets",
            post(wallets::create_wallet).get(wallets::get_wallets),
        )
        .route("/wallets/{id}", axum::routing::delete(wallets::delete_wallet))
        .route("/wallets/{id}/balance", get(ledger::get_balance))
        .route("/wallets/{id}/summary", get(ledger::get_summary))
        .route("/wallets/{id}/adjust-balance", post(ledger::adjust_balance))
        .route("/wallets/{id}/pay-salary", post(salary::pay_salary))
        .route("/wallets/{id}/reserves", get(reserves::get_reserves))
        .route(
            "/transactions",
            post(transactions::create_transaction).get(transactions::get_transactions),
        )
        .route(
            "/transactions/{id}",
            put(transactions::update_transaction).delete(transactions::delete_transaction),
        )
        .route(
            "/categories",
            post(categories::create_category).get(categories::get_categories),
        )
        .route(
            "/categories/{id}",
            put(categories::update_category).delete(categories::delete_category),
        )
        .route("/bills", post(bills::create_bill).get(bills::get_bills))
        .route(
            "/bills/{id}",
            put(bills::update_bill).delete(bills::delete_bill),
        )
        .route("/bills/{id}/settle", put(bills::settle_bill))
        .route("/reserves", post(reserves::create_reserve))
        .route(
            "/reserves/{id}",
            axum::routing::delete(reserves::delete_reserve),
        )
        .route("/reserves/{id}/deposit", post(reserves::deposit_reserve))
        .route("/reserves/{id}/withdraw", post(reserves::withdraw_reserve))
        .with_state(app_state)
}
