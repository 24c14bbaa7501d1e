mod common;

use axum::http::StatusCode;
use common::{
    count_transactions, json_request, personal_wallet_id, register_user, setup_test_app,
};
use serde_json::json;

async fn add_transaction(
    app: &axum::Router,
    cookie: &str,
    wallet_id: &str,
    description: &str,
    amount: &str,
    direction: &str,
    date: &str,
) -> anyhow::Result<()> {
    let (status, body) = json_request(
        app,
        "POST",
        "/transactions",
        cookie,
        Some(json!({
            "wallet_id": wallet_id,
            "description": description,
            "amount": amount,
            "direction": direction,
            "category": "Outros",
            "transaction_date": date,
        })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "unexpected status: {body}");
    Ok(())
}

#[tokio::test]
async fn balance_is_derived_from_ledger() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let (cookie, _) = register_user(&app.router, "ledger_user", "password").await?;
    let wallet_id = personal_wallet_id(&app.router, &cookie).await?;

    add_transaction(
        &app.router,
        &cookie,
        &wallet_id,
        "Pagamento",
        "1000",
        "INCOME",
        "2026-08-01",
    )
    .await?;
    add_transaction(
        &app.router,
        &cookie,
        &wallet_id,
        "Mercado",
        "300",
        "EXPENSE",
        "2026-08-02",
    )
    .await?;

    let (status, body) = json_request(
        &app.router,
        "GET",
        &format!("/wallets/{}/balance", wallet_id),
        &cookie,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], "700");

    // Recomputation with no intervening writes yields the same figure.
    let (_, body) = json_request(
        &app.router,
        "GET",
        &format!("/wallets/{}/balance", wallet_id),
        &cookie,
        None,
    )
    .await?;
    assert_eq!(body["balance"], "700");

    Ok(())
}

#[tokio::test]
async fn adjustment_inserts_synthetic_transaction() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let (cookie, _) = register_user(&app.router, "adjust_user", "password").await?;
    let wallet_id = personal_wallet_id(&app.router, &cookie).await?;

    add_transaction(
        &app.router,
        &cookie,
        &wallet_id,
        "Pagamento",
        "1000",
        "INCOME",
        "2026-08-01",
    )
    .await?;
    add_transaction(
        &app.router,
        &cookie,
        &wallet_id,
        "Mercado",
        "300",
        "EXPENSE",
        "2026-08-02",
    )
    .await?;

    let (status, body) = json_request(
        &app.router,
        "POST",
        &format!("/wallets/{}/adjust-balance", wallet_id),
        &cookie,
        Some(json!({ "observed_balance": "650" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], "650");

    let adjustment = &body["adjustment"];
    assert_eq!(adjustment["direction"], "EXPENSE");
    assert_eq!(adjustment["amount"], "50");
    assert_eq!(adjustment["category"], "Ajuste");
    assert_eq!(adjustment["description"], "Ajuste Manual de Caixa");

    // The adjustment is an ordinary row, so the derived balance now matches.
    let (status, body) = json_request(
        &app.router,
        "GET",
        &format!("/wallets/{}/balance", wallet_id),
        &cookie,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], "650");
    assert_eq!(count_transactions(&app.state, &wallet_id).await?, 3);

    Ok(())
}

#[tokio::test]
async fn adjustment_is_noop_when_observed_matches() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let (cookie, _) = register_user(&app.router, "noop_user", "password").await?;
    let wallet_id = personal_wallet_id(&app.router, &cookie).await?;

    add_transaction(
        &app.router,
        &cookie,
        &wallet_id,
        "Pagamento",
        "500",
        "INCOME",
        "2026-08-01",
    )
    .await?;

    let (status, body) = json_request(
        &app.router,
        "POST",
        &format!("/wallets/{}/adjust-balance", wallet_id),
        &cookie,
        Some(json!({ "observed_balance": "500" })),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body["adjustment"].is_null());
    assert_eq!(count_transactions(&app.state, &wallet_id).await?, 1);

    Ok(())
}

#[tokio::test]
async fn cent_amounts_sum_exactly() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let (cookie, _) = register_user(&app.router, "cents_user", "password").await?;
    let wallet_id = personal_wallet_id(&app.router, &cookie).await?;

    add_transaction(
        &app.router,
        &cookie,
        &wallet_id,
        "Dez centavos",
        "0.10",
        "INCOME",
        "2026-08-01",
    )
    .await?;
    add_transaction(
        &app.router,
        &cookie,
        &wallet_id,
        "Vinte centavos",
        "0.20",
        "INCOME",
        "2026-08-01",
    )
    .await?;

    let (status, body) = json_request(
        &app.router,
        "GET",
        &format!("/wallets/{}/balance", wallet_id),
        &cookie,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], "0.30");

    Ok(())
}

#[tokio::test]
async fn summary_reports_period_totals_and_all_time_balance() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let (cookie, _) = register_user(&app.router, "summary_user", "password").await?;
    let wallet_id = personal_wallet_id(&app.router, &cookie).await?;

    add_transaction(
        &app.router,
        &cookie,
        &wallet_id,
        "Antigo",
        "200",
        "INCOME",
        "2026-07-01",
    )
    .await?;
    add_transaction(
        &app.router,
        &cookie,
        &wallet_id,
        "Salário",
        "1000",
        "INCOME",
        "2026-08-05",
    )
    .await?;
    add_transaction(
        &app.router,
        &cookie,
        &wallet_id,
        "Aluguel",
        "400",
        "EXPENSE",
        "2026-08-10",
    )
    .await?;

    let (status, body) = json_request(
        &app.router,
        "GET",
        &format!(
            "/wallets/{}/summary?start_date=2026-08-01&end_date=2026-08-31",
            wallet_id
        ),
        &cookie,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], "800");
    assert_eq!(body["period_income"], "1000");
    assert_eq!(body["period_expense"], "400");
    assert_eq!(body["reserves_total"], "0");
    assert_eq!(body["transactions"].as_array().map(|t| t.len()), Some(2));
    // Newest first within the period.
    assert_eq!(body["transactions"][0]["description"], "Aluguel");

    Ok(())
}

#[tokio::test]
async fn foreign_wallet_balance_is_not_visible() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let (owner_cookie, _) = register_user(&app.router, "owner_user", "password").await?;
    let wallet_id = personal_wallet_id(&app.router, &owner_cookie).await?;

    let (intruder_cookie, _) = register_user(&app.router, "intruder_usr", "password").await?;

    let (status, _) = json_request(
        &app.router,
        "GET",
        &format!("/wallets/{}/balance", wallet_id),
        &intruder_cookie,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}
