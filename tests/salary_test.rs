mod common;

use axum::http::StatusCode;
use common::{
    count_transactions, inject_failure, json_request, personal_wallet_id, register_user,
    setup_test_app,
};
use serde_json::json;

async fn create_business_wallet(
    app: &axum::Router,
    cookie: &str,
    name: &str,
) -> anyhow::Result<String> {
    let (status, body) = json_request(
        app,
        "POST",
        "/wallets",
        cookie,
        Some(json!({ "name": name, "business_type": "SERVICE" })),
    )
    .await?;
    anyhow::ensure!(status == StatusCode::CREATED, "unexpected status: {body}");
    Ok(body["id"].as_str().unwrap().to_string())
}

#[tokio::test]
async fn salary_creates_matching_pair() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let (cookie, _) = register_user(&app.router, "salary_user", "password").await?;
    let personal_id = personal_wallet_id(&app.router, &cookie).await?;
    let business_id = create_business_wallet(&app.router, &cookie, "Padaria").await?;

    let (status, body) = json_request(
        &app.router,
        "POST",
        &format!("/wallets/{}/pay-salary", business_id),
        &cookie,
        Some(json!({ "amount": "2500" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let income = &body["personal_transaction"];
    assert_eq!(income["wallet_id"], personal_id);
    assert_eq!(income["direction"], "INCOME");
    assert_eq!(income["amount"], "2500");
    assert_eq!(income["category"], "Salário");
    assert_eq!(income["description"], "Salário recebido de Padaria");

    let expense = &body["business_transaction"];
    assert_eq!(expense["wallet_id"], business_id);
    assert_eq!(expense["direction"], "EXPENSE");
    assert_eq!(expense["amount"], "2500");
    assert_eq!(expense["category"], "Pró-labore");
    assert_eq!(expense["description"], "Retirada de Lucro / Salário");

    assert_eq!(count_transactions(&app.state, &personal_id).await?, 1);
    assert_eq!(count_transactions(&app.state, &business_id).await?, 1);

    Ok(())
}

#[tokio::test]
async fn salary_rejects_personal_source_wallet() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let (cookie, _) = register_user(&app.router, "wrong_kind", "password").await?;
    let personal_id = personal_wallet_id(&app.router, &cookie).await?;

    let (status, _) = json_request(
        &app.router,
        "POST",
        &format!("/wallets/{}/pay-salary", personal_id),
        &cookie,
        Some(json!({ "amount": "100" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(count_transactions(&app.state, &personal_id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn salary_rejects_non_positive_amount() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let (cookie, _) = register_user(&app.router, "zero_amount", "password").await?;
    let business_id = create_business_wallet(&app.router, &cookie, "Loja").await?;

    let (status, _) = json_request(
        &app.router,
        "POST",
        &format!("/wallets/{}/pay-salary", business_id),
        &cookie,
        Some(json!({ "amount": "0" })),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn failed_expense_is_compensated() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let (cookie, _) = register_user(&app.router, "comp_user", "password").await?;
    let personal_id = personal_wallet_id(&app.router, &cookie).await?;
    let business_id = create_business_wallet(&app.router, &cookie, "Oficina").await?;

    inject_failure(&app.state, "salary_transfer", "business_expense").await?;

    let (status, body) = json_request(
        &app.router,
        "POST",
        &format!("/wallets/{}/pay-salary", business_id),
        &cookie,
        Some(json!({ "amount": "1200" })),
    )
    .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.as_str().unwrap().contains("partially applied"));

    // Compensation removed the income, so neither side shows the transfer.
    assert_eq!(count_transactions(&app.state, &personal_id).await?, 0);
    assert_eq!(count_transactions(&app.state, &business_id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn failed_compensation_reports_orphan_income() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let (cookie, _) = register_user(&app.router, "orphan_user", "password").await?;
    let personal_id = personal_wallet_id(&app.router, &cookie).await?;
    let business_id = create_business_wallet(&app.router, &cookie, "Estúdio").await?;

    inject_failure(&app.state, "salary_transfer", "business_expense").await?;
    inject_failure(&app.state, "salary_transfer", "compensation_delete").await?;

    let (status, body) = json_request(
        &app.router,
        "POST",
        &format!("/wallets/{}/pay-salary", business_id),
        &cookie,
        Some(json!({ "amount": "1200" })),
    )
    .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.as_str().unwrap().contains("Compensation failed"));

    // The income row survived the failed cleanup; the error names it.
    assert_eq!(count_transactions(&app.state, &personal_id).await?, 1);
    assert_eq!(count_transactions(&app.state, &business_id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn failed_income_changes_nothing() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let (cookie, _) = register_user(&app.router, "first_fail", "password").await?;
    let personal_id = personal_wallet_id(&app.router, &cookie).await?;
    let business_id = create_business_wallet(&app.router, &cookie, "Banca").await?;

    inject_failure(&app.state, "salary_transfer", "personal_income").await?;

    let (status, _) = json_request(
        &app.router,
        "POST",
        &format!("/wallets/{}/pay-salary", business_id),
        &cookie,
        Some(json!({ "amount": "800" })),
    )
    .await?;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(count_transactions(&app.state, &personal_id).await?, 0);
    assert_eq!(count_transactions(&app.state, &business_id).await?, 0);

    Ok(())
}
