mod common;

use axum::http::StatusCode;
use common::{json_request, personal_wallet_id, register_user, setup_test_app};
use serde_json::json;

#[tokio::test]
async fn registration_bootstraps_account() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let (cookie, user_id) = register_user(&app.router, "fresh_user", "password").await?;

    let (status, body) = json_request(&app.router, "GET", "/wallets", &cookie, None).await?;
    assert_eq!(status, StatusCode::OK);
    let wallets = body.as_array().unwrap();
    assert_eq!(wallets.len(), 1);
    assert_eq!(wallets[0]["kind"], "PERSONAL");
    assert_eq!(wallets[0]["name"], "Minha Carteira");
    assert_eq!(wallets[0]["user_id"], user_id);

    let (status, body) = json_request(
        &app.router,
        "GET",
        "/categories?scope=PERSONAL",
        &cookie,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 7);

    let (status, body) = json_request(&app.router, "GET", "/plan", &cookie, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "TRIAL");
    assert_eq!(body["days_remaining"], 3);

    Ok(())
}

#[tokio::test]
async fn business_wallet_seeds_business_categories() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let (cookie, _) = register_user(&app.router, "biz_user", "password").await?;

    let (status, body) = json_request(
        &app.router,
        "POST",
        "/wallets",
        &cookie,
        Some(json!({ "name": "Mercearia", "business_type": "RETAIL" })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["kind"], "BUSINESS");
    assert_eq!(body["business_type"], "RETAIL");

    let (status, body) = json_request(
        &app.router,
        "GET",
        "/categories?scope=BUSINESS",
        &cookie,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_count"], 4);

    Ok(())
}

#[tokio::test]
async fn deleting_a_non_last_wallet_keeps_session() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let (cookie, _) = register_user(&app.router, "two_wallets", "password").await?;

    let (_, body) = json_request(
        &app.router,
        "POST",
        "/wallets",
        &cookie,
        Some(json!({ "name": "Loja" })),
    )
    .await?;
    let business_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = json_request(
        &app.router,
        "DELETE",
        &format!("/wallets/{}", business_id),
        &cookie,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remaining_wallets"], 1);
    assert_eq!(body["logged_out"], false);

    let (status, _) = json_request(&app.router, "GET", "/auth/me", &cookie, None).await?;
    assert_eq!(status, StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn deleting_the_last_wallet_logs_out() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let (cookie, _) = register_user(&app.router, "last_wallet", "password").await?;
    let wallet_id = personal_wallet_id(&app.router, &cookie).await?;

    let (status, body) = json_request(
        &app.router,
        "DELETE",
        &format!("/wallets/{}", wallet_id),
        &cookie,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["remaining_wallets"], 0);
    assert_eq!(body["logged_out"], true);

    let (status, _) = json_request(&app.router, "GET", "/auth/me", &cookie, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn wallet_deletion_removes_owned_rows() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let (cookie, _) = register_user(&app.router, "cascade_usr", "password").await?;

    let (_, body) = json_request(
        &app.router,
        "POST",
        "/wallets",
        &cookie,
        Some(json!({ "name": "Banca" })),
    )
    .await?;
    let business_id = body["id"].as_str().unwrap().to_string();

    let (status, _) = json_request(
        &app.router,
        "POST",
        "/transactions",
        &cookie,
        Some(json!({
            "wallet_id": business_id,
            "description": "Venda",
            "amount": "50",
            "direction": "INCOME",
            "category": "Vendas",
            "transaction_date": "2026-08-01",
        })),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = json_request(
        &app.router,
        "DELETE",
        &format!("/wallets/{}", business_id),
        &cookie,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(common::count_transactions(&app.state, &business_id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn login_rejects_wrong_password() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    register_user(&app.router, "login_user", "password").await?;

    let result = common::login_user(&app.router, "login_user", "wrong_password").await;
    assert!(result.is_err());

    let cookie = common::login_user(&app.router, "login_user", "password").await?;
    let (status, body) = json_request(&app.router, "GET", "/auth/me", &cookie, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "login_user");

    Ok(())
}

#[tokio::test]
async fn duplicate_username_is_rejected() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    register_user(&app.router, "taken_name", "password").await?;

    let result = register_user(&app.router, "taken_name", "password2").await;
    assert!(result.is_err());

    Ok(())
}

#[tokio::test]
async fn logout_invalidates_session() -> anyhow::Result<()> {
    let app = setup_test_app().await?;
    let (cookie, _) = register_user(&app.router, "logout_user", "password").await?;

    let (status, _) = json_request(&app.router, "POST", "/auth/logout", &cookie, None).await?;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = json_request(&app.router, "GET", "/auth/me", &cookie, None).await?;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    Ok(())
}
