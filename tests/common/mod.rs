use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use carteira_server::{AppState, Classifier, app_router, constants::*, database};
use time::Duration;
use tower::util::ServiceExt;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::Key};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

pub async fn setup_test_app() -> anyhow::Result<TestApp> {
    let temp_dir = tempfile::tempdir()?;
    let data_path = temp_dir.path().to_string_lossy().to_string();
    std::mem::forget(temp_dir);

    let db = database::init_db(&data_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize database: {}", e))?;

    let app_state = AppState {
        db,
        classifier: Classifier::disabled(),
    };

    let store = MemoryStore::default();

    let session_secret = "test_secret_key_at_least_64_chars_long_test_secret_key_at_least_64_";
    let session_key = Key::try_from(session_secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Invalid session secret: {}", e))?;

    let session_layer = SessionManagerLayer::new(store)
        .with_secure(false)
        .with_name(SESSION_NAME)
        .with_expiry(Expiry::OnInactivity(Duration::days(SESSION_EXPIRY_DAYS)))
        .with_signed(session_key);

    let router = app_router(app_state.clone()).layer(session_layer);

    Ok(TestApp {
        router,
        state: app_state,
    })
}

/// Registers through the API so the account gets its full bootstrap (profile,
/// personal wallet, default categories). Returns the session cookie and the
/// new user id.
pub async fn register_user(
    app: &Router,
    username: &str,
    password: &str,
) -> anyhow::Result<(String, String)> {
    let payload = serde_json::json!({
        "username": username,
        "password": password
    });

    let request = Request::builder()
        .method("POST")
        .uri("/auth/register")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))?;

    let response = app
        .clone()
        .oneshot(request)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to execute request: {}", e))?;

    if response.status() != StatusCode::CREATED {
        return Err(anyhow::anyhow!(
            "Registration failed with status {}",
            response.status()
        ));
    }

    let cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| anyhow::anyhow!("No session cookie in response"))?
        .to_string();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let json: serde_json::Value = serde_json::from_slice(&body)?;
    let user_id = json["id"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Registration response missing id"))?
        .to_string();

    Ok((cookie, user_id))
}

#[allow(dead_code)]
pub async fn login_user(app: &Router, username: &str, password: &str) -> anyhow::Result<String> {
    let payload = serde_json::json!({
        "username": username,
        "password": password
    });

    let request = Request::builder()
        .method("POST")
        .uri("/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))?;

    let response = app
        .clone()
        .oneshot(request)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to execute request: {}", e))?;

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| anyhow::anyhow!("No session cookie in response"))?;

    Ok(set_cookie.to_string())
}

/// Sends an authenticated JSON request and returns the status plus the parsed
/// body (Null for empty bodies).
pub async fn json_request(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: &str,
    body: Option<serde_json::Value>,
) -> anyhow::Result<(StatusCode, serde_json::Value)> {
    let request_body = match body {
        Some(json) => Body::from(json.to_string()),
        None => Body::empty(),
    };

    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .header("cookie", cookie)
        .body(request_body)?;

    let response = app
        .clone()
        .oneshot(request)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to execute request: {}", e))?;

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::String(
            String::from_utf8_lossy(&bytes).to_string(),
        ))
    };

    Ok((status, json))
}

/// Fetches the personal wallet id created at registration.
#[allow(dead_code)]
pub async fn personal_wallet_id(app: &Router, cookie: &str) -> anyhow::Result<String> {
    let (status, body) = json_request(app, "GET", "/wallets", cookie, None).await?;
    if status != StatusCode::OK {
        return Err(anyhow::anyhow!("Failed to list wallets: {}", status));
    }
    let wallet = body
        .as_array()
        .and_then(|wallets| {
            wallets
                .iter()
                .find(|w| w["kind"] == carteira_server::constants::WALLET_PERSONAL)
        })
        .ok_or_else(|| anyhow::anyhow!("No personal wallet found"))?;
    Ok(wallet["id"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Wallet missing id"))?
        .to_string())
}

/// Arms a one-shot failure for the given operation step. The table only
/// exists in test databases; production code treats its absence as "never
/// fail".
#[allow(dead_code)]
pub async fn inject_failure(state: &AppState, op: &str, step: &str) -> anyhow::Result<()> {
    let conn = state.db.write().await;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS failure_injections (op TEXT NOT NULL, step TEXT NOT NULL, fail_once INTEGER NOT NULL)",
        (),
    )
    .await?;
    conn.execute(
        "INSERT INTO failure_injections (op, step, fail_once) VALUES (?, ?, 1)",
        (op, step),
    )
    .await?;
    Ok(())
}

/// Counts the transactions currently recorded for a wallet.
#[allow(dead_code)]
pub async fn count_transactions(state: &AppState, wallet_id: &str) -> anyhow::Result<u32> {
    let conn = state.db.read().await;
    let mut rows = conn
        .query(
            "SELECT COUNT(*) FROM transactions WHERE wallet_id = ?",
            [wallet_id],
        )
        .await?;
    match rows.next().await? {
        Some(row) => Ok(row.get(0)?),
        None => Ok(0),
    }
}
