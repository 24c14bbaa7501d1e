use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::auth::get_current_user;
use crate::constants::*;
use crate::models::{CreateWalletPayload, DeleteWalletResponse, Wallet};
use crate::utils::{db_error, db_error_with_context, now_rfc3339, validate_string_length};
use crate::{AppState, Db};

// Starter categories seeded with each wallet kind. Names and colors follow
// the product's Brazilian-Portuguese defaults.
const DEFAULT_PERSONAL_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Alimentação", DIRECTION_EXPENSE, "#f87171"),
    ("Transporte", DIRECTION_EXPENSE, "#fb923c"),
    ("Moradia", DIRECTION_EXPENSE, "#60a5fa"),
    ("Lazer", DIRECTION_EXPENSE, "#a78bfa"),
    ("Saúde", DIRECTION_EXPENSE, "#ef4444"),
    ("Renda Extra", DIRECTION_INCOME, "#4ade80"),
    ("Salário", DIRECTION_INCOME, "#22c55e"),
];

const DEFAULT_BUSINESS_CATEGORIES: &[(&str, &str, &str)] = &[
    ("Vendas", DIRECTION_INCOME, "#22c55e"),
    ("Fornecedores", DIRECTION_EXPENSE, "#94a3b8"),
    ("Pró-Labore", DIRECTION_EXPENSE, "#facc15"),
    ("Operacional", DIRECTION_EXPENSE, "#fb923c"),
];

pub fn extract_wallet_from_row(row: libsql::Row) -> Result<Wallet, (StatusCode, String)> {
    let id: String = row
        .get(0)
        .map_err(|_| db_error_with_context("invalid wallet data"))?;
    let user_id: String = row
        .get(1)
        .map_err(|_| db_error_with_context("invalid wallet data"))?;
    let name: String = row
        .get(2)
        .map_err(|_| db_error_with_context("invalid wallet data"))?;
    let kind: String = row
        .get(3)
        .map_err(|_| db_error_with_context("invalid wallet data"))?;
    let business_type: Option<String> = row
        .get(4)
        .map_err(|_| db_error_with_context("invalid wallet data"))?;
    let track_stock: bool = row
        .get(5)
        .map_err(|_| db_error_with_context("invalid wallet data"))?;
    let created_at: String = row
        .get(6)
        .map_err(|_| db_error_with_context("invalid wallet data"))?;

    Ok(Wallet {
        id,
        user_id,
        name,
        kind,
        business_type,
        track_stock,
        created_at,
    })
}

/// Fetches a wallet and verifies it belongs to the acting user.
/// Foreign or missing wallets both come back as 404.
pub async fn get_wallet_owned(
    db: &Db,
    user_id: &str,
    wallet_id: &str,
) -> Result<Wallet, (StatusCode, String)> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, user_id, name, kind, business_type, track_stock, created_at FROM wallets WHERE id = ? AND user_id = ?",
            (wallet_id, user_id),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query wallet"))?;

    match rows.next().await.map_err(|_| db_error())? {
        Some(row) => extract_wallet_from_row(row),
        None => Err((StatusCode::NOT_FOUND, "Wallet not found".to_string())),
    }
}

/// Resolves the user's single PERSONAL wallet, required by salary transfers.
pub async fn get_personal_wallet(
    db: &Db,
    user_id: &str,
) -> Result<Wallet, (StatusCode, String)> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, user_id, name, kind, business_type, track_stock, created_at FROM wallets WHERE user_id = ? AND kind = ? LIMIT 1",
            (user_id, WALLET_PERSONAL),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query personal wallet"))?;

    match rows.next().await.map_err(|_| db_error())? {
        Some(row) => extract_wallet_from_row(row),
        None => Err((
            StatusCode::NOT_FOUND,
            "Personal wallet not found".to_string(),
        )),
    }
}

async fn seed_categories(
    db: &Db,
    user_id: &str,
    scope: &str,
    seeds: &[(&str, &str, &str)],
) -> Result<(), (StatusCode, String)> {
    let conn = db.write().await;
    for (name, kind, color) in seeds {
        let category_id = Uuid::new_v4().to_string();
        conn.execute(
            "INSERT INTO categories (id, user_id, name, color, kind, scope) VALUES (?, ?, ?, ?, ?, ?)",
            (category_id.as_str(), user_id, *name, *color, *kind, scope),
        )
        .await
        .map_err(|_| db_error_with_context("default category creation failed"))?;
    }
    Ok(())
}

/// Creates the PERSONAL wallet every account gets at signup, together with
/// the default personal category set.
pub async fn bootstrap_personal_wallet(
    db: &Db,
    user_id: &str,
    now: &str,
) -> Result<Wallet, (StatusCode, String)> {
    let wallet_id = Uuid::new_v4().to_string();

    {
        let conn = db.write().await;
        conn.execute(
            "INSERT INTO wallets (id, user_id, name, kind, business_type, track_stock, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                wallet_id.as_str(),
                user_id,
                DEFAULT_PERSONAL_WALLET_NAME,
                WALLET_PERSONAL,
                Option::<&str>::None,
                false,
                now,
            ),
        )
        .await
        .map_err(|_| db_error_with_context("personal wallet creation failed"))?;
    }

    seed_categories(db, user_id, WALLET_PERSONAL, DEFAULT_PERSONAL_CATEGORIES).await?;

    Ok(Wallet {
        id: wallet_id,
        user_id: user_id.to_string(),
        name: DEFAULT_PERSONAL_WALLET_NAME.to_string(),
        kind: WALLET_PERSONAL.to_string(),
        business_type: None,
        track_stock: false,
        created_at: now.to_string(),
    })
}

/// Creates a BUSINESS wallet and seeds the default business category set.
pub async fn create_wallet(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateWalletPayload>,
) -> Result<(StatusCode, Json<Wallet>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;
    validate_string_length(&payload.name, "Wallet name", MAX_WALLET_NAME_LENGTH)?;

    let db = &app_state.db;
    let wallet_id = Uuid::new_v4().to_string();
    let now = now_rfc3339()?;
    let name = payload.name.trim().to_string();

    {
        let conn = db.write().await;
        conn.execute(
            "INSERT INTO wallets (id, user_id, name, kind, business_type, track_stock, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                wallet_id.as_str(),
                user.id.as_str(),
                name.as_str(),
                WALLET_BUSINESS,
                payload.business_type.as_deref(),
                payload.track_stock,
                now.as_str(),
            ),
        )
        .await
        .map_err(|_| db_error_with_context("wallet creation failed"))?;
    }

    seed_categories(db, &user.id, WALLET_BUSINESS, DEFAULT_BUSINESS_CATEGORIES).await?;

    Ok((
        StatusCode::CREATED,
        Json(Wallet {
            id: wallet_id,
            user_id: user.id,
            name,
            kind: WALLET_BUSINESS.to_string(),
            business_type: payload.business_type,
            track_stock: payload.track_stock,
            created_at: now,
        }),
    ))
}

pub async fn get_wallets(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<(StatusCode, Json<Vec<Wallet>>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;

    let conn = app_state.db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, user_id, name, kind, business_type, track_stock, created_at FROM wallets WHERE user_id = ? ORDER BY created_at ASC",
            [user.id.as_str()],
        )
        .await
        .map_err(|_| db_error_with_context("failed to query wallets"))?;

    let mut wallets = Vec::new();
    while let Some(row) = rows.next().await.map_err(|_| db_error())? {
        wallets.push(extract_wallet_from_row(row)?);
    }

    Ok((StatusCode::OK, Json(wallets)))
}

/// Deletes a wallet and everything it owns: transactions, bills, reserves.
/// Deleting the user's last wallet flushes the session, which is the
/// server-side half of the "last wallet forces logout" rule.
pub async fn delete_wallet(
    State(app_state): State<AppState>,
    session: Session,
    Path(wallet_id): Path<String>,
) -> Result<(StatusCode, Json<DeleteWalletResponse>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;
    let db = &app_state.db;

    // 404 before any destructive write
    get_wallet_owned(db, &user.id, &wallet_id).await?;

    let remaining = {
        let conn = db.write().await;
        conn.execute(
            "DELETE FROM transactions WHERE wallet_id = ? AND user_id = ?",
            (wallet_id.as_str(), user.id.as_str()),
        )
        .await
        .map_err(|_| db_error_with_context("failed to delete wallet transactions"))?;
        conn.execute(
            "DELETE FROM bills WHERE wallet_id = ? AND user_id = ?",
            (wallet_id.as_str(), user.id.as_str()),
        )
        .await
        .map_err(|_| db_error_with_context("failed to delete wallet bills"))?;
        conn.execute(
            "DELETE FROM reserves WHERE wallet_id = ? AND user_id = ?",
            (wallet_id.as_str(), user.id.as_str()),
        )
        .await
        .map_err(|_| db_error_with_context("failed to delete wallet reserves"))?;
        conn.execute(
            "DELETE FROM wallets WHERE id = ? AND user_id = ?",
            (wallet_id.as_str(), user.id.as_str()),
        )
        .await
        .map_err(|_| db_error_with_context("failed to delete wallet"))?;

        let mut rows = conn
            .query(
                "SELECT COUNT(*) FROM wallets WHERE user_id = ?",
                [user.id.as_str()],
            )
            .await
            .map_err(|_| db_error_with_context("failed to count remaining wallets"))?;

        let count: u32 = if let Some(row) = rows.next().await.map_err(|_| db_error())? {
            row.get(0).map_err(|_| db_error())?
        } else {
            0
        };
        count
    };

    let logged_out = remaining == 0;
    if logged_out {
        session.flush().await.map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ERR_INVALID_SESSION.to_string(),
            )
        })?;
    }

    Ok((
        StatusCode::OK,
        Json(DeleteWalletResponse {
            remaining_wallets: remaining,
            logged_out,
        }),
    ))
}
