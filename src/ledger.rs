//! Ledger balance engine. A wallet's balance is always recomputed from its
//! transaction rows and never persisted, so no cached figure can ever drift
//! from the ledger. Summation uses exact decimal arithmetic.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use tower_sessions::Session;

use crate::AppState;
use crate::Db;
use crate::auth::get_current_user;
use crate::constants::*;
use crate::models::{
    AdjustBalancePayload, AdjustBalanceResponse, SummaryQuery, SummaryResponse, Transaction,
};
use crate::transactions::{NewTransaction, extract_transaction_from_row, insert_transaction};
use crate::utils::{
    db_error, db_error_with_context, parse_stored_amount, today_string, validate_date,
};
use crate::wallets::get_wallet_owned;

/// All-time balance: sum of INCOME amounts minus sum of EXPENSE amounts over
/// every transaction of the wallet.
pub async fn compute_balance(
    db: &Db,
    user_id: &str,
    wallet_id: &str,
) -> Result<Decimal, (StatusCode, String)> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT amount, direction FROM transactions WHERE wallet_id = ? AND user_id = ?",
            (wallet_id, user_id),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query ledger"))?;

    let mut balance = Decimal::ZERO;
    while let Some(row) = rows.next().await.map_err(|_| db_error())? {
        let amount_text: String = row.get(0).map_err(|_| db_error())?;
        let direction: String = row.get(1).map_err(|_| db_error())?;
        let amount = parse_stored_amount(&amount_text)?;
        if direction == DIRECTION_INCOME {
            balance += amount;
        } else {
            balance -= amount;
        }
    }

    Ok(balance)
}

async fn fetch_wallet_transactions(
    db: &Db,
    user_id: &str,
    wallet_id: &str,
) -> Result<Vec<Transaction>, (StatusCode, String)> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, wallet_id, user_id, description, amount, direction, category, transaction_date, created_at FROM transactions WHERE wallet_id = ? AND user_id = ? ORDER BY transaction_date DESC, created_at DESC",
            (wallet_id, user_id),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query transactions"))?;

    let mut transactions = Vec::new();
    while let Some(row) = rows.next().await.map_err(|_| db_error())? {
        transactions.push(extract_transaction_from_row(row)?);
    }
    Ok(transactions)
}

async fn reserves_total(
    db: &Db,
    user_id: &str,
    wallet_id: &str,
) -> Result<Decimal, (StatusCode, String)> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT current_amount FROM reserves WHERE wallet_id = ? AND user_id = ?",
            (wallet_id, user_id),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query reserves"))?;

    let mut total = Decimal::ZERO;
    while let Some(row) = rows.next().await.map_err(|_| db_error())? {
        let amount_text: String = row.get(0).map_err(|_| db_error())?;
        total += parse_stored_amount(&amount_text)?;
    }
    Ok(total)
}

/// Dashboard summary: all-time balance, period totals, the period's
/// transactions newest-first, and the sum of the wallet's reserve balances.
pub async fn get_summary(
    State(app_state): State<AppState>,
    session: Session,
    Path(wallet_id): Path<String>,
    Query(query): Query<SummaryQuery>,
) -> Result<(StatusCode, Json<SummaryResponse>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;
    get_wallet_owned(&app_state.db, &user.id, &wallet_id).await?;

    validate_date(&query.start_date)?;
    validate_date(&query.end_date)?;

    let all = fetch_wallet_transactions(&app_state.db, &user.id, &wallet_id).await?;

    let mut balance = Decimal::ZERO;
    let mut period_income = Decimal::ZERO;
    let mut period_expense = Decimal::ZERO;
    let mut period_transactions = Vec::new();

    for transaction in all {
        let income = transaction.direction == DIRECTION_INCOME;
        if income {
            balance += transaction.amount;
        } else {
            balance -= transaction.amount;
        }

        let in_period = transaction.transaction_date.as_str() >= query.start_date.as_str()
            && transaction.transaction_date.as_str() <= query.end_date.as_str();
        if in_period {
            if income {
                period_income += transaction.amount;
            } else {
                period_expense += transaction.amount;
            }
            period_transactions.push(transaction);
        }
    }

    let reserves_total = reserves_total(&app_state.db, &user.id, &wallet_id).await?;

    Ok((
        StatusCode::OK,
        Json(SummaryResponse {
            balance,
            period_income,
            period_expense,
            reserves_total,
            transactions: period_transactions,
        }),
    ))
}

pub async fn get_balance(
    State(app_state): State<AppState>,
    session: Session,
    Path(wallet_id): Path<String>,
) -> Result<(StatusCode, Json<serde_json::Value>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;
    get_wallet_owned(&app_state.db, &user.id, &wallet_id).await?;

    let balance = compute_balance(&app_state.db, &user.id, &wallet_id).await?;
    Ok((
        StatusCode::OK,
        Json(serde_json::json!({ "balance": balance })),
    ))
}

/// Balance adjustment: the caller reports the balance they actually observe
/// and the engine inserts one synthetic transaction covering the difference.
/// Since the transaction set is the only source of truth, the next balance
/// read returns the observed value exactly. Single write; a matching
/// observed balance is a no-op.
pub async fn adjust_balance(
    State(app_state): State<AppState>,
    session: Session,
    Path(wallet_id): Path<String>,
    Json(payload): Json<AdjustBalancePayload>,
) -> Result<(StatusCode, Json<AdjustBalanceResponse>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;
    get_wallet_owned(&app_state.db, &user.id, &wallet_id).await?;

    let observed = payload.observed_balance.round_dp(2);
    let current = compute_balance(&app_state.db, &user.id, &wallet_id).await?;
    let diff = observed - current;

    if diff.is_zero() {
        return Ok((
            StatusCode::OK,
            Json(AdjustBalanceResponse {
                balance: current,
                adjustment: None,
            }),
        ));
    }

    let direction = if diff > Decimal::ZERO {
        DIRECTION_INCOME
    } else {
        DIRECTION_EXPENSE
    };
    let today = today_string()?;

    let adjustment = insert_transaction(
        &app_state.db,
        &NewTransaction {
            wallet_id: &wallet_id,
            user_id: &user.id,
            description: "Ajuste Manual de Caixa",
            amount: diff.abs(),
            direction,
            category: CATEGORY_ADJUSTMENT,
            transaction_date: &today,
        },
    )
    .await?;

    Ok((
        StatusCode::OK,
        Json(AdjustBalanceResponse {
            balance: observed,
            adjustment: Some(adjustment),
        }),
    ))
}
