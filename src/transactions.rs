use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use tower_sessions::Session;
use uuid::Uuid;

use crate::AppState;
use crate::Db;
use crate::auth::get_current_user;
use crate::constants::*;
use crate::models::{
    CreateTransactionPayload, GetTransactionsQuery, GetTransactionsResponse, Transaction,
    UpdateTransactionPayload,
};
use crate::utils::{
    db_error, db_error_with_context, now_rfc3339, parse_stored_amount, validate_date,
    validate_direction, validate_limit, validate_offset, validate_positive_amount,
    validate_string_length,
};
use crate::wallets::get_wallet_owned;

/// Field set for one ledger insert. Consistency operations build these
/// directly; the HTTP handler builds one from its payload.
pub struct NewTransaction<'a> {
    pub wallet_id: &'a str,
    pub user_id: &'a str,
    pub description: &'a str,
    pub amount: Decimal,
    pub direction: &'a str,
    pub category: &'a str,
    pub transaction_date: &'a str,
}

pub fn extract_transaction_from_row(row: libsql::Row) -> Result<Transaction, (StatusCode, String)> {
    let id: String = row
        .get(0)
        .map_err(|_| db_error_with_context("invalid transaction data"))?;
    let wallet_id: String = row
        .get(1)
        .map_err(|_| db_error_with_context("invalid transaction data"))?;
    let user_id: String = row
        .get(2)
        .map_err(|_| db_error_with_context("invalid transaction data"))?;
    let description: String = row
        .get(3)
        .map_err(|_| db_error_with_context("invalid transaction data"))?;
    let amount_text: String = row
        .get(4)
        .map_err(|_| db_error_with_context("invalid transaction data"))?;
    let direction: String = row
        .get(5)
        .map_err(|_| db_error_with_context("invalid transaction data"))?;
    let category: String = row
        .get(6)
        .map_err(|_| db_error_with_context("invalid transaction data"))?;
    let transaction_date: String = row
        .get(7)
        .map_err(|_| db_error_with_context("invalid transaction data"))?;
    let created_at: String = row
        .get(8)
        .map_err(|_| db_error_with_context("invalid transaction data"))?;

    Ok(Transaction {
        id,
        wallet_id,
        user_id,
        description,
        amount: parse_stored_amount(&amount_text)?,
        direction,
        category,
        transaction_date,
        created_at,
    })
}

/// Single ledger write, shared by the transaction endpoint and every
/// consistency operation that mirrors money movement into the ledger.
pub async fn insert_transaction(
    db: &Db,
    new: &NewTransaction<'_>,
) -> Result<Transaction, (StatusCode, String)> {
    let transaction_id = Uuid::new_v4().to_string();
    let created_at = now_rfc3339()?;
    let amount_text = new.amount.to_string();

    let conn = db.write().await;
    conn.execute(
        "INSERT INTO transactions (id, wallet_id, user_id, description, amount, direction, category, transaction_date, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            transaction_id.as_str(),
            new.wallet_id,
            new.user_id,
            new.description,
            amount_text.as_str(),
            new.direction,
            new.category,
            new.transaction_date,
            created_at.as_str(),
        ),
    )
    .await
    .map_err(|_| db_error_with_context("transaction creation failed"))?;

    Ok(Transaction {
        id: transaction_id,
        wallet_id: new.wallet_id.to_string(),
        user_id: new.user_id.to_string(),
        description: new.description.to_string(),
        amount: new.amount,
        direction: new.direction.to_string(),
        category: new.category.to_string(),
        transaction_date: new.transaction_date.to_string(),
        created_at,
    })
}

pub async fn create_transaction(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateTransactionPayload>,
) -> Result<(StatusCode, Json<Transaction>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;

    validate_string_length(&payload.description, "Description", MAX_DESCRIPTION_LENGTH)?;
    let amount = validate_positive_amount(payload.amount, "Amount")?;
    validate_direction(&payload.direction)?;
    validate_date(&payload.transaction_date)?;

    let wallet = get_wallet_owned(&app_state.db, &user.id, &payload.wallet_id).await?;

    // A missing category goes through the classifier; any failure there
    // silently falls back to the default.
    let category = match payload.category {
        Some(category) if !category.trim().is_empty() => category.trim().to_string(),
        _ => {
            app_state
                .classifier
                .classify(
                    payload.description.trim(),
                    &user.id,
                    &wallet.kind,
                    FALLBACK_CATEGORY_TRANSACTION,
                )
                .await
        }
    };

    let transaction = insert_transaction(
        &app_state.db,
        &NewTransaction {
            wallet_id: &wallet.id,
            user_id: &user.id,
            description: payload.description.trim(),
            amount,
            direction: &payload.direction,
            category: &category,
            transaction_date: payload.transaction_date.trim(),
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn get_transactions(
    State(app_state): State<AppState>,
    session: Session,
    Query(query): Query<GetTransactionsQuery>,
) -> Result<(StatusCode, Json<GetTransactionsResponse>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;
    get_wallet_owned(&app_state.db, &user.id, &query.wallet_id).await?;

    let limit = validate_limit(query.limit, DEFAULT_TRANSACTIONS_LIMIT)?;
    let offset = validate_offset(query.offset)?;

    if let Some(ref start_date) = query.start_date {
        validate_date(start_date)?;
    }
    if let Some(ref end_date) = query.end_date {
        validate_date(end_date)?;
    }

    let start_date = query.start_date.unwrap_or_else(|| "0000-01-01".to_string());
    let end_date = query.end_date.unwrap_or_else(|| "9999-12-31".to_string());

    let conn = app_state.db.read().await;

    let count_query = "SELECT COUNT(*) FROM transactions WHERE wallet_id = ? AND user_id = ? AND transaction_date BETWEEN ? AND ?";
    let mut count_rows = conn
        .query(
            count_query,
            (
                query.wallet_id.as_str(),
                user.id.as_str(),
                start_date.as_str(),
                end_date.as_str(),
            ),
        )
        .await
        .map_err(|_| db_error_with_context("failed to count transactions"))?;

    let total_count: u32 = if let Some(row) = count_rows.next().await.map_err(|_| db_error())? {
        row.get(0).map_err(|_| db_error())?
    } else {
        0
    };

    let list_query = "SELECT id, wallet_id, user_id, description, amount, direction, category, transaction_date, created_at FROM transactions WHERE wallet_id = ? AND user_id = ? AND transaction_date BETWEEN ? AND ? ORDER BY transaction_date DESC, created_at DESC LIMIT ? OFFSET ?";
    let mut rows = conn
        .query(
            list_query,
            (
                query.wallet_id.as_str(),
                user.id.as_str(),
                start_date.as_str(),
                end_date.as_str(),
                limit,
                offset,
            ),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query transactions"))?;

    let mut transactions = Vec::new();
    while let Some(row) = rows.next().await.map_err(|_| db_error())? {
        transactions.push(extract_transaction_from_row(row)?);
    }

    Ok((
        StatusCode::OK,
        Json(GetTransactionsResponse {
            transactions,
            total_count,
        }),
    ))
}

pub async fn update_transaction(
    State(app_state): State<AppState>,
    session: Session,
    Path(transaction_id): Path<String>,
    Json(payload): Json<UpdateTransactionPayload>,
) -> Result<(StatusCode, Json<Transaction>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;

    if payload.description.is_none()
        && payload.amount.is_none()
        && payload.direction.is_none()
        && payload.category.is_none()
        && payload.transaction_date.is_none()
    {
        return Err((
            StatusCode::BAD_REQUEST,
            "At least one field must be provided for update".to_string(),
        ));
    }

    if let Some(ref description) = payload.description {
        validate_string_length(description, "Description", MAX_DESCRIPTION_LENGTH)?;
    }
    let amount = match payload.amount {
        Some(amount) => Some(validate_positive_amount(amount, "Amount")?),
        None => None,
    };
    if let Some(ref direction) = payload.direction {
        validate_direction(direction)?;
    }
    if let Some(ref date) = payload.transaction_date {
        validate_date(date)?;
    }

    let conn = app_state.db.write().await;

    let mut existing_rows = conn
        .query(
            "SELECT id, wallet_id, user_id, description, amount, direction, category, transaction_date, created_at FROM transactions WHERE id = ? AND user_id = ?",
            (transaction_id.as_str(), user.id.as_str()),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query existing transaction"))?;

    let existing = if let Some(row) = existing_rows.next().await.map_err(|_| db_error())? {
        extract_transaction_from_row(row)?
    } else {
        return Err((StatusCode::NOT_FOUND, "Transaction not found".to_string()));
    };

    let updated_description = payload
        .description
        .as_deref()
        .map(str::trim)
        .unwrap_or(&existing.description);
    let updated_amount = amount.unwrap_or(existing.amount);
    let updated_direction = payload.direction.as_deref().unwrap_or(&existing.direction);
    let updated_category = payload.category.as_deref().unwrap_or(&existing.category);
    let updated_date = payload
        .transaction_date
        .as_deref()
        .map(str::trim)
        .unwrap_or(&existing.transaction_date);
    let amount_text = updated_amount.to_string();

    let affected_rows = conn
        .execute(
            "UPDATE transactions SET description = ?, amount = ?, direction = ?, category = ?, transaction_date = ? WHERE id = ? AND user_id = ?",
            (
                updated_description,
                amount_text.as_str(),
                updated_direction,
                updated_category,
                updated_date,
                transaction_id.as_str(),
                user.id.as_str(),
            ),
        )
        .await
        .map_err(|_| db_error_with_context("failed to update transaction"))?;

    if affected_rows == 0 {
        return Err((StatusCode::NOT_FOUND, "Transaction not found".to_string()));
    }

    Ok((
        StatusCode::OK,
        Json(Transaction {
            id: transaction_id,
            wallet_id: existing.wallet_id,
            user_id: existing.user_id,
            description: updated_description.to_string(),
            amount: updated_amount,
            direction: updated_direction.to_string(),
            category: updated_category.to_string(),
            transaction_date: updated_date.to_string(),
            created_at: existing.created_at,
        }),
    ))
}

pub async fn delete_transaction(
    State(app_state): State<AppState>,
    session: Session,
    Path(transaction_id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let user = get_current_user(&session).await?;

    let conn = app_state.db.write().await;
    let affected_rows = conn
        .execute(
            "DELETE FROM transactions WHERE id = ? AND user_id = ?",
            (transaction_id.as_str(), user.id.as_str()),
        )
        .await
        .map_err(|_| db_error_with_context("failed to delete transaction"))?;

    if affected_rows == 0 {
        return Err((StatusCode::NOT_FOUND, "Transaction not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
