//! Scheduled bills (payables and receivables) and their settlement into the
//! ledger. Status is a two-state machine, PENDING then PAID, and PAID is
//! terminal. The OVERDUE / DUE_TODAY display status is derived from the due
//! date on every read and never stored.

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
    Bill, BillView, CreateBillPayload, GetBillsQuery, GetBillsResponse, SettleBillResponse,
    UpdateBillPayload,
};
use crate::ops::{
    OP_BILL_SETTLE, OpError, STEP_MARK_PAID, STEP_SETTLEMENT_TRANSACTION, should_fail_step,
};
use crate::transactions::{NewTransaction, insert_transaction};
use crate::utils::{
    db_error, db_error_with_context, parse_stored_amount, today_string, validate_bill_kind,
    validate_date, validate_limit, validate_offset, validate_positive_amount,
    validate_string_length,
};
use crate::wallets::get_wallet_owned;

pub fn extract_bill_from_row(row: libsql::Row) -> Result<Bill, (StatusCode, String)> {
    let id: String = row
        .get(0)
        .map_err(|_| db_error_with_context("invalid bill data"))?;
    let wallet_id: String = row
        .get(1)
        .map_err(|_| db_error_with_context("invalid bill data"))?;
    let user_id: String = row
        .get(2)
        .map_err(|_| db_error_with_context("invalid bill data"))?;
    let description: String = row
        .get(3)
        .map_err(|_| db_error_with_context("invalid bill data"))?;
    let amount_text: String = row
        .get(4)
        .map_err(|_| db_error_with_context("invalid bill data"))?;
    let kind: String = row
        .get(5)
        .map_err(|_| db_error_with_context("invalid bill data"))?;
    let due_date: String = row
        .get(6)
        .map_err(|_| db_error_with_context("invalid bill data"))?;
    let status: String = row
        .get(7)
        .map_err(|_| db_error_with_context("invalid bill data"))?;
    let category: String = row
        .get(8)
        .map_err(|_| db_error_with_context("invalid bill data"))?;

    Ok(Bill {
        id,
        wallet_id,
        user_id,
        description,
        amount: parse_stored_amount(&amount_text)?,
        kind,
        due_date,
        status,
        category,
    })
}

/// Derived display status. Dates are ISO strings so plain string comparison
/// orders them correctly. PAID bills keep their stored status.
pub fn display_status(bill: &Bill, today: &str) -> String {
    if bill.status == BILL_STATUS_PAID {
        return BILL_STATUS_PAID.to_string();
    }
    if bill.due_date.as_str() < today {
        BILL_DISPLAY_OVERDUE.to_string()
    } else if bill.due_date == today {
        BILL_DISPLAY_DUE_TODAY.to_string()
    } else {
        BILL_DISPLAY_PENDING.to_string()
    }
}

async fn get_bill_owned(
    db: &Db,
    user_id: &str,
    bill_id: &str,
) -> Result<Bill, (StatusCode, String)> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, wallet_id, user_id, description, amount, kind, due_date, status, category FROM bills WHERE id = ? AND user_id = ?",
            (bill_id, user_id),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query bill"))?;

    match rows.next().await.map_err(|_| db_error())? {
        Some(row) => extract_bill_from_row(row),
        None => Err((StatusCode::NOT_FOUND, "Bill not found".to_string())),
    }
}

pub async fn create_bill(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateBillPayload>,
) -> Result<(StatusCode, Json<Bill>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;

    validate_string_length(&payload.description, "Description", MAX_DESCRIPTION_LENGTH)?;
    let amount = validate_positive_amount(payload.amount, "Amount")?;
    validate_bill_kind(&payload.kind)?;
    validate_date(&payload.due_date)?;

    let wallet = get_wallet_owned(&app_state.db, &user.id, &payload.wallet_id).await?;

    let category = match payload.category {
        Some(category) if !category.trim().is_empty() => category.trim().to_string(),
        _ => {
            app_state
                .classifier
                .classify(
                    payload.description.trim(),
                    &user.id,
                    &wallet.kind,
                    FALLBACK_CATEGORY_BILL,
                )
                .await
        }
    };

    let bill_id = Uuid::new_v4().to_string();
    let amount_text = amount.to_string();
    let description = payload.description.trim().to_string();
    let due_date = payload.due_date.trim().to_string();

    let conn = app_state.db.write().await;
    conn.execute(
        "INSERT INTO bills (id, wallet_id, user_id, description, amount, kind, due_date, status, category) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        (
            bill_id.as_str(),
            wallet.id.as_str(),
            user.id.as_str(),
            description.as_str(),
            amount_text.as_str(),
            payload.kind.as_str(),
            due_date.as_str(),
            BILL_STATUS_PENDING,
            category.as_str(),
        ),
    )
    .await
    .map_err(|_| db_error_with_context("bill creation failed"))?;

    Ok((
        StatusCode::CREATED,
        Json(Bill {
            id: bill_id,
            wallet_id: wallet.id,
            user_id: user.id,
            description,
            amount,
            kind: payload.kind,
            due_date,
            status: BILL_STATUS_PENDING.to_string(),
            category,
        }),
    ))
}

/// Lists a wallet's bills split into receivables and payables, with totals
/// for the pending amounts and the overdue portion of each side.
pub async fn get_bills(
    State(app_state): State<AppState>,
    session: Session,
    Query(query): Query<GetBillsQuery>,
) -> Result<(StatusCode, Json<GetBillsResponse>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;
    get_wallet_owned(&app_state.db, &user.id, &query.wallet_id).await?;

    let limit = validate_limit(query.limit, DEFAULT_BILLS_LIMIT)?;
    let offset = validate_offset(query.offset)?;
    if let Some(ref start_date) = query.start_date {
        validate_date(start_date)?;
    }
    if let Some(ref end_date) = query.end_date {
        validate_date(end_date)?;
    }

    let start_date = query.start_date.unwrap_or_else(|| "0000-01-01".to_string());
    let end_date = query.end_date.unwrap_or_else(|| "9999-12-31".to_string());
    let today = today_string()?;

    let conn = app_state.db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, wallet_id, user_id, description, amount, kind, due_date, status, category FROM bills WHERE wallet_id = ? AND user_id = ? AND due_date BETWEEN ? AND ? ORDER BY due_date ASC LIMIT ? OFFSET ?",
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
        .map_err(|_| db_error_with_context("failed to query bills"))?;

    let mut receivables = Vec::new();
    let mut payables = Vec::new();
    let mut total_receivable = Decimal::ZERO;
    let mut total_payable = Decimal::ZERO;
    let mut overdue_receivable = Decimal::ZERO;
    let mut overdue_payable = Decimal::ZERO;

    while let Some(row) = rows.next().await.map_err(|_| db_error())? {
        let bill = extract_bill_from_row(row)?;
        let status = display_status(&bill, &today);
        let pending = bill.status == BILL_STATUS_PENDING;
        let overdue = status == BILL_DISPLAY_OVERDUE;

        if bill.kind == BILL_RECEIVABLE {
            if pending {
                total_receivable += bill.amount;
                if overdue {
                    overdue_receivable += bill.amount;
                }
            }
            receivables.push(BillView {
                bill,
                display_status: status,
            });
        } else {
            if pending {
                total_payable += bill.amount;
                if overdue {
                    overdue_payable += bill.amount;
                }
            }
            payables.push(BillView {
                bill,
                display_status: status,
            });
        }
    }

    Ok((
        StatusCode::OK,
        Json(GetBillsResponse {
            receivables,
            payables,
            total_receivable,
            total_payable,
            overdue_receivable,
            overdue_payable,
        }),
    ))
}

pub async fn update_bill(
    State(app_state): State<AppState>,
    session: Session,
    Path(bill_id): Path<String>,
    Json(payload): Json<UpdateBillPayload>,
) -> Result<(StatusCode, Json<Bill>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;

    if payload.description.is_none()
        && payload.amount.is_none()
        && payload.kind.is_none()
        && payload.due_date.is_none()
        && payload.category.is_none()
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
    if let Some(ref kind) = payload.kind {
        validate_bill_kind(kind)?;
    }
    if let Some(ref due_date) = payload.due_date {
        validate_date(due_date)?;
    }

    let existing = get_bill_owned(&app_state.db, &user.id, &bill_id).await?;
    if existing.status == BILL_STATUS_PAID {
        return Err((
            StatusCode::CONFLICT,
            "Paid bills cannot be modified".to_string(),
        ));
    }

    let updated_description = payload
        .description
        .as_deref()
        .map(str::trim)
        .unwrap_or(&existing.description);
    let updated_amount = amount.unwrap_or(existing.amount);
    let updated_kind = payload.kind.as_deref().unwrap_or(&existing.kind);
    let updated_due_date = payload
        .due_date
        .as_deref()
        .map(str::trim)
        .unwrap_or(&existing.due_date);
    let updated_category = payload.category.as_deref().unwrap_or(&existing.category);
    let amount_text = updated_amount.to_string();

    let conn = app_state.db.write().await;
    let affected_rows = conn
        .execute(
            "UPDATE bills SET description = ?, amount = ?, kind = ?, due_date = ?, category = ? WHERE id = ? AND user_id = ?",
            (
                updated_description,
                amount_text.as_str(),
                updated_kind,
                updated_due_date,
                updated_category,
                bill_id.as_str(),
                user.id.as_str(),
            ),
        )
        .await
        .map_err(|_| db_error_with_context("failed to update bill"))?;

    if affected_rows == 0 {
        return Err((StatusCode::NOT_FOUND, "Bill not found".to_string()));
    }

    Ok((
        StatusCode::OK,
        Json(Bill {
            id: bill_id,
            wallet_id: existing.wallet_id,
            user_id: existing.user_id,
            description: updated_description.to_string(),
            amount: updated_amount,
            kind: updated_kind.to_string(),
            due_date: updated_due_date.to_string(),
            status: existing.status,
            category: updated_category.to_string(),
        }),
    ))
}

pub async fn delete_bill(
    State(app_state): State<AppState>,
    session: Session,
    Path(bill_id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let user = get_current_user(&session).await?;

    let conn = app_state.db.write().await;
    let affected_rows = conn
        .execute(
            "DELETE FROM bills WHERE id = ? AND user_id = ?",
            (bill_id.as_str(), user.id.as_str()),
        )
        .await
        .map_err(|_| db_error_with_context("failed to delete bill"))?;

    if affected_rows == 0 {
        return Err((StatusCode::NOT_FOUND, "Bill not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Settles a PENDING bill: marks it PAID, then mirrors it into the ledger as
/// exactly one transaction dated today. Two sequential writes with no
/// rollback path; if the mirror insert fails the bill stays PAID and the
/// response says so, since un-marking it could double-settle under a retry
/// race.
pub async fn settle_bill(
    State(app_state): State<AppState>,
    session: Session,
    Path(bill_id): Path<String>,
) -> Result<(StatusCode, Json<SettleBillResponse>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;
    let db = &app_state.db;

    let bill = get_bill_owned(db, &user.id, &bill_id).await?;
    if bill.status != BILL_STATUS_PENDING {
        return Err(OpError::Validation("Bill is already settled".to_string()).into());
    }

    // Step 1: mark PAID.
    {
        let conn = db.write().await;
        let affected_rows = conn
            .execute(
                "UPDATE bills SET status = ? WHERE id = ? AND user_id = ? AND status = ?",
                (
                    BILL_STATUS_PAID,
                    bill_id.as_str(),
                    user.id.as_str(),
                    BILL_STATUS_PENDING,
                ),
            )
            .await
            .map_err(|_| {
                <(StatusCode, String)>::from(OpError::SingleWrite {
                    operation: OP_BILL_SETTLE,
                    step: STEP_MARK_PAID,
                })
            })?;
        if affected_rows == 0 {
            return Err(OpError::Validation("Bill is already settled".to_string()).into());
        }
    }

    // Step 2: mirror into the ledger.
    let direction = if bill.kind == BILL_PAYABLE {
        DIRECTION_EXPENSE
    } else {
        DIRECTION_INCOME
    };
    let category = if bill.category.trim().is_empty() {
        FALLBACK_CATEGORY_TRANSACTION.to_string()
    } else {
        bill.category.clone()
    };
    let description = format!("Baixa: {}", bill.description);
    let today = today_string()?;

    let injected = should_fail_step(db, OP_BILL_SETTLE, STEP_SETTLEMENT_TRANSACTION).await;
    let insert_result = if injected {
        Err(db_error_with_context("injected failure"))
    } else {
        insert_transaction(
            db,
            &NewTransaction {
                wallet_id: &bill.wallet_id,
                user_id: &user.id,
                description: &description,
                amount: bill.amount,
                direction,
                category: &category,
                transaction_date: &today,
            },
        )
        .await
    };

    let transaction = match insert_result {
        Ok(transaction) => transaction,
        Err(_) => {
            return Err(OpError::PartialWrite {
                operation: OP_BILL_SETTLE,
                step: STEP_SETTLEMENT_TRANSACTION,
                detail: format!("bill {} is marked PAID but has no ledger entry", bill_id),
            }
            .into());
        }
    };

    Ok((
        StatusCode::OK,
        Json(SettleBillResponse {
            bill_id,
            status: BILL_STATUS_PAID.to_string(),
            transaction,
        }),
    ))
}
