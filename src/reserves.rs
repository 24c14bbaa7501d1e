//! Savings reserves. A reserve holds money set aside within a wallet, and
//! every movement in or out is mirrored into the ledger so the wallet balance
//! reflects it. The ordering is fixed: the reserve row is updated first, the
//! mirror transaction inserted second, and a failed mirror is reported as a
//! partial write rather than rolled back.

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
use crate::models::{CreateReservePayload, DeleteReserveQuery, MoveReservePayload, Reserve};
use crate::ops::{
    OP_RESERVE_CREATE, OP_RESERVE_DEPOSIT, OP_RESERVE_WITHDRAW, OpError, STEP_MIRROR_TRANSACTION,
    STEP_RESERVE_UPDATE, should_fail_step,
};
use crate::transactions::{NewTransaction, insert_transaction};
use crate::utils::{
    db_error, db_error_with_context, parse_stored_amount, today_string, validate_positive_amount,
    validate_string_length,
};
use crate::wallets::get_wallet_owned;

pub fn extract_reserve_from_row(row: libsql::Row) -> Result<Reserve, (StatusCode, String)> {
    let id: String = row
        .get(0)
        .map_err(|_| db_error_with_context("invalid reserve data"))?;
    let wallet_id: String = row
        .get(1)
        .map_err(|_| db_error_with_context("invalid reserve data"))?;
    let user_id: String = row
        .get(2)
        .map_err(|_| db_error_with_context("invalid reserve data"))?;
    let name: String = row
        .get(3)
        .map_err(|_| db_error_with_context("invalid reserve data"))?;
    let goal_text: String = row
        .get(4)
        .map_err(|_| db_error_with_context("invalid reserve data"))?;
    let current_text: String = row
        .get(5)
        .map_err(|_| db_error_with_context("invalid reserve data"))?;
    let created_at: String = row
        .get(6)
        .map_err(|_| db_error_with_context("invalid reserve data"))?;

    Ok(Reserve {
        id,
        wallet_id,
        user_id,
        name,
        goal_amount: parse_stored_amount(&goal_text)?,
        current_amount: parse_stored_amount(&current_text)?,
        created_at,
    })
}

async fn get_reserve_owned(
    db: &Db,
    user_id: &str,
    reserve_id: &str,
) -> Result<Reserve, (StatusCode, String)> {
    let conn = db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, wallet_id, user_id, name, goal_amount, current_amount, created_at FROM reserves WHERE id = ? AND user_id = ?",
            (reserve_id, user_id),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query reserve"))?;

    match rows.next().await.map_err(|_| db_error())? {
        Some(row) => extract_reserve_from_row(row),
        None => Err((StatusCode::NOT_FOUND, "Reserve not found".to_string())),
    }
}

// First write of every reserve movement; a failure here leaves no state
// change.
async fn set_reserve_amount(
    db: &Db,
    operation: &'static str,
    user_id: &str,
    reserve_id: &str,
    new_amount: Decimal,
) -> Result<(), (StatusCode, String)> {
    let amount_text = new_amount.to_string();
    let conn = db.write().await;
    let affected_rows = conn
        .execute(
            "UPDATE reserves SET current_amount = ? WHERE id = ? AND user_id = ?",
            (amount_text.as_str(), reserve_id, user_id),
        )
        .await
        .map_err(|_| {
            <(StatusCode, String)>::from(OpError::SingleWrite {
                operation,
                step: STEP_RESERVE_UPDATE,
            })
        })?;

    if affected_rows == 0 {
        return Err((StatusCode::NOT_FOUND, "Reserve not found".to_string()));
    }
    Ok(())
}

/// Mirrors a reserve movement into the ledger. Failure becomes a
/// PartialWrite naming the reserve so the caller knows which rows disagree.
async fn mirror_reserve_movement(
    db: &Db,
    operation: &'static str,
    reserve: &Reserve,
    user_id: &str,
    description: &str,
    amount: Decimal,
    direction: &str,
) -> Result<(), OpError> {
    let today = today_string().map_err(|(_, detail)| OpError::PartialWrite {
        operation,
        step: STEP_MIRROR_TRANSACTION,
        detail,
    })?;

    let injected = should_fail_step(db, operation, STEP_MIRROR_TRANSACTION).await;
    let insert_result = if injected {
        Err(db_error_with_context("injected failure"))
    } else {
        insert_transaction(
            db,
            &NewTransaction {
                wallet_id: &reserve.wallet_id,
                user_id,
                description,
                amount,
                direction,
                category: CATEGORY_INVESTMENT,
                transaction_date: &today,
            },
        )
        .await
    };

    match insert_result {
        Ok(_) => Ok(()),
        Err(_) => Err(OpError::PartialWrite {
            operation,
            step: STEP_MIRROR_TRANSACTION,
            detail: format!(
                "reserve {} was updated but the ledger has no matching entry",
                reserve.id
            ),
        }),
    }
}

/// Creates a reserve; a non-zero initial amount also writes the initial
/// funding into the ledger as an expense.
pub async fn create_reserve(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateReservePayload>,
) -> Result<(StatusCode, Json<Reserve>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;
    let db = &app_state.db;

    validate_string_length(&payload.name, "Reserve name", MAX_RESERVE_NAME_LENGTH)?;
    get_wallet_owned(db, &user.id, &payload.wallet_id).await?;

    let goal_amount = match payload.goal_amount {
        Some(goal) => validate_positive_amount(goal, "Goal amount")?,
        None => Decimal::ZERO,
    };
    let initial_amount = match payload.initial_amount {
        Some(initial) => validate_positive_amount(initial, "Initial amount")?,
        None => Decimal::ZERO,
    };

    let reserve_id = Uuid::new_v4().to_string();
    let name = payload.name.trim().to_string();
    let created_at = crate::utils::now_rfc3339()?;
    let goal_text = goal_amount.to_string();
    let initial_text = initial_amount.to_string();

    {
        let conn = db.write().await;
        conn.execute(
            "INSERT INTO reserves (id, wallet_id, user_id, name, goal_amount, current_amount, created_at) VALUES (?, ?, ?, ?, ?, ?, ?)",
            (
                reserve_id.as_str(),
                payload.wallet_id.as_str(),
                user.id.as_str(),
                name.as_str(),
                goal_text.as_str(),
                initial_text.as_str(),
                created_at.as_str(),
            ),
        )
        .await
        .map_err(|_| db_error_with_context("reserve creation failed"))?;
    }

    let reserve = Reserve {
        id: reserve_id,
        wallet_id: payload.wallet_id,
        user_id: user.id.clone(),
        name,
        goal_amount,
        current_amount: initial_amount,
        created_at,
    };

    if initial_amount > Decimal::ZERO {
        let description = format!("Aplicação Inicial: {}", reserve.name);
        mirror_reserve_movement(
            db,
            OP_RESERVE_CREATE,
            &reserve,
            &user.id,
            &description,
            initial_amount,
            DIRECTION_EXPENSE,
        )
        .await
        .map_err(<(StatusCode, String)>::from)?;
    }

    Ok((StatusCode::CREATED, Json(reserve)))
}

pub async fn get_reserves(
    State(app_state): State<AppState>,
    session: Session,
    Path(wallet_id): Path<String>,
) -> Result<(StatusCode, Json<Vec<Reserve>>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;
    get_wallet_owned(&app_state.db, &user.id, &wallet_id).await?;

    let conn = app_state.db.read().await;
    let mut rows = conn
        .query(
            "SELECT id, wallet_id, user_id, name, goal_amount, current_amount, created_at FROM reserves WHERE wallet_id = ? AND user_id = ? ORDER BY created_at ASC",
            (wallet_id.as_str(), user.id.as_str()),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query reserves"))?;

    let mut reserves = Vec::new();
    while let Some(row) = rows.next().await.map_err(|_| db_error())? {
        reserves.push(extract_reserve_from_row(row)?);
    }

    Ok((StatusCode::OK, Json(reserves)))
}

/// Deposit: raises the reserve balance, then mirrors an EXPENSE into the
/// ledger (money left the spendable balance).
pub async fn deposit_reserve(
    State(app_state): State<AppState>,
    session: Session,
    Path(reserve_id): Path<String>,
    Json(payload): Json<MoveReservePayload>,
) -> Result<(StatusCode, Json<Reserve>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;
    let db = &app_state.db;

    let amount = validate_positive_amount(payload.amount, "Amount")?;
    let reserve = get_reserve_owned(db, &user.id, &reserve_id).await?;

    let new_amount = reserve.current_amount + amount;
    set_reserve_amount(db, OP_RESERVE_DEPOSIT, &user.id, &reserve_id, new_amount).await?;

    let description = format!("Aplicação: {}", reserve.name);
    mirror_reserve_movement(
        db,
        OP_RESERVE_DEPOSIT,
        &reserve,
        &user.id,
        &description,
        amount,
        DIRECTION_EXPENSE,
    )
    .await
    .map_err(<(StatusCode, String)>::from)?;

    Ok((
        StatusCode::OK,
        Json(Reserve {
            current_amount: new_amount,
            ..reserve
        }),
    ))
}

/// Withdraw: checks the reserve covers the amount before any write, lowers
/// the reserve balance, then mirrors an INCOME into the ledger. A reserve
/// balance can never go negative.
pub async fn withdraw_reserve(
    State(app_state): State<AppState>,
    session: Session,
    Path(reserve_id): Path<String>,
    Json(payload): Json<MoveReservePayload>,
) -> Result<(StatusCode, Json<Reserve>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;
    let db = &app_state.db;

    let amount = validate_positive_amount(payload.amount, "Amount")?;
    let reserve = get_reserve_owned(db, &user.id, &reserve_id).await?;

    if amount > reserve.current_amount {
        return Err(OpError::Validation(
            "Withdrawal exceeds the reserve balance".to_string(),
        )
        .into());
    }

    let new_amount = reserve.current_amount - amount;
    set_reserve_amount(db, OP_RESERVE_WITHDRAW, &user.id, &reserve_id, new_amount).await?;

    let description = format!("Resgate: {}", reserve.name);
    mirror_reserve_movement(
        db,
        OP_RESERVE_WITHDRAW,
        &reserve,
        &user.id,
        &description,
        amount,
        DIRECTION_INCOME,
    )
    .await
    .map_err(<(StatusCode, String)>::from)?;

    Ok((
        StatusCode::OK,
        Json(Reserve {
            current_amount: new_amount,
            ..reserve
        }),
    ))
}

/// Deletes a reserve. A reserve still holding money requires confirm=true
/// and the held amount is forfeited, not returned to the wallet; the caller
/// should withdraw first if they want the money back.
pub async fn delete_reserve(
    State(app_state): State<AppState>,
    session: Session,
    Path(reserve_id): Path<String>,
    Query(query): Query<DeleteReserveQuery>,
) -> Result<StatusCode, (StatusCode, String)> {
    let user = get_current_user(&session).await?;
    let db = &app_state.db;

    let reserve = get_reserve_owned(db, &user.id, &reserve_id).await?;

    if reserve.current_amount > Decimal::ZERO && !query.confirm {
        return Err((
            StatusCode::CONFLICT,
            format!(
                "Reserve still holds {}; pass confirm=true to delete and forfeit it",
                reserve.current_amount
            ),
        ));
    }

    let conn = db.write().await;
    let affected_rows = conn
        .execute(
            "DELETE FROM reserves WHERE id = ? AND user_id = ?",
            (reserve_id.as_str(), user.id.as_str()),
        )
        .await
        .map_err(|_| db_error_with_context("failed to delete reserve"))?;

    if affected_rows == 0 {
        return Err((StatusCode::NOT_FOUND, "Reserve not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
