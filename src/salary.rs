//! Salary transfer from a business wallet to the user's personal wallet.
//!
//! Two ledger writes in fixed order: the personal INCOME first, then the
//! business EXPENSE. If the second write fails the first is compensated by
//! deleting the income row, so the pair either both exist or neither does.
//! A failed compensation is the worst outcome this server can produce and is
//! logged at ERROR with both record ids before the response goes out.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tower_sessions::Session;

use crate::AppState;
use crate::auth::get_current_user;
use crate::constants::*;
use crate::models::{PaySalaryPayload, PaySalaryResponse};
use crate::ops::{
    OP_SALARY_TRANSFER, OpError, STEP_BUSINESS_EXPENSE, STEP_COMPENSATION_DELETE,
    STEP_PERSONAL_INCOME, should_fail_step,
};
use crate::transactions::{NewTransaction, insert_transaction};
use crate::utils::{db_error_with_context, today_string, validate_positive_amount};
use crate::wallets::{get_personal_wallet, get_wallet_owned};

pub async fn pay_salary(
    State(app_state): State<AppState>,
    session: Session,
    Path(business_wallet_id): Path<String>,
    Json(payload): Json<PaySalaryPayload>,
) -> Result<(StatusCode, Json<PaySalaryResponse>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;
    let db = &app_state.db;

    let amount = validate_positive_amount(payload.amount, "Amount")?;

    let business = get_wallet_owned(db, &user.id, &business_wallet_id).await?;
    if business.kind != WALLET_BUSINESS {
        return Err(OpError::Validation(
            "Salary can only be paid from a business wallet".to_string(),
        )
        .into());
    }
    let personal = get_personal_wallet(db, &user.id).await?;

    let today = today_string()?;
    let income_description = format!("Salário recebido de {}", business.name);

    // Step 1: personal INCOME.
    let injected = should_fail_step(db, OP_SALARY_TRANSFER, STEP_PERSONAL_INCOME).await;
    let income_result = if injected {
        Err(db_error_with_context("injected failure"))
    } else {
        insert_transaction(
            db,
            &NewTransaction {
                wallet_id: &personal.id,
                user_id: &user.id,
                description: &income_description,
                amount,
                direction: DIRECTION_INCOME,
                category: CATEGORY_SALARY,
                transaction_date: &today,
            },
        )
        .await
    };

    let personal_transaction = match income_result {
        Ok(transaction) => transaction,
        Err(_) => {
            return Err(OpError::SingleWrite {
                operation: OP_SALARY_TRANSFER,
                step: STEP_PERSONAL_INCOME,
            }
            .into());
        }
    };

    // Step 2: business EXPENSE.
    let injected = should_fail_step(db, OP_SALARY_TRANSFER, STEP_BUSINESS_EXPENSE).await;
    let expense_result = if injected {
        Err(db_error_with_context("injected failure"))
    } else {
        insert_transaction(
            db,
            &NewTransaction {
                wallet_id: &business.id,
                user_id: &user.id,
                description: "Retirada de Lucro / Salário",
                amount,
                direction: DIRECTION_EXPENSE,
                category: CATEGORY_PRO_LABORE,
                transaction_date: &today,
            },
        )
        .await
    };

    let business_transaction = match expense_result {
        Ok(transaction) => transaction,
        Err(_) => {
            // Compensate: remove the income so the transfer never half-exists.
            let injected =
                should_fail_step(db, OP_SALARY_TRANSFER, STEP_COMPENSATION_DELETE).await;
            let compensation = if injected {
                Err(db_error_with_context("injected failure"))
            } else {
                let conn = db.write().await;
                conn.execute(
                    "DELETE FROM transactions WHERE id = ? AND user_id = ?",
                    (personal_transaction.id.as_str(), user.id.as_str()),
                )
                .await
                .map_err(|_| db_error_with_context("compensation delete failed"))
            };

            match compensation {
                Ok(_) => {
                    return Err(OpError::PartialWrite {
                        operation: OP_SALARY_TRANSFER,
                        step: STEP_BUSINESS_EXPENSE,
                        detail: "business expense failed; the personal income was removed"
                            .to_string(),
                    }
                    .into());
                }
                Err(_) => {
                    tracing::error!(
                        personal_transaction_id = %personal_transaction.id,
                        business_wallet_id = %business.id,
                        amount = %amount,
                        "salary transfer compensation failed; orphan income row remains"
                    );
                    return Err(OpError::CompensationFailed {
                        operation: OP_SALARY_TRANSFER,
                        detail: format!(
                            "orphan income transaction {} must be removed manually",
                            personal_transaction.id
                        ),
                    }
                    .into());
                }
            }
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(PaySalaryResponse {
            personal_transaction,
            business_transaction,
        }),
    ))
}
