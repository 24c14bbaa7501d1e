//! Failure taxonomy for consistency operations.
//!
//! The store exposes no multi-table transaction, so every operation that
//! spans more than one row is a fixed sequence of single writes. When a later
//! write fails the operation either compensates (salary transfer) or reports
//! that it was partially applied (reserve moves, bill settlement). The error
//! classes here keep those outcomes distinguishable all the way to the
//! HTTP response.

use axum::http::StatusCode;

use crate::Db;

// Operation and step names used in diagnostics and failure injection.
pub const OP_SALARY_TRANSFER: &str = "salary_transfer";
pub const OP_RESERVE_DEPOSIT: &str = "reserve_deposit";
pub const OP_RESERVE_WITHDRAW: &str = "reserve_withdraw";
pub const OP_RESERVE_CREATE: &str = "reserve_create";
pub const OP_BILL_SETTLE: &str = "bill_settle";

pub const STEP_PERSONAL_INCOME: &str = "personal_income";
pub const STEP_BUSINESS_EXPENSE: &str = "business_expense";
pub const STEP_COMPENSATION_DELETE: &str = "compensation_delete";
pub const STEP_RESERVE_UPDATE: &str = "reserve_update";
pub const STEP_MIRROR_TRANSACTION: &str = "mirror_transaction";
pub const STEP_MARK_PAID: &str = "mark_paid";
pub const STEP_SETTLEMENT_TRANSACTION: &str = "settlement_transaction";

#[derive(Debug)]
pub enum OpError {
    /// Precondition violated; rejected before any write.
    Validation(String),
    /// The only write of a single-write operation failed; no state changed.
    SingleWrite {
        operation: &'static str,
        step: &'static str,
    },
    /// A later step failed after earlier writes succeeded and either no
    /// compensation exists or compensation succeeded. The caller must be told
    /// which records are affected so the user can reconcile manually.
    PartialWrite {
        operation: &'static str,
        step: &'static str,
        detail: String,
    },
    /// A compensating action itself failed; the ledger is now silently
    /// inconsistent. The most severe class: callers must log it at ERROR with
    /// the affected record ids before converting to a response.
    CompensationFailed {
        operation: &'static str,
        detail: String,
    },
}

impl From<OpError> for (StatusCode, String) {
    fn from(value: OpError) -> Self {
        match value {
            OpError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            OpError::SingleWrite { operation, step } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("{}: {} failed; no state was changed", operation, step),
            ),
            OpError::PartialWrite {
                operation,
                step,
                detail,
            } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!(
                    "Operation partially applied: {} failed at {} ({})",
                    operation, step, detail
                ),
            ),
            OpError::CompensationFailed { operation, detail } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!(
                    "Compensation failed: {} left inconsistent state ({})",
                    operation, detail
                ),
            ),
        }
    }
}

/// Consumes a one-shot failure injection for the given operation step.
///
/// Tests create the failure_injections table and seed rows to force a
/// specific step to fail; production databases never have the table, so the
/// query error short-circuits to false.
pub async fn should_fail_step(db: &Db, operation: &str, step: &str) -> bool {
    let conn = db.write().await;
    let mut rows = match conn
        .query(
            "SELECT fail_once FROM failure_injections WHERE op = ? AND step = ?",
            (operation, step),
        )
        .await
    {
        Ok(rows) => rows,
        Err(_) => return false,
    };

    let row = match rows.next().await {
        Ok(Some(row)) => row,
        _ => return false,
    };

    let fail_once: i64 = match row.get(0) {
        Ok(value) => value,
        Err(_) => return false,
    };

    if fail_once == 1 {
        let _ = conn
            .execute(
                "DELETE FROM failure_injections WHERE op = ? AND step = ?",
                (operation, step),
            )
            .await;
        return true;
    }

    false
}
