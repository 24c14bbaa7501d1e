use axum::http::StatusCode;
use rust_decimal::Decimal;

use crate::constants::*;

pub fn db_error() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        ERR_DATABASE_OPERATION.to_string(),
    )
}

pub fn db_error_with_context(context: &str) -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        format!("Database error: {}", context),
    )
}

pub fn validate_string_length(
    value: &str,
    field_name: &str,
    max_length: usize,
) -> Result<(), (StatusCode, String)> {
    if value.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("{} cannot be empty", field_name),
        ));
    }
    if value.len() > max_length {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("{} must be less than {} characters", field_name, max_length),
        ));
    }
    Ok(())
}

pub fn validate_date(value: &str) -> Result<(), (StatusCode, String)> {
    if value.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Date cannot be empty".to_string()));
    }

    let format = time::format_description::parse("[year]-[month]-[day]")
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid date format".to_string()))?;

    time::Date::parse(value.trim(), &format)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid date format".to_string()))?;

    Ok(())
}

/// Amounts are stored positive; sign comes from the transaction direction.
/// Rounds to cents so the ledger never accumulates sub-cent residue.
pub fn validate_positive_amount(
    amount: Decimal,
    field_name: &str,
) -> Result<Decimal, (StatusCode, String)> {
    if amount <= Decimal::ZERO {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("{} must be greater than zero", field_name),
        ));
    }
    Ok(amount.round_dp(2))
}

pub fn validate_direction(direction: &str) -> Result<(), (StatusCode, String)> {
    match direction {
        DIRECTION_INCOME | DIRECTION_EXPENSE => Ok(()),
        _ => Err((
            StatusCode::BAD_REQUEST,
            format!(
                "Direction must be {} or {}",
                DIRECTION_INCOME, DIRECTION_EXPENSE
            ),
        )),
    }
}

pub fn validate_wallet_kind(kind: &str) -> Result<(), (StatusCode, String)> {
    match kind {
        WALLET_PERSONAL | WALLET_BUSINESS => Ok(()),
        _ => Err((
            StatusCode::BAD_REQUEST,
            format!("Scope must be {} or {}", WALLET_PERSONAL, WALLET_BUSINESS),
        )),
    }
}

pub fn validate_bill_kind(kind: &str) -> Result<(), (StatusCode, String)> {
    match kind {
        BILL_PAYABLE | BILL_RECEIVABLE => Ok(()),
        _ => Err((
            StatusCode::BAD_REQUEST,
            format!("Bill kind must be {} or {}", BILL_PAYABLE, BILL_RECEIVABLE),
        )),
    }
}

pub fn validate_limit(limit: Option<u32>, default: u32) -> Result<u32, (StatusCode, String)> {
    match limit {
        Some(l) => {
            if l == 0 {
                Err((
                    StatusCode::BAD_REQUEST,
                    "Limit must be greater than 0".to_string(),
                ))
            } else if l > MAX_LIMIT {
                Err((
                    StatusCode::BAD_REQUEST,
                    format!("Limit cannot exceed {}", MAX_LIMIT),
                ))
            } else {
                Ok(l)
            }
        }
        None => Ok(default),
    }
}

pub fn validate_offset(offset: Option<u32>) -> Result<u32, (StatusCode, String)> {
    match offset {
        Some(o) => {
            if o > MAX_OFFSET {
                Err((
                    StatusCode::BAD_REQUEST,
                    format!("Offset cannot exceed {}", MAX_OFFSET),
                ))
            } else {
                Ok(o)
            }
        }
        None => Ok(0),
    }
}

/// Parses an amount column back into a Decimal. Amounts are persisted as
/// TEXT so nothing ever round-trips through binary floating point.
pub fn parse_stored_amount(value: &str) -> Result<Decimal, (StatusCode, String)> {
    value
        .parse::<Decimal>()
        .map_err(|_| db_error_with_context("invalid stored amount"))
}

pub fn today_string() -> Result<String, (StatusCode, String)> {
    let format = time::format_description::parse("[year]-[month]-[day]").map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Date format error: {}", e),
        )
    })?;
    time::OffsetDateTime::now_utc()
        .date()
        .format(&format)
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Date format error: {}", e),
            )
        })
}

pub fn now_rfc3339() -> Result<String, (StatusCode, String)> {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}
