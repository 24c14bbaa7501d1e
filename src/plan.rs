use axum::{Json, extract::State, http::StatusCode};
use time::OffsetDateTime;
use tower_sessions::Session;

use crate::AppState;
use crate::auth::get_current_user;
use crate::constants::*;
use crate::models::{Entitlement, Profile};
use crate::utils::{db_error, db_error_with_context};

const SECONDS_PER_DAY: i64 = 86_400;

/// Computes the access level from the stored plan fields and wall-clock time.
///
/// VIP short-circuits to ACTIVE. Otherwise the remaining days are the
/// ceiling of the time left until valid_until; an expiry in the past means
/// EXPIRED regardless of the stored status. Pure function, no side effects.
pub fn evaluate(profile: &Profile, now: OffsetDateTime) -> Entitlement {
    if profile.plan_status == PLAN_VIP {
        return Entitlement {
            status: PLAN_ACTIVE.to_string(),
            days_remaining: VIP_DAYS_REMAINING,
        };
    }

    let valid_until = match OffsetDateTime::parse(
        &profile.valid_until,
        &time::format_description::well_known::Rfc3339,
    ) {
        Ok(parsed) => parsed,
        Err(_) => {
            return Entitlement {
                status: PLAN_EXPIRED.to_string(),
                days_remaining: 0,
            };
        }
    };

    let seconds = (valid_until - now).whole_seconds();
    // Ceiling division, so 1 second left still counts as 1 day.
    let days_remaining = (seconds + SECONDS_PER_DAY - 1).div_euclid(SECONDS_PER_DAY);

    if seconds < 0 {
        Entitlement {
            status: PLAN_EXPIRED.to_string(),
            days_remaining,
        }
    } else {
        Entitlement {
            status: profile.plan_status.clone(),
            days_remaining,
        }
    }
}

pub async fn get_plan(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<(StatusCode, Json<Entitlement>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;

    let conn = app_state.db.read().await;
    let mut rows = conn
        .query(
            "SELECT user_id, plan_status, valid_until FROM profiles WHERE user_id = ?",
            [user.id.as_str()],
        )
        .await
        .map_err(|_| db_error_with_context("failed to query profile"))?;

    let entitlement = match rows.next().await.map_err(|_| db_error())? {
        Some(row) => {
            let profile = Profile {
                user_id: row.get(0).map_err(|_| db_error())?,
                plan_status: row.get(1).map_err(|_| db_error())?,
                valid_until: row.get(2).map_err(|_| db_error())?,
            };
            evaluate(&profile, OffsetDateTime::now_utc())
        }
        // No profile means no plan was ever provisioned; treat as locked out.
        None => Entitlement {
            status: PLAN_EXPIRED.to_string(),
            days_remaining: 0,
        },
    };

    Ok((StatusCode::OK, Json(entitlement)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn profile(status: &str, valid_until: OffsetDateTime) -> Profile {
        Profile {
            user_id: "user-1".to_string(),
            plan_status: status.to_string(),
            valid_until: valid_until
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap(),
        }
    }

    #[test]
    fn vip_is_active_even_past_expiry() {
        let now = OffsetDateTime::now_utc();
        let result = evaluate(&profile(PLAN_VIP, now - Duration::days(30)), now);
        assert_eq!(result.status, PLAN_ACTIVE);
        assert_eq!(result.days_remaining, VIP_DAYS_REMAINING);
    }

    #[test]
    fn expired_one_second_past_valid_until() {
        let now = OffsetDateTime::now_utc();
        let result = evaluate(&profile(PLAN_TRIAL, now - Duration::seconds(1)), now);
        assert_eq!(result.status, PLAN_EXPIRED);
    }

    #[test]
    fn trial_with_one_day_left() {
        let now = OffsetDateTime::now_utc();
        let result = evaluate(&profile(PLAN_TRIAL, now + Duration::days(1)), now);
        assert_eq!(result.status, PLAN_TRIAL);
        assert_eq!(result.days_remaining, 1);
    }

    #[test]
    fn active_passes_through() {
        let now = OffsetDateTime::now_utc();
        let result = evaluate(&profile(PLAN_ACTIVE, now + Duration::days(20)), now);
        assert_eq!(result.status, PLAN_ACTIVE);
        assert_eq!(result.days_remaining, 20);
    }

    #[test]
    fn waiting_payment_passes_through_until_expiry() {
        let now = OffsetDateTime::now_utc();
        let result = evaluate(&profile(PLAN_WAITING_PAYMENT, now + Duration::days(2)), now);
        assert_eq!(result.status, PLAN_WAITING_PAYMENT);
    }

    #[test]
    fn unparseable_expiry_is_expired() {
        let result = evaluate(
            &Profile {
                user_id: "user-1".to_string(),
                plan_status: PLAN_TRIAL.to_string(),
                valid_until: "not-a-date".to_string(),
            },
            OffsetDateTime::now_utc(),
        );
        assert_eq!(result.status, PLAN_EXPIRED);
    }

    #[test]
    fn one_second_left_counts_as_one_day() {
        let now = OffsetDateTime::now_utc();
        let result = evaluate(&profile(PLAN_TRIAL, now + Duration::seconds(1)), now);
        assert_eq!(result.status, PLAN_TRIAL);
        assert_eq!(result.days_remaining, 1);
    }
}
