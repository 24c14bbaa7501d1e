use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use axum::{Json, extract::State, http::StatusCode};
use password_hash::rand_core::OsRng;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::AppState;
use crate::constants::*;
use crate::models::{LoginPayload, PublicUser, RegisterPayload};
use crate::utils::{db_error, db_error_with_context, now_rfc3339, validate_string_length};
use crate::wallets::bootstrap_personal_wallet;

const SESSION_USER_KEY: &str = "user";

#[derive(Serialize, Deserialize, Clone)]
pub struct SessionUser {
    pub id: String,
    pub username: String,
}

pub async fn get_current_user(session: &Session) -> Result<SessionUser, (StatusCode, String)> {
    match session.get::<SessionUser>(SESSION_USER_KEY).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err((StatusCode::UNAUTHORIZED, ERR_UNAUTHORIZED.to_string())),
        Err(_) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            ERR_INVALID_SESSION.to_string(),
        )),
    }
}

fn validate_username(username: &str) -> Result<(), (StatusCode, String)> {
    validate_string_length(username, "Username", MAX_USERNAME_LENGTH)?;
    if username.trim().len() < MIN_USERNAME_LENGTH {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Username must be at least {} characters", MIN_USERNAME_LENGTH),
        ));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), (StatusCode, String)> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
        ));
    }
    Ok(())
}

/// Creates the account plus everything a fresh account needs: a TRIAL
/// profile and the default PERSONAL wallet with its starter categories.
pub async fn register(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<RegisterPayload>,
) -> Result<(StatusCode, Json<PublicUser>), (StatusCode, String)> {
    let username = payload.username.trim().to_string();
    validate_username(&username)?;
    validate_password(&payload.password)?;

    let db = &app_state.db;

    {
        let conn = db.read().await;
        let mut rows = conn
            .query("SELECT id FROM users WHERE name = ?", [username.as_str()])
            .await
            .map_err(|_| db_error_with_context("failed to check existing user"))?;
        if rows.next().await.map_err(|_| db_error())?.is_some() {
            return Err((
                StatusCode::CONFLICT,
                "Username already taken".to_string(),
            ));
        }
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to hash password".to_string(),
            )
        })?
        .to_string();

    let user_id = Uuid::new_v4().to_string();
    let valid_until = (time::OffsetDateTime::now_utc() + time::Duration::days(TRIAL_DAYS))
        .format(&time::format_description::well_known::Rfc3339)
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let now = now_rfc3339()?;

    {
        let conn = db.write().await;
        conn.execute(
            "INSERT INTO users (id, name, password_hash) VALUES (?, ?, ?)",
            (user_id.as_str(), username.as_str(), password_hash.as_str()),
        )
        .await
        .map_err(|_| db_error_with_context("user creation failed"))?;

        conn.execute(
            "INSERT INTO profiles (user_id, plan_status, valid_until) VALUES (?, ?, ?)",
            (user_id.as_str(), PLAN_TRIAL, valid_until.as_str()),
        )
        .await
        .map_err(|_| db_error_with_context("profile creation failed"))?;
    }

    bootstrap_personal_wallet(db, &user_id, &now).await?;

    let user = SessionUser {
        id: user_id.clone(),
        username: username.clone(),
    };
    session
        .insert(SESSION_USER_KEY, user)
        .await
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ERR_INVALID_SESSION.to_string(),
            )
        })?;

    Ok((
        StatusCode::CREATED,
        Json(PublicUser {
            id: user_id,
            username,
        }),
    ))
}

pub async fn login(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<LoginPayload>,
) -> Result<(StatusCode, Json<PublicUser>), (StatusCode, String)> {
    let username = payload.username.trim().to_string();

    let (user_id, password_hash) = {
        let conn = app_state.db.read().await;
        let mut rows = conn
            .query(
                "SELECT id, password_hash FROM users WHERE name = ?",
                [username.as_str()],
            )
            .await
            .map_err(|_| db_error_with_context("failed to query user"))?;

        let row = rows
            .next()
            .await
            .map_err(|_| db_error())?
            .ok_or((StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()))?;

        let id: String = row.get(0).map_err(|_| db_error())?;
        let hash: String = row.get(1).map_err(|_| db_error())?;
        (id, hash)
    };

    let parsed_hash = PasswordHash::new(&password_hash).map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Corrupt password hash".to_string(),
        )
    })?;

    if Argon2::default()
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err((StatusCode::UNAUTHORIZED, "Invalid credentials".to_string()));
    }

    let user = SessionUser {
        id: user_id.clone(),
        username: username.clone(),
    };
    session
        .insert(SESSION_USER_KEY, user)
        .await
        .map_err(|_| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ERR_INVALID_SESSION.to_string(),
            )
        })?;

    Ok((
        StatusCode::OK,
        Json(PublicUser {
            id: user_id,
            username,
        }),
    ))
}

pub async fn me(session: Session) -> Result<(StatusCode, Json<PublicUser>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;
    Ok((
        StatusCode::OK,
        Json(PublicUser {
            id: user.id,
            username: user.username,
        }),
    ))
}

pub async fn logout(session: Session) -> Result<StatusCode, (StatusCode, String)> {
    session.flush().await.map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ERR_INVALID_SESSION.to_string(),
        )
    })?;
    Ok(StatusCode::NO_CONTENT)
}
