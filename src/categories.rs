use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::AppState;
use crate::auth::get_current_user;
use crate::constants::*;
use crate::models::{
    Category, CreateCategoryPayload, GetCategoriesQuery, GetCategoriesResponse,
    UpdateCategoryPayload,
};
use crate::utils::{
    db_error, db_error_with_context, validate_direction, validate_limit, validate_offset,
    validate_string_length, validate_wallet_kind,
};

pub fn extract_category_from_row(row: libsql::Row) -> Result<Category, (StatusCode, String)> {
    let id: String = row
        .get(0)
        .map_err(|_| db_error_with_context("invalid category data"))?;
    let user_id: String = row
        .get(1)
        .map_err(|_| db_error_with_context("invalid category data"))?;
    let name: String = row
        .get(2)
        .map_err(|_| db_error_with_context("invalid category data"))?;
    let color: String = row
        .get(3)
        .map_err(|_| db_error_with_context("invalid category data"))?;
    let kind: String = row
        .get(4)
        .map_err(|_| db_error_with_context("invalid category data"))?;
    let scope: String = row
        .get(5)
        .map_err(|_| db_error_with_context("invalid category data"))?;

    Ok(Category {
        id,
        user_id,
        name,
        color,
        kind,
        scope,
    })
}

pub async fn create_category(
    State(app_state): State<AppState>,
    session: Session,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<(StatusCode, Json<Category>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;

    validate_string_length(&payload.name, "Category name", MAX_CATEGORY_NAME_LENGTH)?;
    validate_direction(&payload.kind)?;
    validate_wallet_kind(&payload.scope)?;

    let name = payload.name.trim().to_string();
    let category_id = Uuid::new_v4().to_string();

    let conn = app_state.db.write().await;

    // Duplicate names within the same scope are confusing in pickers.
    let mut existing = conn
        .query(
            "SELECT COUNT(*) FROM categories WHERE user_id = ? AND scope = ? AND name = ?",
            (user.id.as_str(), payload.scope.as_str(), name.as_str()),
        )
        .await
        .map_err(|_| db_error_with_context("failed to check category name"))?;

    if let Some(row) = existing.next().await.map_err(|_| db_error())? {
        let count: u32 = row.get(0).map_err(|_| db_error())?;
        if count > 0 {
            return Err((
                StatusCode::CONFLICT,
                "Category with this name already exists".to_string(),
            ));
        }
    }

    conn.execute(
        "INSERT INTO categories (id, user_id, name, color, kind, scope) VALUES (?, ?, ?, ?, ?, ?)",
        (
            category_id.as_str(),
            user.id.as_str(),
            name.as_str(),
            payload.color.as_str(),
            payload.kind.as_str(),
            payload.scope.as_str(),
        ),
    )
    .await
    .map_err(|_| db_error_with_context("category creation failed"))?;

    Ok((
        StatusCode::CREATED,
        Json(Category {
            id: category_id,
            user_id: user.id,
            name,
            color: payload.color,
            kind: payload.kind,
            scope: payload.scope,
        }),
    ))
}

pub async fn get_categories(
    State(app_state): State<AppState>,
    session: Session,
    Query(query): Query<GetCategoriesQuery>,
) -> Result<(StatusCode, Json<GetCategoriesResponse>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;

    let limit = validate_limit(query.limit, DEFAULT_CATEGORIES_LIMIT)?;
    let offset = validate_offset(query.offset)?;
    if let Some(ref scope) = query.scope {
        validate_wallet_kind(scope)?;
    }

    let conn = app_state.db.read().await;

    let (total_count, mut rows) = match query.scope {
        Some(ref scope) => {
            let mut count_rows = conn
                .query(
                    "SELECT COUNT(*) FROM categories WHERE user_id = ? AND scope = ?",
                    (user.id.as_str(), scope.as_str()),
                )
                .await
                .map_err(|_| db_error_with_context("failed to count categories"))?;
            let count: u32 = match count_rows.next().await.map_err(|_| db_error())? {
                Some(row) => row.get(0).map_err(|_| db_error())?,
                None => 0,
            };
            let rows = conn
                .query(
                    "SELECT id, user_id, name, color, kind, scope FROM categories WHERE user_id = ? AND scope = ? ORDER BY name ASC LIMIT ? OFFSET ?",
                    (user.id.as_str(), scope.as_str(), limit, offset),
                )
                .await
                .map_err(|_| db_error_with_context("failed to query categories"))?;
            (count, rows)
        }
        None => {
            let mut count_rows = conn
                .query(
                    "SELECT COUNT(*) FROM categories WHERE user_id = ?",
                    [user.id.as_str()],
                )
                .await
                .map_err(|_| db_error_with_context("failed to count categories"))?;
            let count: u32 = match count_rows.next().await.map_err(|_| db_error())? {
                Some(row) => row.get(0).map_err(|_| db_error())?,
                None => 0,
            };
            let rows = conn
                .query(
                    "SELECT id, user_id, name, color, kind, scope FROM categories WHERE user_id = ? ORDER BY name ASC LIMIT ? OFFSET ?",
                    (user.id.as_str(), limit, offset),
                )
                .await
                .map_err(|_| db_error_with_context("failed to query categories"))?;
            (count, rows)
        }
    };

    let mut categories = Vec::new();
    while let Some(row) = rows.next().await.map_err(|_| db_error())? {
        categories.push(extract_category_from_row(row)?);
    }

    Ok((
        StatusCode::OK,
        Json(GetCategoriesResponse {
            categories,
            total_count,
        }),
    ))
}

pub async fn update_category(
    State(app_state): State<AppState>,
    session: Session,
    Path(category_id): Path<String>,
    Json(payload): Json<UpdateCategoryPayload>,
) -> Result<(StatusCode, Json<Category>), (StatusCode, String)> {
    let user = get_current_user(&session).await?;

    if payload.name.is_none() && payload.color.is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            "At least one field must be provided for update".to_string(),
        ));
    }
    if let Some(ref name) = payload.name {
        validate_string_length(name, "Category name", MAX_CATEGORY_NAME_LENGTH)?;
    }

    let conn = app_state.db.write().await;

    let mut existing_rows = conn
        .query(
            "SELECT id, user_id, name, color, kind, scope FROM categories WHERE id = ? AND user_id = ?",
            (category_id.as_str(), user.id.as_str()),
        )
        .await
        .map_err(|_| db_error_with_context("failed to query existing category"))?;

    let existing = match existing_rows.next().await.map_err(|_| db_error())? {
        Some(row) => extract_category_from_row(row)?,
        None => return Err((StatusCode::NOT_FOUND, "Category not found".to_string())),
    };

    let updated_name = payload
        .name
        .as_deref()
        .map(str::trim)
        .unwrap_or(&existing.name);
    let updated_color = payload.color.as_deref().unwrap_or(&existing.color);

    let affected_rows = conn
        .execute(
            "UPDATE categories SET name = ?, color = ? WHERE id = ? AND user_id = ?",
            (
                updated_name,
                updated_color,
                category_id.as_str(),
                user.id.as_str(),
            ),
        )
        .await
        .map_err(|_| db_error_with_context("failed to update category"))?;

    if affected_rows == 0 {
        return Err((StatusCode::NOT_FOUND, "Category not found".to_string()));
    }

    Ok((
        StatusCode::OK,
        Json(Category {
            id: category_id,
            user_id: existing.user_id,
            name: updated_name.to_string(),
            color: updated_color.to_string(),
            kind: existing.kind,
            scope: existing.scope,
        }),
    ))
}

/// Deleting a category leaves existing transactions untouched; they keep the
/// category name as plain text.
pub async fn delete_category(
    State(app_state): State<AppState>,
    session: Session,
    Path(category_id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let user = get_current_user(&session).await?;

    let conn = app_state.db.write().await;
    let affected_rows = conn
        .execute(
            "DELETE FROM categories WHERE id = ? AND user_id = ?",
            (category_id.as_str(), user.id.as_str()),
        )
        .await
        .map_err(|_| db_error_with_context("failed to delete category"))?;

    if affected_rows == 0 {
        return Err((StatusCode::NOT_FOUND, "Category not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}
