use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use crate::{
    audit,
    dto::users::{UpdateProfileRequest, UpdateRoleRequest, UserList},
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        users::{ActiveModel as UserActive, Column, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::User,
    response::{ApiResponse, Meta},
    routes::params::UserQuery,
    state::AppState,
};

pub async fn find_unique(state: &AppState, id: &str) -> AppResult<Option<User>> {
    let user = Users::find_by_id(id.to_owned()).one(&state.orm).await?;
    Ok(user.map(User::from))
}

pub async fn find_unique_or_throw(state: &AppState, id: &str) -> AppResult<User> {
    find_unique(state, id).await?.ok_or(AppError::NotFound)
}

/// Returns the full row, including the password hash, for credential checks.
pub async fn find_by_email(state: &AppState, email: &str) -> AppResult<Option<UserModel>> {
    let user = Users::find()
        .filter(Column::Email.eq(email.trim().to_lowercase()))
        .one(&state.orm)
        .await?;
    Ok(user)
}

fn filter_condition(query: &UserQuery) -> Condition {
    let mut condition = Condition::all();
    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Email).ilike(pattern)),
        );
    }
    if let Some(role) = query.role {
        condition = condition.add(Column::Role.eq(role));
    }
    condition
}

pub async fn count(state: &AppState, query: &UserQuery) -> AppResult<u64> {
    let total = Users::find()
        .filter(filter_condition(query))
        .count(&state.orm)
        .await?;
    Ok(total)
}

pub async fn find_many(
    state: &AppState,
    user: &AuthUser,
    query: UserQuery,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();

    let finder = Users::find()
        .filter(filter_condition(&query))
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();

    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let existing = Users::find_by_id(user.user_id.clone())
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = existing.into();
    if let Some(name) = payload.name {
        active.name = Set(Some(name));
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image));
    }
    if let Some(phone) = payload.phone {
        active.phone = Set(Some(phone));
    }
    if let Some(address) = payload.address {
        active.address = Set(Some(address));
    }
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Profile updated",
        User::from(updated),
        Some(Meta::empty()),
    ))
}

pub async fn update_role(
    state: &AppState,
    user: &AuthUser,
    id: &str,
    payload: UpdateRoleRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let existing = Users::find_by_id(id.to_owned())
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = existing.into();
    active.role = Set(payload.role);
    let updated = active.update(&state.orm).await?;

    audit::record(
        state,
        &user.user_id,
        "user_role_update",
        "users",
        serde_json::json!({ "user_id": updated.id, "role": updated.role }),
    )
    .await;

    Ok(ApiResponse::success(
        "Role updated",
        User::from(updated),
        Some(Meta::empty()),
    ))
}

pub async fn verify_email(state: &AppState, id: &str) -> AppResult<User> {
    let existing = Users::find_by_id(id.to_owned())
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: UserActive = existing.into();
    active.email_verified = Set(Some(Utc::now().into()));
    let updated = active.update(&state.orm).await?;
    Ok(updated.into())
}

/// Reviews, favorites and tickets go with the user; orders block the delete.
pub async fn delete(
    state: &AppState,
    user: &AuthUser,
    id: &str,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(id))
        .count(&txn)
        .await?;
    if orders > 0 {
        txn.rollback().await?;
        return Err(AppError::Conflict(format!(
            "user has {orders} order(s) and cannot be deleted"
        )));
    }

    let result = Users::delete_by_id(id.to_owned()).exec(&txn).await?;
    if result.rows_affected == 0 {
        txn.rollback().await?;
        return Err(AppError::NotFound);
    }
    txn.commit().await?;

    audit::record(
        state,
        &user.user_id,
        "user_delete",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
