use axum::{
    extract::{FromRef, FromRequestParts},
    http::header,
};
use jsonwebtoken::{DecodingKey, Validation, decode};
use sea_orm::EntityTrait;

use crate::{
    dto::auth::Claims,
    entity::{sea_orm_active_enums::Role, users::Entity as Users},
    error::AppError,
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }
}

pub fn ensure_role(user: &AuthUser, role: Role) -> Result<(), AppError> {
    if user.role != role {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    ensure_role(user, Role::Admin)
}

pub fn ensure_staff(user: &AuthUser) -> Result<(), AppError> {
    if !user.is_staff() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Owners may act on their own rows; staff may act on anyone's.
pub fn ensure_owner_or_staff(user: &AuthUser, owner_id: &str) -> Result<(), AppError> {
    if user.user_id != owner_id && !user.is_staff() {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub fn jwt_secret() -> Result<String, AppError> {
    std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))
}

/// Resolves the token subject against `users`. The stored role wins over the
/// role in the token, and deleted accounts are rejected.
pub async fn current_user(state: &AppState, user_id: &str) -> Result<AuthUser, AppError> {
    let user = Users::find_by_id(user_id.to_owned())
        .one(&state.orm)
        .await?
        .ok_or(AppError::Unauthorized)?;
    Ok(AuthUser {
        user_id: user.id,
        role: user.role,
    })
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?;

        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid Authorization header".into()))?;

        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::BadRequest("Invalid Authorization scheme".into()))?
            .trim();

        let secret = jwt_secret()?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized)?;

        let state = AppState::from_ref(state);
        current_user(&state, &decoded.claims.sub).await
    }
}
