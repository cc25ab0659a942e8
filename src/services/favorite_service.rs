use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, RelationTrait, Set,
};

use crate::{
    audit,
    dto::favorites::{AddFavoriteRequest, FavoriteTourList},
    entity::{
        favorites::{ActiveModel, Column, Entity as Favorites},
        tours::{self, Entity as Tours},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Favorite, Tour},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

pub async fn find_unique(
    state: &AppState,
    user_id: &str,
    tour_id: i32,
) -> AppResult<Option<Favorite>> {
    let favorite = Favorites::find()
        .filter(Column::UserId.eq(user_id))
        .filter(Column::TourId.eq(tour_id))
        .one(&state.orm)
        .await?;
    Ok(favorite.map(Favorite::from))
}

pub async fn count(state: &AppState, user_id: &str) -> AppResult<u64> {
    let total = Favorites::find()
        .filter(Column::UserId.eq(user_id))
        .count(&state.orm)
        .await?;
    Ok(total)
}

/// The user's favorite tours, most recently added first.
pub async fn list_favorites(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<FavoriteTourList>> {
    let (page, limit, offset) = pagination.normalize();

    let items = Tours::find()
        .join(JoinType::InnerJoin, tours::Relation::Favorites.def())
        .filter(Column::UserId.eq(user.user_id.as_str()))
        .order_by_desc(Column::CreatedAt)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Tour::from)
        .collect();

    let total = count(state, &user.user_id).await? as i64;

    Ok(ApiResponse::success(
        "OK",
        FavoriteTourList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Adding the same tour twice is a conflict, not a no-op.
pub async fn add_favorite(
    state: &AppState,
    user: &AuthUser,
    payload: AddFavoriteRequest,
) -> AppResult<ApiResponse<Favorite>> {
    let tour_exists = Tours::find_by_id(payload.tour_id)
        .one(&state.orm)
        .await?
        .is_some();
    if !tour_exists {
        return Err(AppError::Conflict(format!(
            "tour {} does not exist",
            payload.tour_id
        )));
    }

    if find_unique(state, &user.user_id, payload.tour_id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("Tour is already a favorite".into()));
    }

    let favorite = ActiveModel {
        user_id: Set(user.user_id.clone()),
        tour_id: Set(payload.tour_id),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        state,
        &user.user_id,
        "favorite_add",
        "favorites",
        serde_json::json!({ "tour_id": payload.tour_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Added to favorites",
        Favorite::from(favorite),
        Some(Meta::empty()),
    ))
}

pub async fn remove_favorite(
    state: &AppState,
    user: &AuthUser,
    tour_id: i32,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Favorites::delete_many()
        .filter(Column::UserId.eq(user.user_id.as_str()))
        .filter(Column::TourId.eq(tour_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        state,
        &user.user_id,
        "favorite_remove",
        "favorites",
        serde_json::json!({ "tour_id": tour_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from favorites",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
