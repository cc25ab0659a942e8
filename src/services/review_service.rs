use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};

use crate::{
    audit,
    dto::{
        reviews::{ApproveReviewRequest, CreateReviewRequest, ReviewList, UpdateReviewRequest},
        tours::RatingSummary,
    },
    entity::{
        reviews::{ActiveModel, Column, Entity as Reviews},
        tours::Entity as Tours,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_owner_or_staff, ensure_staff},
    models::Review,
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ReviewQuery},
    state::AppState,
    validation::{require_non_empty, validate_rating},
};

pub async fn find_unique(state: &AppState, id: i32) -> AppResult<Option<Review>> {
    let review = Reviews::find_by_id(id).one(&state.orm).await?;
    Ok(review.map(Review::from))
}

pub async fn find_unique_or_throw(state: &AppState, id: i32) -> AppResult<Review> {
    find_unique(state, id).await?.ok_or(AppError::NotFound)
}

fn filter_condition(query: &ReviewQuery) -> Condition {
    let mut condition = Condition::all();
    if let Some(tour_id) = query.tour_id {
        condition = condition.add(Column::TourId.eq(tour_id));
    }
    if let Some(user_id) = query.user_id.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Column::UserId.eq(user_id.clone()));
    }
    if let Some(is_approved) = query.is_approved {
        condition = condition.add(Column::IsApproved.eq(is_approved));
    }
    if let Some(min_rating) = query.min_rating {
        condition = condition.add(Column::Rating.gte(min_rating));
    }
    condition
}

pub async fn count(state: &AppState, query: &ReviewQuery) -> AppResult<u64> {
    let total = Reviews::find()
        .filter(filter_condition(query))
        .count(&state.orm)
        .await?;
    Ok(total)
}

/// Moderation listing over every review.
pub async fn find_many(
    state: &AppState,
    user: &AuthUser,
    query: ReviewQuery,
) -> AppResult<ApiResponse<ReviewList>> {
    ensure_staff(user)?;
    let (page, limit, offset) = query.pagination().normalize();
    let finder = Reviews::find()
        .filter(filter_condition(&query))
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Review::from)
        .collect();

    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Public listing: approved reviews of one tour, newest first.
pub async fn list_for_tour(
    state: &AppState,
    tour_id: i32,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Reviews::find()
        .filter(Column::TourId.eq(tour_id))
        .filter(Column::IsApproved.eq(true))
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Review::from)
        .collect();

    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn approved_for_tour(state: &AppState, tour_id: i32, limit: u64) -> AppResult<Vec<Review>> {
    let reviews = Reviews::find()
        .filter(Column::TourId.eq(tour_id))
        .filter(Column::IsApproved.eq(true))
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Review::from)
        .collect();
    Ok(reviews)
}

/// Count / avg / min / max over approved ratings of a tour.
pub async fn aggregate_for_tour(state: &AppState, tour_id: i32) -> AppResult<RatingSummary> {
    let (count, average, min, max): (i64, Option<f64>, Option<i32>, Option<i32>) =
        sqlx::query_as(
            r#"
            SELECT COUNT(*), AVG(rating)::float8, MIN(rating), MAX(rating)
            FROM reviews
            WHERE tour_id = $1 AND is_approved
            "#,
        )
        .bind(tour_id)
        .fetch_one(&state.pool)
        .await?;

    Ok(RatingSummary {
        count,
        average,
        min,
        max,
    })
}

pub async fn create(
    state: &AppState,
    user: &AuthUser,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    validate_rating(payload.rating)?;
    require_non_empty("comment", &payload.comment)?;

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

    let review = ActiveModel {
        rating: Set(payload.rating),
        comment: Set(payload.comment),
        is_approved: Set(false),
        tour_id: Set(payload.tour_id),
        user_id: Set(user.user_id.clone()),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        state,
        &user.user_id,
        "review_create",
        "reviews",
        serde_json::json!({ "review_id": review.id, "tour_id": review.tour_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review submitted",
        Review::from(review),
        Some(Meta::empty()),
    ))
}

/// Authors may edit their review; any edit sends it back to moderation.
pub async fn update(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    let existing = Reviews::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if existing.user_id != user.user_id {
        return Err(AppError::Forbidden);
    }

    let mut active: ActiveModel = existing.into();
    if let Some(rating) = payload.rating {
        validate_rating(rating)?;
        active.rating = Set(rating);
    }
    if let Some(comment) = payload.comment {
        require_non_empty("comment", &comment)?;
        active.comment = Set(comment);
    }
    active.is_approved = Set(false);
    active.updated_at = Set(Utc::now().into());
    let review = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Updated",
        Review::from(review),
        Some(Meta::empty()),
    ))
}

pub async fn set_approval(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: ApproveReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    ensure_staff(user)?;
    let existing = Reviews::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    active.is_approved = Set(payload.is_approved);
    active.updated_at = Set(Utc::now().into());
    let review = active.update(&state.orm).await?;

    audit::record(
        state,
        &user.user_id,
        "review_moderate",
        "reviews",
        serde_json::json!({ "review_id": review.id, "is_approved": review.is_approved }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review moderated",
        Review::from(review),
        Some(Meta::empty()),
    ))
}

pub async fn delete(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = Reviews::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_owner_or_staff(user, &existing.user_id)?;

    Reviews::delete_by_id(id).exec(&state.orm).await?;

    audit::record(
        state,
        &user.user_id,
        "review_delete",
        "reviews",
        serde_json::json!({ "review_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
