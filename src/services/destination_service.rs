use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};

use crate::{
    audit,
    dto::destinations::{CreateDestinationRequest, DestinationList, UpdateDestinationRequest},
    entity::{
        destinations::{ActiveModel, Column, Entity as Destinations, Model as DestinationModel},
        tours::{Column as TourCol, Entity as Tours},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_staff},
    models::Destination,
    response::{ApiResponse, Meta},
    routes::params::DestinationQuery,
    state::AppState,
    validation::{require_non_empty, validate_slug},
};

pub async fn find_unique(state: &AppState, id: i32) -> AppResult<Option<Destination>> {
    let destination = Destinations::find_by_id(id).one(&state.orm).await?;
    Ok(destination.map(Destination::from))
}

pub async fn find_unique_or_throw(state: &AppState, id: i32) -> AppResult<Destination> {
    find_unique(state, id).await?.ok_or(AppError::NotFound)
}

pub async fn find_by_slug(state: &AppState, slug: &str) -> AppResult<Option<Destination>> {
    let destination = find_model_by_slug(state, slug).await?;
    Ok(destination.map(Destination::from))
}

async fn find_model_by_slug(state: &AppState, slug: &str) -> AppResult<Option<DestinationModel>> {
    let destination = Destinations::find()
        .filter(Column::Slug.eq(slug))
        .one(&state.orm)
        .await?;
    Ok(destination)
}

fn filter_condition(query: &DestinationQuery) -> Condition {
    let mut condition = Condition::all();
    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }
    condition
}

pub async fn count(state: &AppState, query: &DestinationQuery) -> AppResult<u64> {
    let total = Destinations::find()
        .filter(filter_condition(query))
        .count(&state.orm)
        .await?;
    Ok(total)
}

pub async fn find_many(
    state: &AppState,
    query: DestinationQuery,
) -> AppResult<ApiResponse<DestinationList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let finder = Destinations::find()
        .filter(filter_condition(&query))
        .order_by_asc(Column::Name);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Destination::from)
        .collect();

    Ok(ApiResponse::success(
        "Destinations",
        DestinationList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

fn validate_create(payload: &CreateDestinationRequest) -> AppResult<()> {
    require_non_empty("name", &payload.name)?;
    validate_slug(&payload.slug)?;
    require_non_empty("description", &payload.description)?;
    require_non_empty("image_url", &payload.image_url)?;
    Ok(())
}

pub async fn create(
    state: &AppState,
    user: &AuthUser,
    payload: CreateDestinationRequest,
) -> AppResult<ApiResponse<Destination>> {
    ensure_staff(user)?;
    validate_create(&payload)?;

    if find_model_by_slug(state, &payload.slug).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "destination slug '{}' is already taken",
            payload.slug
        )));
    }

    let destination = ActiveModel {
        name: Set(payload.name),
        slug: Set(payload.slug),
        description: Set(payload.description),
        image_url: Set(payload.image_url),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        state,
        &user.user_id,
        "destination_create",
        "destinations",
        serde_json::json!({ "destination_id": destination.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Destination created",
        Destination::from(destination),
        Some(Meta::empty()),
    ))
}

fn apply_update(active: &mut ActiveModel, payload: UpdateDestinationRequest) -> AppResult<()> {
    if let Some(name) = payload.name {
        require_non_empty("name", &name)?;
        active.name = Set(name);
    }
    if let Some(slug) = payload.slug {
        validate_slug(&slug)?;
        active.slug = Set(slug);
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(image_url);
    }
    active.updated_at = Set(Utc::now().into());
    Ok(())
}

pub async fn update(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateDestinationRequest,
) -> AppResult<ApiResponse<Destination>> {
    ensure_staff(user)?;
    let existing = Destinations::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    apply_update(&mut active, payload)?;
    let destination = active.update(&state.orm).await?;

    audit::record(
        state,
        &user.user_id,
        "destination_update",
        "destinations",
        serde_json::json!({ "destination_id": destination.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Destination::from(destination),
        Some(Meta::empty()),
    ))
}

/// Creates the destination when the slug is unknown, otherwise overwrites its fields.
pub async fn upsert_by_slug(
    state: &AppState,
    user: &AuthUser,
    payload: CreateDestinationRequest,
) -> AppResult<ApiResponse<Destination>> {
    ensure_staff(user)?;
    validate_create(&payload)?;

    let destination = match find_model_by_slug(state, &payload.slug).await? {
        Some(existing) => {
            let mut active: ActiveModel = existing.into();
            active.name = Set(payload.name);
            active.description = Set(payload.description);
            active.image_url = Set(payload.image_url);
            active.updated_at = Set(Utc::now().into());
            active.update(&state.orm).await?
        }
        None => {
            ActiveModel {
                name: Set(payload.name),
                slug: Set(payload.slug),
                description: Set(payload.description),
                image_url: Set(payload.image_url),
                ..Default::default()
            }
            .insert(&state.orm)
            .await?
        }
    };

    Ok(ApiResponse::success(
        "Destination saved",
        Destination::from(destination),
        Some(Meta::empty()),
    ))
}

/// Destinations that still own tours are kept.
pub async fn delete(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let tours = Tours::find()
        .filter(TourCol::DestinationId.eq(id))
        .count(&txn)
        .await?;
    if tours > 0 {
        txn.rollback().await?;
        return Err(AppError::Conflict(format!(
            "destination has {tours} tour(s) and cannot be deleted"
        )));
    }

    let result = Destinations::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        txn.rollback().await?;
        return Err(AppError::NotFound);
    }
    txn.commit().await?;

    audit::record(
        state,
        &user.user_id,
        "destination_delete",
        "destinations",
        serde_json::json!({ "destination_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
