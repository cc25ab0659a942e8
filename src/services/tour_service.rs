use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select, Set, TransactionTrait,
};

use crate::{
    audit,
    dto::tours::{CreateTourRequest, TourDetail, TourList, UpdateTourRequest},
    entity::{
        destinations::Entity as Destinations,
        orders::{Column as OrderCol, Entity as Orders},
        tours::{ActiveModel, Column, Entity as Tours, Model as TourModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_staff},
    models::{Destination, Tour},
    response::{ApiResponse, Meta},
    routes::params::{SortOrder, TourQuery, TourSortBy},
    services::review_service,
    state::AppState,
    validation::{require_non_empty, validate_currency, validate_min, validate_price, validate_slug},
};

const DETAIL_REVIEW_LIMIT: u64 = 10;

pub async fn find_unique(state: &AppState, id: i32) -> AppResult<Option<Tour>> {
    let tour = Tours::find_by_id(id).one(&state.orm).await?;
    Ok(tour.map(Tour::from))
}

pub async fn find_unique_or_throw(state: &AppState, id: i32) -> AppResult<Tour> {
    find_unique(state, id).await?.ok_or(AppError::NotFound)
}

pub async fn find_by_slug(state: &AppState, slug: &str) -> AppResult<Option<Tour>> {
    Ok(find_model_by_slug(state, slug).await?.map(Tour::from))
}

async fn find_model_by_slug(state: &AppState, slug: &str) -> AppResult<Option<TourModel>> {
    let tour = Tours::find()
        .filter(Column::Slug.eq(slug))
        .one(&state.orm)
        .await?;
    Ok(tour)
}

/// Tour with its destination, rating summary and latest approved reviews.
pub async fn find_detail(state: &AppState, id: i32) -> AppResult<ApiResponse<TourDetail>> {
    let (tour, destination) = Tours::find_by_id(id)
        .find_also_related(Destinations)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let rating = review_service::aggregate_for_tour(state, tour.id).await?;
    let reviews = review_service::approved_for_tour(state, tour.id, DETAIL_REVIEW_LIMIT).await?;

    Ok(ApiResponse::success(
        "Tour",
        TourDetail {
            tour: tour.into(),
            destination: destination.map(Destination::from),
            rating,
            reviews,
        },
        Some(Meta::empty()),
    ))
}

fn filter_condition(query: &TourQuery) -> Condition {
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Title).ilike(pattern.clone()))
                .add(Expr::col(Column::ShortDescription).ilike(pattern)),
        );
    }
    if let Some(destination_id) = query.destination_id {
        condition = condition.add(Column::DestinationId.eq(destination_id));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }
    if query.available_only.unwrap_or(false) {
        condition = condition.add(Column::AvailableSeats.gt(0));
    }
    condition
}

fn sorted(finder: Select<Tours>, query: &TourQuery) -> Select<Tours> {
    let sort_by = query.sort_by.unwrap_or(TourSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        TourSortBy::CreatedAt => Column::CreatedAt,
        TourSortBy::Price => Column::Price,
        TourSortBy::Title => Column::Title,
        TourSortBy::NextTourDate => Column::NextTourDate,
    };
    let finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };
    // Stable paging when the sort column ties.
    finder.order_by_asc(Column::Id)
}

pub async fn count(state: &AppState, query: &TourQuery) -> AppResult<u64> {
    let total = Tours::find()
        .filter(filter_condition(query))
        .count(&state.orm)
        .await?;
    Ok(total)
}

pub async fn find_many(state: &AppState, query: TourQuery) -> AppResult<ApiResponse<TourList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let finder = sorted(Tours::find().filter(filter_condition(&query)), &query);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Tour::from)
        .collect();

    Ok(ApiResponse::success(
        "Tours",
        TourList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

fn validate_create(payload: &CreateTourRequest) -> AppResult<()> {
    require_non_empty("title", &payload.title)?;
    validate_slug(&payload.slug)?;
    validate_price(payload.price)?;
    validate_currency(&payload.currency)?;
    require_non_empty("duration", &payload.duration)?;
    validate_min("group_size", payload.group_size, 1)?;
    validate_min("available_seats", payload.available_seats, 0)?;
    Ok(())
}

async fn ensure_destination_exists(state: &AppState, destination_id: i32) -> AppResult<()> {
    let exists = Destinations::find_by_id(destination_id)
        .one(&state.orm)
        .await?
        .is_some();
    if !exists {
        return Err(AppError::Conflict(format!(
            "destination {destination_id} does not exist"
        )));
    }
    Ok(())
}

fn new_active(payload: CreateTourRequest) -> ActiveModel {
    ActiveModel {
        title: Set(payload.title),
        slug: Set(payload.slug),
        price: Set(payload.price),
        currency: Set(payload.currency),
        image_url: Set(payload.image_url),
        short_description: Set(payload.short_description),
        full_description: Set(payload.full_description),
        exclusions: Set(payload.exclusions),
        inclusions: Set(payload.inclusions),
        itinerary: Set(payload.itinerary),
        image_urls: Set(payload.image_urls),
        duration: Set(payload.duration),
        group_size: Set(payload.group_size),
        available_seats: Set(payload.available_seats),
        next_tour_date: Set(payload.next_tour_date.map(Into::into)),
        destination_id: Set(payload.destination_id),
        ..Default::default()
    }
}

pub async fn create(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTourRequest,
) -> AppResult<ApiResponse<Tour>> {
    ensure_staff(user)?;
    validate_create(&payload)?;
    ensure_destination_exists(state, payload.destination_id).await?;

    if find_model_by_slug(state, &payload.slug).await?.is_some() {
        return Err(AppError::Conflict(format!(
            "tour slug '{}' is already taken",
            payload.slug
        )));
    }

    let tour = new_active(payload).insert(&state.orm).await?;

    audit::record(
        state,
        &user.user_id,
        "tour_create",
        "tours",
        serde_json::json!({ "tour_id": tour.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Tour created",
        Tour::from(tour),
        Some(Meta::empty()),
    ))
}

async fn apply_update(
    state: &AppState,
    active: &mut ActiveModel,
    payload: UpdateTourRequest,
) -> AppResult<()> {
    if let Some(title) = payload.title {
        require_non_empty("title", &title)?;
        active.title = Set(title);
    }
    if let Some(slug) = payload.slug {
        validate_slug(&slug)?;
        active.slug = Set(slug);
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
        active.price = Set(price);
    }
    if let Some(currency) = payload.currency {
        validate_currency(&currency)?;
        active.currency = Set(currency);
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(image_url);
    }
    if let Some(short_description) = payload.short_description {
        active.short_description = Set(short_description);
    }
    if let Some(full_description) = payload.full_description {
        active.full_description = Set(full_description);
    }
    if let Some(exclusions) = payload.exclusions {
        active.exclusions = Set(exclusions);
    }
    if let Some(inclusions) = payload.inclusions {
        active.inclusions = Set(inclusions);
    }
    if let Some(itinerary) = payload.itinerary {
        active.itinerary = Set(itinerary);
    }
    if let Some(image_urls) = payload.image_urls {
        active.image_urls = Set(image_urls);
    }
    if let Some(duration) = payload.duration {
        require_non_empty("duration", &duration)?;
        active.duration = Set(duration);
    }
    if let Some(group_size) = payload.group_size {
        validate_min("group_size", group_size, 1)?;
        active.group_size = Set(group_size);
    }
    if let Some(available_seats) = payload.available_seats {
        validate_min("available_seats", available_seats, 0)?;
        active.available_seats = Set(available_seats);
    }
    match payload.next_tour_date {
        Some(next_tour_date) => active.next_tour_date = Set(Some(next_tour_date.into())),
        None if payload.clear_next_tour_date => active.next_tour_date = Set(None),
        None => {}
    }
    if let Some(destination_id) = payload.destination_id {
        ensure_destination_exists(state, destination_id).await?;
        active.destination_id = Set(destination_id);
    }
    active.updated_at = Set(Utc::now().into());
    Ok(())
}

pub async fn update(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateTourRequest,
) -> AppResult<ApiResponse<Tour>> {
    ensure_staff(user)?;
    let existing = Tours::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let mut active: ActiveModel = existing.into();
    apply_update(state, &mut active, payload).await?;
    let tour = active.update(&state.orm).await?;

    audit::record(
        state,
        &user.user_id,
        "tour_update",
        "tours",
        serde_json::json!({ "tour_id": tour.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        Tour::from(tour),
        Some(Meta::empty()),
    ))
}

/// Creates the tour when the slug is unknown, otherwise replaces every field.
pub async fn upsert_by_slug(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTourRequest,
) -> AppResult<ApiResponse<Tour>> {
    ensure_staff(user)?;
    validate_create(&payload)?;
    ensure_destination_exists(state, payload.destination_id).await?;

    let tour = match find_model_by_slug(state, &payload.slug).await? {
        Some(existing) => {
            let mut active = new_active(payload);
            active.id = Set(existing.id);
            active.created_at = Set(existing.created_at);
            active.updated_at = Set(Utc::now().into());
            active.update(&state.orm).await?
        }
        None => new_active(payload).insert(&state.orm).await?,
    };

    Ok(ApiResponse::success(
        "Tour saved",
        Tour::from(tour),
        Some(Meta::empty()),
    ))
}

/// Reviews and favorites cascade in the database; orders block the delete.
pub async fn delete(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let txn = state.orm.begin().await?;

    let orders = Orders::find()
        .filter(OrderCol::TourId.eq(id))
        .count(&txn)
        .await?;
    if orders > 0 {
        txn.rollback().await?;
        return Err(AppError::Conflict(format!(
            "tour has {orders} order(s) and cannot be deleted"
        )));
    }

    let result = Tours::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        txn.rollback().await?;
        return Err(AppError::NotFound);
    }
    txn.commit().await?;

    audit::record(
        state,
        &user.user_id,
        "tour_delete",
        "tours",
        serde_json::json!({ "tour_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
