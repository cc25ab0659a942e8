use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};

use crate::{
    dto::{
        reviews::ReviewList,
        tours::{CreateTourRequest, RatingSummary, TourDetail, TourList, UpdateTourRequest},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Tour,
    response::{ApiResponse, Meta},
    routes::params::{Pagination, TourQuery},
    services::{review_service, tour_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tours).post(create_tour))
        .route("/by-slug/{slug}", get(get_tour_by_slug))
        .route("/upsert", put(upsert_tour))
        .route(
            "/{id}",
            get(get_tour).put(update_tour).delete(delete_tour),
        )
        .route("/{id}/reviews", get(list_tour_reviews))
        .route("/{id}/rating", get(get_tour_rating))
}

#[utoipa::path(
    get,
    path = "/api/tours",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search title and short description"),
        ("destination_id" = Option<i32>, Query, description = "Filter by destination"),
        ("min_price" = Option<String>, Query, description = "Minimum price"),
        ("max_price" = Option<String>, Query, description = "Maximum price"),
        ("available_only" = Option<bool>, Query, description = "Only tours with free seats"),
        ("sort_by" = Option<String>, Query, description = "created_at, price, title, next_tour_date"),
        ("sort_order" = Option<String>, Query, description = "asc or desc")
    ),
    responses(
        (status = 200, description = "List tours", body = ApiResponse<TourList>)
    ),
    tag = "Tours"
)]
pub async fn list_tours(
    State(state): State<AppState>,
    Query(query): Query<TourQuery>,
) -> AppResult<Json<ApiResponse<TourList>>> {
    let resp = tour_service::find_many(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/tours/{id}",
    params(("id" = i32, Path, description = "Tour ID")),
    responses(
        (status = 200, description = "Tour with destination and reviews", body = ApiResponse<TourDetail>),
        (status = 404, description = "Tour not found")
    ),
    tag = "Tours"
)]
pub async fn get_tour(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<TourDetail>>> {
    let resp = tour_service::find_detail(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/tours/by-slug/{slug}",
    params(("slug" = String, Path, description = "Tour slug")),
    responses(
        (status = 200, description = "Get tour", body = ApiResponse<Tour>),
        (status = 404, description = "Tour not found")
    ),
    tag = "Tours"
)]
pub async fn get_tour_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<Tour>>> {
    let tour = tour_service::find_by_slug(&state, &slug)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(ApiResponse::success("Tour", tour, None)))
}

#[utoipa::path(
    get,
    path = "/api/tours/{id}/reviews",
    params(
        ("id" = i32, Path, description = "Tour ID"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Approved reviews", body = ApiResponse<ReviewList>),
        (status = 404, description = "Tour not found")
    ),
    tag = "Tours"
)]
pub async fn list_tour_reviews(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    tour_service::find_unique_or_throw(&state, id).await?;
    let resp = review_service::list_for_tour(&state, id, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/tours/{id}/rating",
    params(("id" = i32, Path, description = "Tour ID")),
    responses(
        (status = 200, description = "Rating aggregate", body = ApiResponse<RatingSummary>),
        (status = 404, description = "Tour not found")
    ),
    tag = "Tours"
)]
pub async fn get_tour_rating(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<RatingSummary>>> {
    tour_service::find_unique_or_throw(&state, id).await?;
    let summary = review_service::aggregate_for_tour(&state, id).await?;
    Ok(Json(ApiResponse::success("Rating", summary, Some(Meta::empty()))))
}

#[utoipa::path(
    post,
    path = "/api/tours",
    request_body = CreateTourRequest,
    responses(
        (status = 201, description = "Create tour", body = ApiResponse<Tour>),
        (status = 409, description = "Slug taken or destination missing"),
        (status = 422, description = "Invalid input")
    ),
    security(("bearer_auth" = [])),
    tag = "Tours"
)]
pub async fn create_tour(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTourRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Tour>>)> {
    let resp = tour_service::create(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/tours/upsert",
    request_body = CreateTourRequest,
    responses(
        (status = 200, description = "Create or replace tour by slug", body = ApiResponse<Tour>),
        (status = 409, description = "Destination missing"),
        (status = 422, description = "Invalid input")
    ),
    security(("bearer_auth" = [])),
    tag = "Tours"
)]
pub async fn upsert_tour(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTourRequest>,
) -> AppResult<Json<ApiResponse<Tour>>> {
    let resp = tour_service::upsert_by_slug(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/tours/{id}",
    params(("id" = i32, Path, description = "Tour ID")),
    request_body = UpdateTourRequest,
    responses(
        (status = 200, description = "Updated tour", body = ApiResponse<Tour>),
        (status = 404, description = "Tour not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tours"
)]
pub async fn update_tour(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateTourRequest>,
) -> AppResult<Json<ApiResponse<Tour>>> {
    let resp = tour_service::update(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/tours/{id}",
    params(("id" = i32, Path, description = "Tour ID")),
    responses(
        (status = 200, description = "Deleted tour"),
        (status = 404, description = "Tour not found"),
        (status = 409, description = "Tour has orders")
    ),
    security(("bearer_auth" = [])),
    tag = "Tours"
)]
pub async fn delete_tour(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = tour_service::delete(&state, &user, id).await?;
    Ok(Json(resp))
}
