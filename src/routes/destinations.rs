use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
};

use crate::{
    dto::{
        destinations::{CreateDestinationRequest, DestinationList, UpdateDestinationRequest},
        tours::TourList,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Destination,
    response::ApiResponse,
    routes::params::{DestinationQuery, TourQuery},
    services::{destination_service, tour_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_destinations).post(create_destination))
        .route("/by-slug/{slug}", get(get_destination_by_slug))
        .route("/upsert", put(upsert_destination))
        .route(
            "/{id}",
            get(get_destination)
                .put(update_destination)
                .delete(delete_destination),
        )
        .route("/{id}/tours", get(list_destination_tours))
}

#[utoipa::path(
    get,
    path = "/api/destinations",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search name and description")
    ),
    responses(
        (status = 200, description = "List destinations", body = ApiResponse<DestinationList>)
    ),
    tag = "Destinations"
)]
pub async fn list_destinations(
    State(state): State<AppState>,
    Query(query): Query<DestinationQuery>,
) -> AppResult<Json<ApiResponse<DestinationList>>> {
    let resp = destination_service::find_many(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/destinations/{id}",
    params(("id" = i32, Path, description = "Destination ID")),
    responses(
        (status = 200, description = "Get destination", body = ApiResponse<Destination>),
        (status = 404, description = "Destination not found")
    ),
    tag = "Destinations"
)]
pub async fn get_destination(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<Destination>>> {
    let destination = destination_service::find_unique_or_throw(&state, id).await?;
    Ok(Json(ApiResponse::success("Destination", destination, None)))
}

#[utoipa::path(
    get,
    path = "/api/destinations/by-slug/{slug}",
    params(("slug" = String, Path, description = "Destination slug")),
    responses(
        (status = 200, description = "Get destination", body = ApiResponse<Destination>),
        (status = 404, description = "Destination not found")
    ),
    tag = "Destinations"
)]
pub async fn get_destination_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> AppResult<Json<ApiResponse<Destination>>> {
    let destination = destination_service::find_by_slug(&state, &slug)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(ApiResponse::success("Destination", destination, None)))
}

#[utoipa::path(
    get,
    path = "/api/destinations/{id}/tours",
    params(
        ("id" = i32, Path, description = "Destination ID"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "Tours of a destination", body = ApiResponse<TourList>),
        (status = 404, description = "Destination not found")
    ),
    tag = "Destinations"
)]
pub async fn list_destination_tours(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(mut query): Query<TourQuery>,
) -> AppResult<Json<ApiResponse<TourList>>> {
    destination_service::find_unique_or_throw(&state, id).await?;
    query.destination_id = Some(id);
    let resp = tour_service::find_many(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/destinations",
    request_body = CreateDestinationRequest,
    responses(
        (status = 201, description = "Create destination", body = ApiResponse<Destination>),
        (status = 409, description = "Slug already taken"),
        (status = 422, description = "Invalid input")
    ),
    security(("bearer_auth" = [])),
    tag = "Destinations"
)]
pub async fn create_destination(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateDestinationRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Destination>>)> {
    let resp = destination_service::create(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/destinations/upsert",
    request_body = CreateDestinationRequest,
    responses(
        (status = 200, description = "Create or update destination by slug", body = ApiResponse<Destination>),
        (status = 422, description = "Invalid input")
    ),
    security(("bearer_auth" = [])),
    tag = "Destinations"
)]
pub async fn upsert_destination(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateDestinationRequest>,
) -> AppResult<Json<ApiResponse<Destination>>> {
    let resp = destination_service::upsert_by_slug(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/destinations/{id}",
    params(("id" = i32, Path, description = "Destination ID")),
    request_body = UpdateDestinationRequest,
    responses(
        (status = 200, description = "Updated destination", body = ApiResponse<Destination>),
        (status = 404, description = "Destination not found"),
        (status = 409, description = "Slug already taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Destinations"
)]
pub async fn update_destination(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateDestinationRequest>,
) -> AppResult<Json<ApiResponse<Destination>>> {
    let resp = destination_service::update(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/destinations/{id}",
    params(("id" = i32, Path, description = "Destination ID")),
    responses(
        (status = 200, description = "Deleted destination"),
        (status = 404, description = "Destination not found"),
        (status = 409, description = "Destination still has tours")
    ),
    security(("bearer_auth" = [])),
    tag = "Destinations"
)]
pub async fn delete_destination(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = destination_service::delete(&state, &user, id).await?;
    Ok(Json(resp))
}

