use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::tickets::{AddTicketResponseRequest, CreateTicketRequest, TicketList, TicketWithResponses},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Ticket, TicketResponse},
    response::ApiResponse,
    routes::params::TicketListQuery,
    services::ticket_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tickets).post(create_ticket))
        .route("/{id}", get(get_ticket))
        .route("/{id}/responses", post(add_response))
}

#[utoipa::path(
    get,
    path = "/api/tickets",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "OPEN, IN_PROGRESS, CLOSED, RESOLVED")
    ),
    responses(
        (status = 200, description = "Tickets of the current user", body = ApiResponse<TicketList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Tickets"
)]
pub async fn list_tickets(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TicketListQuery>,
) -> AppResult<Json<ApiResponse<TicketList>>> {
    let resp = ticket_service::list_tickets(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/tickets",
    request_body = CreateTicketRequest,
    responses(
        (status = 201, description = "Ticket opened", body = ApiResponse<Ticket>),
        (status = 422, description = "Subject or message missing")
    ),
    security(("bearer_auth" = [])),
    tag = "Tickets"
)]
pub async fn create_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateTicketRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Ticket>>)> {
    let resp = ticket_service::create_ticket(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/tickets/{id}",
    params(("id" = i32, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Ticket with responses", body = ApiResponse<TicketWithResponses>),
        (status = 404, description = "Ticket not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tickets"
)]
pub async fn get_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<TicketWithResponses>>> {
    let resp = ticket_service::get_ticket(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/tickets/{id}/responses",
    params(("id" = i32, Path, description = "Ticket ID")),
    request_body = AddTicketResponseRequest,
    responses(
        (status = 201, description = "Response added", body = ApiResponse<TicketResponse>),
        (status = 400, description = "Ticket is closed"),
        (status = 404, description = "Ticket not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Tickets"
)]
pub async fn add_response(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<AddTicketResponseRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<TicketResponse>>)> {
    let resp = ticket_service::add_response(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
