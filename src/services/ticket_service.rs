use chrono::Utc;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::{
    audit,
    dto::tickets::{
        AddTicketResponseRequest, CreateTicketRequest, TicketList, TicketStatusGroup,
        TicketWithResponses, UpdateTicketStatusRequest,
    },
    entity::{
        sea_orm_active_enums::TicketStatus,
        ticket_responses::{
            ActiveModel as ResponseActive, Column as ResponseCol, Entity as TicketResponses,
        },
        tickets::{ActiveModel, Column, Entity as Tickets, Model as TicketModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin, ensure_staff},
    models::{Ticket, TicketResponse},
    response::{ApiResponse, Meta},
    routes::params::{SortOrder, TicketListQuery},
    state::AppState,
    validation::require_non_empty,
};

pub async fn find_unique(state: &AppState, id: i32) -> AppResult<Option<Ticket>> {
    let ticket = Tickets::find_by_id(id).one(&state.orm).await?;
    Ok(ticket.map(Ticket::from))
}

pub async fn find_unique_or_throw(state: &AppState, id: i32) -> AppResult<Ticket> {
    find_unique(state, id).await?.ok_or(AppError::NotFound)
}

/// Loads a ticket visible to the caller. Other users' tickets read as missing.
async fn visible_ticket(state: &AppState, user: &AuthUser, id: i32) -> AppResult<TicketModel> {
    let ticket = Tickets::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if ticket.user_id != user.user_id && !user.is_staff() {
        return Err(AppError::NotFound);
    }
    Ok(ticket)
}

async fn lock_ticket(txn: &DatabaseTransaction, id: i32) -> AppResult<TicketModel> {
    Tickets::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)
}

fn filter_condition(query: &TicketListQuery, user_id: Option<&str>) -> Condition {
    let mut condition = Condition::all();
    if let Some(user_id) = user_id {
        condition = condition.add(Column::UserId.eq(user_id));
    }
    if let Some(status) = query.status {
        condition = condition.add(Column::Status.eq(status));
    }
    condition
}

pub async fn count(state: &AppState, query: &TicketListQuery) -> AppResult<u64> {
    let total = Tickets::find()
        .filter(filter_condition(query, None))
        .count(&state.orm)
        .await?;
    Ok(total)
}

async fn paged_tickets(
    state: &AppState,
    condition: Condition,
    query: &TicketListQuery,
) -> AppResult<ApiResponse<TicketList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut finder = Tickets::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(Column::UpdatedAt),
        SortOrder::Desc => finder.order_by_desc(Column::UpdatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Ticket::from)
        .collect();

    Ok(ApiResponse::success(
        "Tickets",
        TicketList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn list_tickets(
    state: &AppState,
    user: &AuthUser,
    query: TicketListQuery,
) -> AppResult<ApiResponse<TicketList>> {
    let condition = filter_condition(&query, Some(&user.user_id));
    paged_tickets(state, condition, &query).await
}

pub async fn list_all_tickets(
    state: &AppState,
    user: &AuthUser,
    query: TicketListQuery,
) -> AppResult<ApiResponse<TicketList>> {
    ensure_staff(user)?;
    let condition = filter_condition(&query, None);
    paged_tickets(state, condition, &query).await
}

pub async fn list_responses(state: &AppState, ticket_id: i32) -> AppResult<Vec<TicketResponse>> {
    let responses = TicketResponses::find()
        .filter(ResponseCol::TicketId.eq(ticket_id))
        .order_by_asc(ResponseCol::CreatedAt)
        .order_by_asc(ResponseCol::Id)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(TicketResponse::from)
        .collect();
    Ok(responses)
}

pub async fn get_ticket(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<TicketWithResponses>> {
    let ticket = visible_ticket(state, user, id).await?;
    let responses = list_responses(state, ticket.id).await?;
    Ok(ApiResponse::success(
        "OK",
        TicketWithResponses {
            ticket: ticket.into(),
            responses,
        },
        Some(Meta::empty()),
    ))
}

pub async fn create_ticket(
    state: &AppState,
    user: &AuthUser,
    payload: CreateTicketRequest,
) -> AppResult<ApiResponse<Ticket>> {
    require_non_empty("subject", &payload.subject)?;
    require_non_empty("message", &payload.message)?;

    let ticket = ActiveModel {
        user_id: Set(user.user_id.clone()),
        subject: Set(payload.subject),
        message: Set(payload.message),
        status: Set(TicketStatus::Open),
        ..Default::default()
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        state,
        &user.user_id,
        "ticket_create",
        "tickets",
        serde_json::json!({ "ticket_id": ticket.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Ticket opened",
        Ticket::from(ticket),
        Some(Meta::empty()),
    ))
}

pub async fn update_ticket_status(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateTicketStatusRequest,
) -> AppResult<ApiResponse<Ticket>> {
    ensure_staff(user)?;
    let txn = state.orm.begin().await?;
    let existing = lock_ticket(&txn, id).await?;

    let mut active: ActiveModel = existing.into();
    active.status = Set(payload.status);
    active.updated_at = Set(Utc::now().into());
    let ticket = active.update(&txn).await?;
    txn.commit().await?;

    audit::record(
        state,
        &user.user_id,
        "ticket_status_update",
        "tickets",
        serde_json::json!({ "ticket_id": ticket.id, "status": ticket.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Ticket updated",
        Ticket::from(ticket),
        Some(Meta::empty()),
    ))
}

/// Status a ticket moves to after a reply, if any.
pub fn status_after_response(current: TicketStatus, from_staff: bool) -> Option<TicketStatus> {
    match current {
        TicketStatus::Open if from_staff => Some(TicketStatus::InProgress),
        // A customer writing back reopens a resolved ticket.
        TicketStatus::Resolved if !from_staff => Some(TicketStatus::Open),
        _ => None,
    }
}

pub async fn add_response(
    state: &AppState,
    user: &AuthUser,
    ticket_id: i32,
    payload: AddTicketResponseRequest,
) -> AppResult<ApiResponse<TicketResponse>> {
    require_non_empty("message", &payload.message)?;

    // Status is checked and written under the row lock.
    let txn = state.orm.begin().await?;
    let ticket = lock_ticket(&txn, ticket_id).await?;
    if ticket.user_id != user.user_id && !user.is_staff() {
        return Err(AppError::NotFound);
    }
    if ticket.status == TicketStatus::Closed {
        return Err(AppError::BadRequest("Ticket is closed".into()));
    }

    let from_staff = user.is_staff();
    let next_status = status_after_response(ticket.status, from_staff);

    let response = ResponseActive {
        ticket_id: Set(ticket.id),
        message: Set(payload.message),
        is_from_staff: Set(from_staff),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut active: ActiveModel = ticket.into();
    if let Some(status) = next_status {
        active.status = Set(status);
    }
    active.updated_at = Set(Utc::now().into());
    active.update(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::success(
        "Response added",
        TicketResponse::from(response),
        Some(Meta::empty()),
    ))
}

/// Responses are removed with the ticket.
pub async fn delete_ticket(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Tickets::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        state,
        &user.user_id,
        "ticket_delete",
        "tickets",
        serde_json::json!({ "ticket_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

#[derive(Debug, FromQueryResult)]
struct StatusRow {
    status: TicketStatus,
    count: i64,
}

pub async fn group_by_status(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Vec<TicketStatusGroup>>> {
    ensure_staff(user)?;
    let groups: Vec<TicketStatusGroup> = Tickets::find()
        .select_only()
        .column(Column::Status)
        .column_as(Expr::col(Column::Id).count(), "count")
        .group_by(Column::Status)
        .order_by_asc(Column::Status)
        .into_model::<StatusRow>()
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|row| TicketStatusGroup {
            status: row.status,
            count: row.count,
        })
        .collect();

    let meta = Meta::total(groups.len());
    Ok(ApiResponse::success("Ticket stats", groups, Some(meta)))
}
