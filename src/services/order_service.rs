use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseTransaction, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::{
    audit,
    dto::orders::{
        CreateOrderRequest, OrderAggregate, OrderList, OrderStatusGroup, OrderWithTour,
        UpdateOrderStatusRequest,
    },
    entity::{
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        sea_orm_active_enums::OrderStatus,
        tours::{ActiveModel as TourActive, Column as TourCol, Entity as Tours},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_staff},
    models::{Order, Tour},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
    validation::{fits_money_column, validate_email, validate_min},
};

pub async fn find_unique(state: &AppState, id: i32) -> AppResult<Option<Order>> {
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    Ok(order.map(Order::from))
}

pub async fn find_unique_or_throw(state: &AppState, id: i32) -> AppResult<Order> {
    find_unique(state, id).await?.ok_or(AppError::NotFound)
}

fn filter_condition(query: &OrderListQuery, user_id: Option<&str>) -> Condition {
    let mut condition = Condition::all();
    if let Some(user_id) = user_id {
        condition = condition.add(OrderCol::UserId.eq(user_id));
    }
    if let Some(status) = query.status {
        condition = condition.add(OrderCol::Status.eq(status));
    }
    if let Some(tour_id) = query.tour_id {
        condition = condition.add(OrderCol::TourId.eq(tour_id));
    }
    condition
}

pub async fn count(state: &AppState, query: &OrderListQuery) -> AppResult<u64> {
    let total = Orders::find()
        .filter(filter_condition(query, None))
        .count(&state.orm)
        .await?;
    Ok(total)
}

async fn paged_orders(
    state: &AppState,
    condition: Condition,
    query: &OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Order::from)
        .collect();

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Orders placed by the caller.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = filter_condition(&query, Some(&user.user_id));
    paged_orders(state, condition, &query).await
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_staff(user)?;
    let condition = filter_condition(&query, None);
    paged_orders(state, condition, &query).await
}

/// Owners see their own orders, staff see every order. Others get `NotFound`.
pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<OrderWithTour>> {
    let (order, tour) = Orders::find_by_id(id)
        .find_also_related(Tours)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.user_id != user.user_id && !user.is_staff() {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "OK",
        OrderWithTour {
            order: order.into(),
            tour: tour.map(Tour::from),
        },
        Some(Meta::empty()),
    ))
}

/// Books seats on a tour: prices the order and takes the seats in one transaction.
pub async fn create_order(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    validate_min("quantity", payload.quantity, 1)?;
    if let Some(email) = payload.contact_email.as_deref() {
        validate_email(email)?;
    }

    let txn = state.orm.begin().await?;

    let account = Users::find_by_id(user.user_id.clone())
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let tour = Tours::find_by_id(payload.tour_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let tour = match tour {
        Some(t) => t,
        None => {
            return Err(AppError::Conflict(format!(
                "tour {} does not exist",
                payload.tour_id
            )));
        }
    };

    if tour.available_seats < payload.quantity {
        return Err(AppError::BadRequest(format!(
            "Only {} seat(s) left on tour {}",
            tour.available_seats, tour.id
        )));
    }

    let total_price = tour
        .price
        .checked_mul(Decimal::from(payload.quantity))
        .filter(|total| fits_money_column(*total))
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Order total for {} seat(s) exceeds the allowed amount",
                payload.quantity
            ))
        })?;
    let remaining = tour.available_seats - payload.quantity;

    let order = OrderActive {
        user_id: Set(user.user_id.clone()),
        tour_id: Set(tour.id),
        quantity: Set(payload.quantity),
        total_price: Set(total_price),
        status: Set(OrderStatus::Pending),
        contact_phone: Set(payload.contact_phone),
        contact_email: Set(payload.contact_email.unwrap_or(account.email)),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let mut tour_active: TourActive = tour.into();
    tour_active.available_seats = Set(remaining);
    tour_active.updated_at = Set(Utc::now().into());
    tour_active.update(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        order_id = order.id,
        tour_id = order.tour_id,
        quantity = order.quantity,
        "order placed"
    );
    audit::record(
        state,
        &user.user_id,
        "order_create",
        "orders",
        serde_json::json!({ "order_id": order.id, "tour_id": order.tour_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

pub fn check_transition(from: OrderStatus, to: OrderStatus) -> AppResult<()> {
    if from.is_final() && from != to {
        return Err(AppError::BadRequest(format!(
            "Order is already {}",
            status_label(from)
        )));
    }
    Ok(())
}

fn status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "pending",
        OrderStatus::Confirmed => "confirmed",
        OrderStatus::Cancelled => "cancelled",
        OrderStatus::Completed => "completed",
    }
}

/// Applies a status change on a locked order row; cancelling hands the seats back.
async fn transition(
    txn: &DatabaseTransaction,
    order: OrderModel,
    status: OrderStatus,
) -> AppResult<OrderModel> {
    check_transition(order.status, status)?;

    if status == OrderStatus::Cancelled && order.status != OrderStatus::Cancelled {
        Tours::update_many()
            .col_expr(
                TourCol::AvailableSeats,
                Expr::col(TourCol::AvailableSeats).add(order.quantity),
            )
            .col_expr(TourCol::UpdatedAt, Expr::value(Utc::now()))
            .filter(TourCol::Id.eq(order.tour_id))
            .exec(txn)
            .await?;
    }

    let mut active: OrderActive = order.into();
    active.status = Set(status);
    active.updated_at = Set(Utc::now().into());
    Ok(active.update(txn).await?)
}

async fn lock_order(txn: &DatabaseTransaction, id: i32) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: i32,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    ensure_staff(user)?;
    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, id).await?;
    let order = transition(&txn, order, payload.status).await?;
    txn.commit().await?;

    audit::record(
        state,
        &user.user_id,
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order updated",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

/// Owners may cancel while the order is still pending.
pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: i32,
) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;
    let order = lock_order(&txn, id).await?;
    if order.user_id != user.user_id {
        return Err(AppError::NotFound);
    }
    if order.status != OrderStatus::Pending {
        return Err(AppError::BadRequest(
            "Only pending orders can be cancelled".into(),
        ));
    }
    let order = transition(&txn, order, OrderStatus::Cancelled).await?;
    txn.commit().await?;

    audit::record(
        state,
        &user.user_id,
        "order_cancel",
        "orders",
        serde_json::json!({ "order_id": order.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order cancelled",
        Order::from(order),
        Some(Meta::empty()),
    ))
}

#[derive(Debug, FromQueryResult)]
struct StatusRow {
    status: OrderStatus,
    count: i64,
    quantity: Option<i64>,
    revenue: Option<Decimal>,
}

/// Per-status count, seats and revenue.
pub async fn group_by_status(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<Vec<OrderStatusGroup>>> {
    ensure_staff(user)?;
    let rows = Orders::find()
        .select_only()
        .column(OrderCol::Status)
        .column_as(Expr::col(OrderCol::Id).count(), "count")
        .column_as(Expr::col(OrderCol::Quantity).sum(), "quantity")
        .column_as(Expr::col(OrderCol::TotalPrice).sum(), "revenue")
        .group_by(OrderCol::Status)
        .order_by_asc(OrderCol::Status)
        .into_model::<StatusRow>()
        .all(&state.orm)
        .await?;

    let groups: Vec<OrderStatusGroup> = rows
        .into_iter()
        .map(|row| OrderStatusGroup {
            status: row.status,
            count: row.count,
            quantity: row.quantity.unwrap_or(0),
            revenue: row.revenue.unwrap_or(Decimal::ZERO),
        })
        .collect();

    let meta = Meta::total(groups.len());
    Ok(ApiResponse::success("Order stats", groups, Some(meta)))
}

/// Totals over every order that was not cancelled, optionally for one tour.
pub async fn aggregate(state: &AppState, tour_id: Option<i32>) -> AppResult<OrderAggregate> {
    let (count, quantity, revenue): (i64, i64, Decimal) = sqlx::query_as(
        r#"
        SELECT COUNT(*), COALESCE(SUM(quantity), 0)::bigint, COALESCE(SUM(total_price), 0)
        FROM orders
        WHERE status <> 'CANCELLED' AND ($1::int IS NULL OR tour_id = $1)
        "#,
    )
    .bind(tour_id)
    .fetch_one(&state.pool)
    .await?;

    Ok(OrderAggregate {
        count,
        quantity,
        revenue,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_statuses_cannot_move() {
        assert!(check_transition(OrderStatus::Cancelled, OrderStatus::Confirmed).is_err());
        assert!(check_transition(OrderStatus::Completed, OrderStatus::Pending).is_err());
        assert!(check_transition(OrderStatus::Completed, OrderStatus::Completed).is_ok());
    }

    #[test]
    fn open_statuses_move_freely() {
        assert!(check_transition(OrderStatus::Pending, OrderStatus::Confirmed).is_ok());
        assert!(check_transition(OrderStatus::Confirmed, OrderStatus::Completed).is_ok());
        assert!(check_transition(OrderStatus::Pending, OrderStatus::Cancelled).is_ok());
    }
}
