use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    entity::sea_orm_active_enums::OrderStatus,
    models::{Order, Tour},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub tour_id: i32,
    pub quantity: i32,
    pub contact_phone: Option<String>,
    /// Defaults to the account email.
    pub contact_email: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithTour {
    pub order: Order,
    pub tour: Option<Tour>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<Order>)]
    pub items: Vec<Order>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderStatusGroup {
    pub status: OrderStatus,
    pub count: i64,
    pub quantity: i64,
    #[schema(value_type = String)]
    pub revenue: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OrderAggregate {
    pub count: i64,
    pub quantity: i64,
    #[schema(value_type = String)]
    pub revenue: Decimal,
}
