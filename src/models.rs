use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entity::{
    destinations, favorites, orders, reviews,
    sea_orm_active_enums::{OrderStatus, Role, TicketStatus},
    ticket_responses, tickets, tours, users,
};

/// Public view of a user; the password hash never leaves the service layer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub email_verified: Option<DateTime<Utc>>,
    pub image: Option<String>,
    pub role: Role,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Destination {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Tour {
    pub id: i32,
    pub title: String,
    pub slug: String,
    #[schema(value_type = String, example = "199.00")]
    pub price: Decimal,
    pub currency: String,
    pub image_url: String,
    pub short_description: String,
    pub full_description: String,
    pub exclusions: String,
    pub inclusions: String,
    pub itinerary: String,
    pub image_urls: Vec<String>,
    pub duration: String,
    pub group_size: i32,
    pub available_seats: i32,
    pub next_tour_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub destination_id: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: i32,
    pub rating: i32,
    pub comment: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub tour_id: i32,
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Favorite {
    pub id: i32,
    pub user_id: String,
    pub tour_id: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: i32,
    pub user_id: String,
    pub tour_id: i32,
    pub quantity: i32,
    #[schema(value_type = String, example = "398.00")]
    pub total_price: Decimal,
    pub status: OrderStatus,
    pub contact_phone: Option<String>,
    pub contact_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Ticket {
    pub id: i32,
    pub user_id: String,
    pub subject: String,
    pub message: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketResponse {
    pub id: i32,
    pub ticket_id: i32,
    pub message: String,
    pub is_from_staff: bool,
    pub created_at: DateTime<Utc>,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            email_verified: model.email_verified.map(|dt| dt.with_timezone(&Utc)),
            image: model.image,
            role: model.role,
            phone: model.phone,
            address: model.address,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<destinations::Model> for Destination {
    fn from(model: destinations::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            slug: model.slug,
            description: model.description,
            image_url: model.image_url,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<tours::Model> for Tour {
    fn from(model: tours::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            slug: model.slug,
            price: model.price,
            currency: model.currency,
            image_url: model.image_url,
            short_description: model.short_description,
            full_description: model.full_description,
            exclusions: model.exclusions,
            inclusions: model.inclusions,
            itinerary: model.itinerary,
            image_urls: model.image_urls,
            duration: model.duration,
            group_size: model.group_size,
            available_seats: model.available_seats,
            next_tour_date: model.next_tour_date.map(|dt| dt.with_timezone(&Utc)),
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            destination_id: model.destination_id,
        }
    }
}

impl From<reviews::Model> for Review {
    fn from(model: reviews::Model) -> Self {
        Self {
            id: model.id,
            rating: model.rating,
            comment: model.comment,
            is_approved: model.is_approved,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
            tour_id: model.tour_id,
            user_id: model.user_id,
        }
    }
}

impl From<favorites::Model> for Favorite {
    fn from(model: favorites::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            tour_id: model.tour_id,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

impl From<orders::Model> for Order {
    fn from(model: orders::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            tour_id: model.tour_id,
            quantity: model.quantity,
            total_price: model.total_price,
            status: model.status,
            contact_phone: model.contact_phone,
            contact_email: model.contact_email,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<tickets::Model> for Ticket {
    fn from(model: tickets::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            subject: model.subject,
            message: model.message,
            status: model.status,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

impl From<ticket_responses::Model> for TicketResponse {
    fn from(model: ticket_responses::Model) -> Self {
        Self {
            id: model.id,
            ticket_id: model.ticket_id,
            message: model.message,
            is_from_staff: model.is_from_staff,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
