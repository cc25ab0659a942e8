use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Destination, Review, Tour};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTourRequest {
    pub title: String,
    pub slug: String,
    #[schema(value_type = String, example = "199.00")]
    pub price: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub image_url: String,
    pub short_description: String,
    pub full_description: String,
    #[serde(default)]
    pub exclusions: String,
    #[serde(default)]
    pub inclusions: String,
    #[serde(default)]
    pub itinerary: String,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub duration: String,
    pub group_size: i32,
    pub available_seats: i32,
    pub next_tour_date: Option<DateTime<Utc>>,
    pub destination_id: i32,
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTourRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    #[schema(value_type = Option<String>)]
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub image_url: Option<String>,
    pub short_description: Option<String>,
    pub full_description: Option<String>,
    pub exclusions: Option<String>,
    pub inclusions: Option<String>,
    pub itinerary: Option<String>,
    pub image_urls: Option<Vec<String>>,
    pub duration: Option<String>,
    pub group_size: Option<i32>,
    pub available_seats: Option<i32>,
    pub next_tour_date: Option<DateTime<Utc>>,
    /// Unsets `next_tour_date`. Ignored when a new date is given.
    #[serde(default)]
    pub clear_next_tour_date: bool,
    pub destination_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct TourList {
    #[schema(value_type = Vec<Tour>)]
    pub items: Vec<Tour>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TourDetail {
    pub tour: Tour,
    pub destination: Option<Destination>,
    pub rating: RatingSummary,
    pub reviews: Vec<Review>,
}

/// Aggregate over the approved reviews of one tour.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RatingSummary {
    pub count: i64,
    pub average: Option<f64>,
    pub min: Option<i32>,
    pub max: Option<i32>,
}
