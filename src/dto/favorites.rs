use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Tour;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct AddFavoriteRequest {
    pub tour_id: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct FavoriteTourList {
    #[schema(value_type = Vec<Tour>)]
    pub items: Vec<Tour>,
}
