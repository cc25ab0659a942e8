use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Destination;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateDestinationRequest {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image_url: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateDestinationRequest {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct DestinationList {
    #[schema(value_type = Vec<Destination>)]
    pub items: Vec<Destination>,
}
