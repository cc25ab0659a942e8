use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    entity::sea_orm_active_enums::TicketStatus,
    models::{Ticket, TicketResponse},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateTicketRequest {
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateTicketStatusRequest {
    pub status: TicketStatus,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AddTicketResponseRequest {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TicketWithResponses {
    pub ticket: Ticket,
    pub responses: Vec<TicketResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct TicketList {
    #[schema(value_type = Vec<Ticket>)]
    pub items: Vec<Ticket>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TicketStatusGroup {
    pub status: TicketStatus,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_update_rejects_values_outside_the_enum() {
        let parsed: Result<UpdateTicketStatusRequest, _> =
            serde_json::from_str(r#"{ "status": "ARCHIVED" }"#);
        assert!(parsed.is_err());

        let parsed: Result<UpdateTicketStatusRequest, _> =
            serde_json::from_str(r#"{ "status": "open" }"#);
        assert!(parsed.is_err(), "status values are case sensitive");

        let parsed: UpdateTicketStatusRequest =
            serde_json::from_str(r#"{ "status": "RESOLVED" }"#).unwrap();
        assert_eq!(parsed.status, TicketStatus::Resolved);
    }
}
