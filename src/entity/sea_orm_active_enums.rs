use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema, Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    #[default]
    #[sea_orm(string_value = "USER")]
    User,
    #[sea_orm(string_value = "MANAGER")]
    Manager,
}

impl Role {
    /// Admins and managers answer tickets and curate the catalogue.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema, Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "CONFIRMED")]
    Confirmed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
}

impl OrderStatus {
    /// Cancelled and completed orders never change again.
    pub fn is_final(self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Completed)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema, Default,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    #[default]
    #[sea_orm(string_value = "OPEN")]
    Open,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "CLOSED")]
    Closed,
    #[sea_orm(string_value = "RESOLVED")]
    Resolved,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_status_rejects_unknown_values() {
        let parsed: Result<TicketStatus, _> = serde_json::from_str("\"ESCALATED\"");
        assert!(parsed.is_err());

        let parsed: TicketStatus = serde_json::from_str("\"IN_PROGRESS\"").unwrap();
        assert_eq!(parsed, TicketStatus::InProgress);
    }

    #[test]
    fn enums_default_to_declared_values() {
        assert_eq!(Role::default(), Role::User);
        assert_eq!(OrderStatus::default(), OrderStatus::Pending);
        assert_eq!(TicketStatus::default(), TicketStatus::Open);
    }

    #[test]
    fn staff_roles() {
        assert!(Role::Admin.is_staff());
        assert!(Role::Manager.is_staff());
        assert!(!Role::User.is_staff());
    }

    #[test]
    fn active_enum_values_match_check_constraints() {
        assert_eq!(OrderStatus::Cancelled.to_value(), "CANCELLED");
        assert_eq!(TicketStatus::InProgress.to_value(), "IN_PROGRESS");
        assert_eq!(Role::Manager.to_value(), "MANAGER");
    }
}
