pub mod audit_logs;
pub mod destinations;
pub mod favorites;
pub mod orders;
pub mod reviews;
pub mod sea_orm_active_enums;
pub mod ticket_responses;
pub mod tickets;
pub mod tours;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use destinations::Entity as Destinations;
pub use favorites::Entity as Favorites;
pub use orders::Entity as Orders;
pub use reviews::Entity as Reviews;
pub use ticket_responses::Entity as TicketResponses;
pub use tickets::Entity as Tickets;
pub use tours::Entity as Tours;
pub use users::Entity as Users;
