pub mod auth_service;
pub mod destination_service;
pub mod favorite_service;
pub mod order_service;
pub mod review_service;
pub mod ticket_service;
pub mod tour_service;
pub mod user_service;
