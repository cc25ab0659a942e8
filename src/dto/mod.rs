pub mod auth;
pub mod destinations;
pub mod favorites;
pub mod orders;
pub mod reviews;
pub mod tickets;
pub mod tours;
pub mod users;
