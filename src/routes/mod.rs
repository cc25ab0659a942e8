use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod auth;
pub mod destinations;
pub mod doc;
pub mod favorites;
pub mod health;
pub mod orders;
pub mod params;
pub mod reviews;
pub mod tickets;
pub mod tours;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/destinations", destinations::router())
        .nest("/tours", tours::router())
        .nest("/reviews", reviews::router())
        .nest("/favorites", favorites::router())
        .nest("/orders", orders::router())
        .nest("/tickets", tickets::router())
        .nest("/admin", admin::router())
}
