#![allow(dead_code)]

use rust_decimal::Decimal;
use tour_booking_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{auth::RegisterRequest, destinations::CreateDestinationRequest, tours::CreateTourRequest},
    entity::sea_orm_active_enums::Role,
    middleware::auth::AuthUser,
    models::{Destination, Tour},
    services::{auth_service, destination_service, tour_service},
    state::AppState,
};
use uuid::Uuid;

/// Connects to `TEST_DATABASE_URL` (or `DATABASE_URL`) and applies migrations.
/// Returns `None` when neither is set so the calling test can skip.
pub async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!("Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration tests.");
            return Ok(None);
        }
    };

    let pool = create_pool(&database_url, 5).await?;
    let orm = create_orm_conn(&database_url, 5).await?;
    run_migrations(&orm).await?;
    Ok(Some(AppState { pool, orm }))
}

/// Short random suffix so parallel tests never collide on unique columns.
pub fn unique() -> String {
    Uuid::new_v4().simple().to_string()[..12].to_string()
}

pub async fn create_user(state: &AppState, role: Role) -> anyhow::Result<AuthUser> {
    let user = auth_service::create_user(
        state,
        RegisterRequest {
            email: format!("{}-{}@example.com", role_label(role), unique()),
            password: "correct-horse".into(),
            name: Some("Test Traveller".into()),
            phone: None,
        },
        role,
    )
    .await?;
    Ok(AuthUser {
        user_id: user.id,
        role,
    })
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::Admin => "admin",
        Role::Manager => "manager",
        Role::User => "user",
    }
}

pub async fn create_destination(state: &AppState, admin: &AuthUser) -> anyhow::Result<Destination> {
    let slug = format!("dest-{}", unique());
    let destination = destination_service::create(
        state,
        admin,
        CreateDestinationRequest {
            name: "Test Destination".into(),
            description: format!("Somewhere warm, {slug}"),
            slug,
            image_url: "https://images.example.com/dest.jpg".into(),
        },
    )
    .await?
    .into_data()
    .ok_or_else(|| anyhow::anyhow!("destination missing from response"))?;
    Ok(destination)
}

pub fn tour_request(destination_id: i32, price: Decimal, seats: i32) -> CreateTourRequest {
    CreateTourRequest {
        title: "Test Tour".into(),
        slug: format!("tour-{}", unique()),
        price,
        currency: "EUR".into(),
        image_url: "https://images.example.com/tour.jpg".into(),
        short_description: "Short".into(),
        full_description: "Full".into(),
        exclusions: String::new(),
        inclusions: String::new(),
        itinerary: String::new(),
        image_urls: vec!["https://images.example.com/tour-1.jpg".into()],
        duration: "3 days".into(),
        group_size: 10,
        available_seats: seats,
        next_tour_date: None,
        destination_id,
    }
}

pub async fn create_tour(
    state: &AppState,
    admin: &AuthUser,
    destination_id: i32,
    price: Decimal,
    seats: i32,
) -> anyhow::Result<Tour> {
    let tour = tour_service::create(state, admin, tour_request(destination_id, price, seats))
        .await?
        .into_data()
        .ok_or_else(|| anyhow::anyhow!("tour missing from response"))?;
    Ok(tour)
}
