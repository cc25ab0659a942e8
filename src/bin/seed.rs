use rust_decimal::Decimal;
use tour_booking_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::{auth::RegisterRequest, destinations::CreateDestinationRequest, tours::CreateTourRequest},
    entity::sea_orm_active_enums::Role,
    middleware::auth::AuthUser,
    services::{auth_service, destination_service, tour_service, user_service},
    state::AppState,
};

struct SeedTour {
    title: &'static str,
    slug: &'static str,
    price_cents: i64,
    duration: &'static str,
    group_size: i32,
    seats: i32,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tour_booking_api=debug".into()),
        )
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url, config.max_connections).await?;
    let orm = create_orm_conn(&config.database_url, config.max_connections).await?;
    run_migrations(&orm).await?;
    let state = AppState { pool, orm };

    let admin_id = ensure_user(&state, "admin@example.com", "admin12345", Role::Admin).await?;
    let user_id = ensure_user(&state, "user@example.com", "user12345", Role::User).await?;

    let admin = AuthUser {
        user_id: admin_id.clone(),
        role: Role::Admin,
    };
    seed_catalogue(&state, &admin).await?;

    tracing::info!(%admin_id, %user_id, "seed completed");
    Ok(())
}

async fn ensure_user(
    state: &AppState,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<String> {
    if let Some(existing) = user_service::find_by_email(state, email).await? {
        tracing::info!(%email, "user already present");
        return Ok(existing.id);
    }

    let user = auth_service::create_user(
        state,
        RegisterRequest {
            email: email.to_string(),
            password: password.to_string(),
            name: None,
            phone: None,
        },
        role,
    )
    .await?;
    tracing::info!(%email, ?role, "user created");
    Ok(user.id)
}

async fn seed_catalogue(state: &AppState, admin: &AuthUser) -> anyhow::Result<()> {
    let catalogue = [
        (
            ("Bali", "bali", "Volcanoes, rice terraces and temples."),
            vec![
                SeedTour {
                    title: "Mount Batur Sunrise Trek",
                    slug: "mount-batur-sunrise-trek",
                    price_cents: 6500,
                    duration: "1 day",
                    group_size: 12,
                    seats: 24,
                },
                SeedTour {
                    title: "Ubud Rice Terraces",
                    slug: "ubud-rice-terraces",
                    price_cents: 4900,
                    duration: "1 day",
                    group_size: 10,
                    seats: 20,
                },
            ],
        ),
        (
            ("Iceland", "iceland", "Glaciers, geysers and the northern lights."),
            vec![SeedTour {
                title: "Golden Circle and Northern Lights",
                slug: "golden-circle-northern-lights",
                price_cents: 129900,
                duration: "5 days",
                group_size: 16,
                seats: 16,
            }],
        ),
    ];

    for ((name, slug, description), tours) in catalogue {
        let destination = destination_service::upsert_by_slug(
            state,
            admin,
            CreateDestinationRequest {
                name: name.to_string(),
                slug: slug.to_string(),
                description: description.to_string(),
                image_url: format!("https://images.example.com/destinations/{slug}.jpg"),
            },
        )
        .await?
        .into_data()
        .ok_or_else(|| anyhow::anyhow!("destination {slug} missing after upsert"))?;

        for tour in tours {
            tour_service::upsert_by_slug(state, admin, tour_request(&tour, destination.id)).await?;
        }
        tracing::info!(destination = %slug, "seeded destination");
    }

    Ok(())
}

fn tour_request(tour: &SeedTour, destination_id: i32) -> CreateTourRequest {
    CreateTourRequest {
        title: tour.title.to_string(),
        slug: tour.slug.to_string(),
        price: Decimal::new(tour.price_cents, 2),
        currency: "USD".to_string(),
        image_url: format!("https://images.example.com/tours/{}.jpg", tour.slug),
        short_description: format!("{} with a local guide.", tour.title),
        full_description: format!("{} with a local guide, transfers included.", tour.title),
        exclusions: "Flights".to_string(),
        inclusions: "Guide, transfers".to_string(),
        itinerary: String::new(),
        image_urls: Vec::new(),
        duration: tour.duration.to_string(),
        group_size: tour.group_size,
        available_seats: tour.seats,
        next_tour_date: None,
        destination_id,
    }
}
