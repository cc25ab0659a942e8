mod common;

use std::time::Duration;

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use tour_booking_api::{
    dto::{
        destinations::{CreateDestinationRequest, UpdateDestinationRequest},
        orders::CreateOrderRequest,
        reviews::CreateReviewRequest,
        tickets::CreateTicketRequest,
        tours::UpdateTourRequest,
    },
    entity::sea_orm_active_enums::{Role, TicketStatus},
    error::AppError,
    routes::params::{
        DestinationQuery, OrderListQuery, ReviewQuery, TicketListQuery, TourQuery, UserQuery,
    },
    services::{
        destination_service, order_service, review_service, ticket_service, tour_service,
        user_service,
    },
};

use common::{create_destination, create_tour, create_user, setup_state, tour_request, unique};

#[tokio::test]
async fn destination_upsert_creates_then_updates() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let manager = create_user(&state, Role::Manager).await?;
    let slug = format!("upsert-{}", unique());
    let request = CreateDestinationRequest {
        name: "Lisbon".into(),
        slug: slug.clone(),
        description: "Trams and tiles".into(),
        image_url: "https://images.example.com/lisbon.jpg".into(),
    };

    let created = destination_service::upsert_by_slug(&state, &manager, request.clone())
        .await?
        .into_data()
        .expect("destination");
    assert_eq!(created.name, "Lisbon");

    tokio::time::sleep(Duration::from_millis(20)).await;
    let updated = destination_service::upsert_by_slug(
        &state,
        &manager,
        CreateDestinationRequest {
            name: "Lisboa".into(),
            ..request
        },
    )
    .await?
    .into_data()
    .expect("destination");
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.name, "Lisboa");
    assert!(updated.updated_at > created.updated_at);

    let by_slug = destination_service::find_by_slug(&state, &slug)
        .await?
        .expect("destination by slug");
    assert_eq!(by_slug.name, "Lisboa");
    Ok(())
}

#[tokio::test]
async fn tour_upsert_creates_then_replaces() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let destination = create_destination(&state, &admin).await?;
    let request = tour_request(destination.id, Decimal::new(12000, 2), 8);

    let created = tour_service::upsert_by_slug(&state, &admin, request.clone())
        .await?
        .into_data()
        .expect("tour");

    tokio::time::sleep(Duration::from_millis(20)).await;
    let mut replacement = request;
    replacement.price = Decimal::new(15000, 2);
    replacement.available_seats = 6;
    let replaced = tour_service::upsert_by_slug(&state, &admin, replacement)
        .await?
        .into_data()
        .expect("tour");

    assert_eq!(replaced.id, created.id);
    assert_eq!(replaced.price, Decimal::new(15000, 2));
    assert_eq!(replaced.available_seats, 6);
    assert_eq!(replaced.created_at, created.created_at);
    assert!(replaced.updated_at > created.updated_at);
    Ok(())
}

#[tokio::test]
async fn updates_touch_updated_at() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let destination = create_destination(&state, &admin).await?;
    let tour = create_tour(&state, &admin, destination.id, Decimal::new(5000, 2), 5).await?;

    tokio::time::sleep(Duration::from_millis(20)).await;
    let renamed = destination_service::update(
        &state,
        &admin,
        destination.id,
        UpdateDestinationRequest {
            name: Some("Renamed".into()),
            ..Default::default()
        },
    )
    .await?
    .into_data()
    .expect("destination");
    assert!(renamed.updated_at > destination.updated_at);

    let retitled = tour_service::update(
        &state,
        &admin,
        tour.id,
        UpdateTourRequest {
            title: Some("Retitled".into()),
            ..Default::default()
        },
    )
    .await?
    .into_data()
    .expect("tour");
    assert_eq!(retitled.title, "Retitled");
    assert!(retitled.updated_at > tour.updated_at);
    assert_eq!(retitled.created_at, tour.created_at);
    Ok(())
}

#[tokio::test]
async fn next_tour_date_can_be_set_and_cleared() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let destination = create_destination(&state, &admin).await?;
    let tour = create_tour(&state, &admin, destination.id, Decimal::new(5000, 2), 5).await?;
    let departure = Utc.with_ymd_and_hms(2031, 5, 1, 8, 0, 0).unwrap();

    let scheduled = tour_service::update(
        &state,
        &admin,
        tour.id,
        UpdateTourRequest {
            next_tour_date: Some(departure),
            ..Default::default()
        },
    )
    .await?
    .into_data()
    .expect("tour");
    assert_eq!(scheduled.next_tour_date, Some(departure));

    // Leaving the field out keeps the date.
    let untouched = tour_service::update(
        &state,
        &admin,
        tour.id,
        UpdateTourRequest {
            duration: Some("4 days".into()),
            ..Default::default()
        },
    )
    .await?
    .into_data()
    .expect("tour");
    assert_eq!(untouched.next_tour_date, Some(departure));

    let cleared = tour_service::update(
        &state,
        &admin,
        tour.id,
        UpdateTourRequest {
            clear_next_tour_date: true,
            ..Default::default()
        },
    )
    .await?
    .into_data()
    .expect("tour");
    assert_eq!(cleared.next_tour_date, None);
    Ok(())
}

#[tokio::test]
async fn prices_beyond_the_money_column_are_rejected() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let customer = create_user(&state, Role::User).await?;
    let destination = create_destination(&state, &admin).await?;

    let too_big = tour_service::create(
        &state,
        &admin,
        tour_request(destination.id, Decimal::new(100_000_000_000, 0), 5),
    )
    .await;
    assert!(matches!(too_big, Err(AppError::Validation(_))));

    let too_precise = tour_service::create(
        &state,
        &admin,
        tour_request(destination.id, Decimal::new(10_001, 3), 5),
    )
    .await;
    assert!(matches!(too_precise, Err(AppError::Validation(_))));

    // 6e9 fits the column, two seats of it do not.
    let pricey = create_tour(
        &state,
        &admin,
        destination.id,
        Decimal::new(6_000_000_000, 0),
        5,
    )
    .await?;
    let order = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            tour_id: pricey.id,
            quantity: 2,
            contact_phone: None,
            contact_email: None,
        },
    )
    .await;
    assert!(matches!(order, Err(AppError::BadRequest(_))));
    assert_eq!(
        tour_service::find_unique_or_throw(&state, pricey.id)
            .await?
            .available_seats,
        5
    );

    order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            tour_id: pricey.id,
            quantity: 1,
            contact_phone: None,
            contact_email: None,
        },
    )
    .await?;
    Ok(())
}

#[tokio::test]
async fn counts_follow_filters() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let customer = create_user(&state, Role::User).await?;
    let destination = create_destination(&state, &admin).await?;
    let tour = create_tour(&state, &admin, destination.id, Decimal::new(4000, 2), 10).await?;
    create_tour(&state, &admin, destination.id, Decimal::new(4500, 2), 10).await?;

    let customer_email = user_service::find_unique_or_throw(&state, &customer.user_id)
        .await?
        .email;
    let users = user_service::count(
        &state,
        &UserQuery {
            q: Some(customer_email),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(users, 1);

    let destinations = destination_service::count(
        &state,
        &DestinationQuery {
            q: Some(destination.slug.clone()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(destinations, 1);

    let tours = tour_service::count(
        &state,
        &TourQuery {
            destination_id: Some(destination.id),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(tours, 2);

    review_service::create(
        &state,
        &customer,
        CreateReviewRequest {
            tour_id: tour.id,
            rating: 3,
            comment: "Fine".into(),
        },
    )
    .await?;
    let pending_reviews = ReviewQuery {
        tour_id: Some(tour.id),
        is_approved: Some(false),
        ..Default::default()
    };
    assert_eq!(review_service::count(&state, &pending_reviews).await?, 1);

    for quantity in [1, 2] {
        order_service::create_order(
            &state,
            &customer,
            CreateOrderRequest {
                tour_id: tour.id,
                quantity,
                contact_phone: None,
                contact_email: None,
            },
        )
        .await?;
    }
    let orders = order_service::count(
        &state,
        &OrderListQuery {
            tour_id: Some(tour.id),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(orders, 2);

    ticket_service::create_ticket(
        &state,
        &customer,
        CreateTicketRequest {
            subject: "Invoice".into(),
            message: "Please send an invoice.".into(),
        },
    )
    .await?;
    let open_tickets = ticket_service::count(
        &state,
        &TicketListQuery {
            status: Some(TicketStatus::Open),
            ..Default::default()
        },
    )
    .await?;
    assert!(open_tickets >= 1);
    Ok(())
}
