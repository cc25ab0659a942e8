mod common;

use rust_decimal::Decimal;
use tour_booking_api::{
    dto::{
        favorites::AddFavoriteRequest,
        orders::CreateOrderRequest,
        reviews::CreateReviewRequest,
        tickets::{AddTicketResponseRequest, CreateTicketRequest},
    },
    entity::sea_orm_active_enums::Role,
    error::AppError,
    middleware::auth::AuthUser,
    models::{Review, Ticket},
    services::{
        favorite_service, order_service, review_service, ticket_service, tour_service,
        user_service,
    },
    state::AppState,
};

use common::{create_destination, create_tour, create_user, setup_state};

async fn write_review(state: &AppState, author: &AuthUser, tour_id: i32) -> anyhow::Result<Review> {
    let review = review_service::create(
        state,
        author,
        CreateReviewRequest {
            tour_id,
            rating: 4,
            comment: "Good guide".into(),
        },
    )
    .await?
    .into_data()
    .ok_or_else(|| anyhow::anyhow!("review missing from response"))?;
    Ok(review)
}

async fn open_ticket_with_reply(
    state: &AppState,
    customer: &AuthUser,
    staff: &AuthUser,
) -> anyhow::Result<Ticket> {
    let ticket = ticket_service::create_ticket(
        state,
        customer,
        CreateTicketRequest {
            subject: "Luggage".into(),
            message: "How many bags may I bring?".into(),
        },
    )
    .await?
    .into_data()
    .ok_or_else(|| anyhow::anyhow!("ticket missing from response"))?;
    ticket_service::add_response(
        state,
        staff,
        ticket.id,
        AddTicketResponseRequest {
            message: "Two bags.".into(),
        },
    )
    .await?;
    Ok(ticket)
}

#[tokio::test]
async fn deleting_a_tour_removes_its_reviews_and_favorites() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let customer = create_user(&state, Role::User).await?;
    let destination = create_destination(&state, &admin).await?;
    let tour = create_tour(&state, &admin, destination.id, Decimal::new(3000, 2), 4).await?;

    let review = write_review(&state, &customer, tour.id).await?;
    favorite_service::add_favorite(&state, &customer, AddFavoriteRequest { tour_id: tour.id })
        .await?;

    tour_service::delete(&state, &admin, tour.id).await?;

    assert!(review_service::find_unique(&state, review.id).await?.is_none());
    assert!(matches!(
        review_service::find_unique_or_throw(&state, review.id).await,
        Err(AppError::NotFound)
    ));
    assert!(
        favorite_service::find_unique(&state, &customer.user_id, tour.id)
            .await?
            .is_none()
    );
    assert_eq!(favorite_service::count(&state, &customer.user_id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn deleting_a_user_removes_their_reviews_favorites_and_tickets() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let customer = create_user(&state, Role::User).await?;
    let destination = create_destination(&state, &admin).await?;
    let tour = create_tour(&state, &admin, destination.id, Decimal::new(3000, 2), 4).await?;

    let review = write_review(&state, &customer, tour.id).await?;
    favorite_service::add_favorite(&state, &customer, AddFavoriteRequest { tour_id: tour.id })
        .await?;
    let ticket = open_ticket_with_reply(&state, &customer, &admin).await?;

    user_service::delete(&state, &admin, &customer.user_id).await?;

    assert!(user_service::find_unique(&state, &customer.user_id).await?.is_none());
    assert!(review_service::find_unique(&state, review.id).await?.is_none());
    assert_eq!(favorite_service::count(&state, &customer.user_id).await?, 0);
    assert!(ticket_service::find_unique(&state, ticket.id).await?.is_none());
    assert!(ticket_service::list_responses(&state, ticket.id).await?.is_empty());
    // The tour itself is untouched.
    assert!(tour_service::find_unique(&state, tour.id).await?.is_some());
    Ok(())
}

#[tokio::test]
async fn users_with_orders_cannot_be_deleted() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let customer = create_user(&state, Role::User).await?;
    let destination = create_destination(&state, &admin).await?;
    let tour = create_tour(&state, &admin, destination.id, Decimal::new(3000, 2), 4).await?;

    let order = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            tour_id: tour.id,
            quantity: 1,
            contact_phone: None,
            contact_email: None,
        },
    )
    .await?
    .into_data()
    .ok_or_else(|| anyhow::anyhow!("order missing from response"))?;

    let blocked = user_service::delete(&state, &admin, &customer.user_id).await;
    assert!(matches!(blocked, Err(AppError::Conflict(_))));
    assert!(user_service::find_unique(&state, &customer.user_id).await?.is_some());

    let kept = order_service::find_unique_or_throw(&state, order.id).await?;
    assert_eq!(kept.user_id, customer.user_id);

    let denied = user_service::delete(&state, &customer, &customer.user_id).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));
    Ok(())
}

#[tokio::test]
async fn deleting_a_ticket_removes_its_responses() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let manager = create_user(&state, Role::Manager).await?;
    let customer = create_user(&state, Role::User).await?;
    let ticket = open_ticket_with_reply(&state, &customer, &manager).await?;
    assert_eq!(ticket_service::list_responses(&state, ticket.id).await?.len(), 1);

    let denied = ticket_service::delete_ticket(&state, &manager, ticket.id).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));

    ticket_service::delete_ticket(&state, &admin, ticket.id).await?;
    assert!(matches!(
        ticket_service::find_unique_or_throw(&state, ticket.id).await,
        Err(AppError::NotFound)
    ));
    assert!(ticket_service::list_responses(&state, ticket.id).await?.is_empty());

    let again = ticket_service::delete_ticket(&state, &admin, ticket.id).await;
    assert!(matches!(again, Err(AppError::NotFound)));
    Ok(())
}
