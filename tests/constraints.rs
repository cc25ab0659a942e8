mod common;

use rust_decimal::Decimal;
use tour_booking_api::{
    dto::{
        auth::RegisterRequest,
        favorites::AddFavoriteRequest,
        orders::CreateOrderRequest,
        reviews::CreateReviewRequest,
    },
    entity::sea_orm_active_enums::Role,
    error::AppError,
    services::{
        auth_service, destination_service, favorite_service, order_service, review_service,
        tour_service, user_service,
    },
};

use common::{create_destination, create_tour, create_user, setup_state, unique};

#[tokio::test]
async fn duplicate_email_is_a_conflict() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let email = format!("dup-{}@example.com", unique());
    let request = RegisterRequest {
        email: email.clone(),
        password: "correct-horse".into(),
        name: None,
        phone: None,
    };

    let first = auth_service::create_user(&state, request.clone(), Role::User).await?;
    let fetched = user_service::find_unique_or_throw(&state, &first.id).await?;
    assert_eq!(fetched.email, email);
    assert_eq!(fetched.role, Role::User);

    let second = auth_service::create_user(&state, request, Role::User).await;
    assert!(matches!(second, Err(AppError::Conflict(_))));
    Ok(())
}

#[tokio::test]
async fn missing_rows_are_none_or_not_found() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };

    let missing = format!("missing-{}", unique());
    assert!(user_service::find_unique(&state, &missing).await?.is_none());
    assert!(matches!(
        user_service::find_unique_or_throw(&state, &missing).await,
        Err(AppError::NotFound)
    ));
    assert!(tour_service::find_unique(&state, i32::MAX).await?.is_none());
    assert!(matches!(
        tour_service::find_unique_or_throw(&state, i32::MAX).await,
        Err(AppError::NotFound)
    ));
    Ok(())
}

#[tokio::test]
async fn favorite_is_unique_per_user_and_tour() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let user = create_user(&state, Role::User).await?;
    let destination = create_destination(&state, &admin).await?;
    let tour = create_tour(&state, &admin, destination.id, Decimal::new(9900, 2), 5).await?;

    favorite_service::add_favorite(&state, &user, AddFavoriteRequest { tour_id: tour.id }).await?;
    let again =
        favorite_service::add_favorite(&state, &user, AddFavoriteRequest { tour_id: tour.id }).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
    assert_eq!(favorite_service::count(&state, &user.user_id).await?, 1);

    favorite_service::remove_favorite(&state, &user, tour.id).await?;
    assert!(matches!(
        favorite_service::remove_favorite(&state, &user, tour.id).await,
        Err(AppError::NotFound)
    ));
    Ok(())
}

#[tokio::test]
async fn order_and_review_need_an_existing_tour() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, Role::User).await?;

    let order = order_service::create_order(
        &state,
        &user,
        CreateOrderRequest {
            tour_id: i32::MAX,
            quantity: 1,
            contact_phone: None,
            contact_email: None,
        },
    )
    .await;
    assert!(matches!(order, Err(AppError::Conflict(_))));

    let review = review_service::create(
        &state,
        &user,
        CreateReviewRequest {
            tour_id: i32::MAX,
            rating: 5,
            comment: "Great".into(),
        },
    )
    .await;
    assert!(matches!(review, Err(AppError::Conflict(_))));
    Ok(())
}

#[tokio::test]
async fn destination_with_tours_cannot_be_deleted() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let destination = create_destination(&state, &admin).await?;
    let tour = create_tour(&state, &admin, destination.id, Decimal::new(5000, 2), 3).await?;

    let blocked = destination_service::delete(&state, &admin, destination.id).await;
    assert!(matches!(blocked, Err(AppError::Conflict(_))));

    tour_service::delete(&state, &admin, tour.id).await?;
    destination_service::delete(&state, &admin, destination.id).await?;
    assert!(
        destination_service::find_unique(&state, destination.id)
            .await?
            .is_none()
    );
    Ok(())
}

#[tokio::test]
async fn only_admins_delete_destinations() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let manager = create_user(&state, Role::Manager).await?;
    let destination = create_destination(&state, &manager).await?;

    let denied = destination_service::delete(&state, &manager, destination.id).await;
    assert!(matches!(denied, Err(AppError::Forbidden)));
    destination_service::delete(&state, &admin, destination.id).await?;
    Ok(())
}
