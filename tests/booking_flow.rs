mod common;

use rust_decimal::Decimal;
use tour_booking_api::{
    dto::{
        orders::{CreateOrderRequest, UpdateOrderStatusRequest},
        reviews::{ApproveReviewRequest, CreateReviewRequest},
        tickets::{AddTicketResponseRequest, CreateTicketRequest, UpdateTicketStatusRequest},
        users::UpdateRoleRequest,
    },
    entity::sea_orm_active_enums::{OrderStatus, Role, TicketStatus},
    error::AppError,
    middleware::auth::current_user,
    services::{order_service, review_service, ticket_service, tour_service, user_service},
};

use common::{create_destination, create_tour, create_user, setup_state};

// Customer books seats, staff confirms, a second booking is cancelled and its seats come back.
#[tokio::test]
async fn booking_takes_and_returns_seats() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let customer = create_user(&state, Role::User).await?;
    let destination = create_destination(&state, &admin).await?;
    let tour = create_tour(&state, &admin, destination.id, Decimal::new(19950, 2), 5).await?;

    let order = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            tour_id: tour.id,
            quantity: 2,
            contact_phone: Some("+3550000000".into()),
            contact_email: None,
        },
    )
    .await?
    .into_data()
    .expect("order");
    assert_eq!(order.total_price, Decimal::new(39900, 2));
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.contact_email.ends_with("@example.com"));

    let after_first = tour_service::find_unique_or_throw(&state, tour.id).await?;
    assert_eq!(after_first.available_seats, 3);

    let too_many = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            tour_id: tour.id,
            quantity: 4,
            contact_phone: None,
            contact_email: None,
        },
    )
    .await;
    assert!(matches!(too_many, Err(AppError::BadRequest(_))));

    let confirmed = order_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Confirmed,
        },
    )
    .await?
    .into_data()
    .expect("order");
    assert_eq!(confirmed.status, OrderStatus::Confirmed);

    let second = order_service::create_order(
        &state,
        &customer,
        CreateOrderRequest {
            tour_id: tour.id,
            quantity: 3,
            contact_phone: None,
            contact_email: Some("trip@example.com".into()),
        },
    )
    .await?
    .into_data()
    .expect("order");
    assert_eq!(
        tour_service::find_unique_or_throw(&state, tour.id)
            .await?
            .available_seats,
        0
    );

    order_service::cancel_order(&state, &customer, second.id).await?;
    assert_eq!(
        tour_service::find_unique_or_throw(&state, tour.id)
            .await?
            .available_seats,
        3
    );

    // Confirmed orders can no longer be cancelled by the customer.
    let late_cancel = order_service::cancel_order(&state, &customer, order.id).await;
    assert!(matches!(late_cancel, Err(AppError::BadRequest(_))));

    let totals = order_service::aggregate(&state, Some(tour.id)).await?;
    assert_eq!(totals.count, 1);
    assert_eq!(totals.quantity, 2);
    assert_eq!(totals.revenue, Decimal::new(39900, 2));

    let groups = order_service::group_by_status(&state, &admin)
        .await?
        .into_data()
        .expect("groups");
    assert!(groups.iter().any(|g| g.status == OrderStatus::Confirmed));
    assert!(groups.iter().any(|g| g.status == OrderStatus::Cancelled));

    // Orders keep the tour around.
    let blocked = tour_service::delete(&state, &admin, tour.id).await;
    assert!(matches!(blocked, Err(AppError::Conflict(_))));
    Ok(())
}

#[tokio::test]
async fn other_customers_cannot_see_an_order() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let owner = create_user(&state, Role::User).await?;
    let stranger = create_user(&state, Role::User).await?;
    let destination = create_destination(&state, &admin).await?;
    let tour = create_tour(&state, &admin, destination.id, Decimal::new(1000, 2), 2).await?;

    let order = order_service::create_order(
        &state,
        &owner,
        CreateOrderRequest {
            tour_id: tour.id,
            quantity: 1,
            contact_phone: None,
            contact_email: None,
        },
    )
    .await?
    .into_data()
    .expect("order");

    assert!(matches!(
        order_service::get_order(&state, &stranger, order.id).await,
        Err(AppError::NotFound)
    ));
    let seen = order_service::get_order(&state, &admin, order.id)
        .await?
        .into_data()
        .expect("order");
    assert_eq!(seen.order.id, order.id);
    assert_eq!(seen.tour.map(|t| t.id), Some(tour.id));
    Ok(())
}

#[tokio::test]
async fn only_approved_reviews_count_towards_rating() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let destination = create_destination(&state, &admin).await?;
    let tour = create_tour(&state, &admin, destination.id, Decimal::new(2500, 2), 10).await?;

    let mut review_ids = Vec::new();
    for rating in [2, 4, 5] {
        let author = create_user(&state, Role::User).await?;
        let review = review_service::create(
            &state,
            &author,
            CreateReviewRequest {
                tour_id: tour.id,
                rating,
                comment: format!("{rating} stars"),
            },
        )
        .await?
        .into_data()
        .expect("review");
        assert!(!review.is_approved);
        review_ids.push(review.id);
    }

    let empty = review_service::aggregate_for_tour(&state, tour.id).await?;
    assert_eq!(empty.count, 0);
    assert_eq!(empty.average, None);

    for id in &review_ids[1..] {
        review_service::set_approval(&state, &admin, *id, ApproveReviewRequest { is_approved: true })
            .await?;
    }

    let summary = review_service::aggregate_for_tour(&state, tour.id).await?;
    assert_eq!(summary.count, 2);
    assert_eq!(summary.min, Some(4));
    assert_eq!(summary.max, Some(5));
    assert_eq!(summary.average, Some(4.5));
    Ok(())
}

#[tokio::test]
async fn ticket_conversation_moves_status() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let manager = create_user(&state, Role::Manager).await?;
    let customer = create_user(&state, Role::User).await?;

    let ticket = ticket_service::create_ticket(
        &state,
        &customer,
        CreateTicketRequest {
            subject: "Pickup time".into(),
            message: "When is the hotel pickup?".into(),
        },
    )
    .await?
    .into_data()
    .expect("ticket");
    assert_eq!(ticket.status, TicketStatus::Open);

    let reply = ticket_service::add_response(
        &state,
        &manager,
        ticket.id,
        AddTicketResponseRequest {
            message: "At 04:30.".into(),
        },
    )
    .await?
    .into_data()
    .expect("response");
    assert!(reply.is_from_staff);

    let current = ticket_service::find_unique_or_throw(&state, ticket.id).await?;
    assert_eq!(current.status, TicketStatus::InProgress);

    ticket_service::update_ticket_status(
        &state,
        &manager,
        ticket.id,
        UpdateTicketStatusRequest {
            status: TicketStatus::Closed,
        },
    )
    .await?;

    let closed = ticket_service::add_response(
        &state,
        &customer,
        ticket.id,
        AddTicketResponseRequest {
            message: "Thanks!".into(),
        },
    )
    .await;
    assert!(matches!(closed, Err(AppError::BadRequest(_))));

    let thread = ticket_service::get_ticket(&state, &customer, ticket.id)
        .await?
        .into_data()
        .expect("ticket");
    assert_eq!(thread.responses.len(), 1);
    Ok(())
}

// A customer reply racing a staff close must never leave the ticket open.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn close_is_not_lost_to_a_concurrent_reply() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let manager = create_user(&state, Role::Manager).await?;
    let customer = create_user(&state, Role::User).await?;

    for _ in 0..20 {
        let ticket = ticket_service::create_ticket(
            &state,
            &customer,
            CreateTicketRequest {
                subject: "Refund".into(),
                message: "Was the refund sent?".into(),
            },
        )
        .await?
        .into_data()
        .expect("ticket");
        ticket_service::update_ticket_status(
            &state,
            &manager,
            ticket.id,
            UpdateTicketStatusRequest {
                status: TicketStatus::Resolved,
            },
        )
        .await?;
        let ticket_id = ticket.id;

        let close = {
            let (state, manager) = (state.clone(), manager.clone());
            tokio::spawn(async move {
                ticket_service::update_ticket_status(
                    &state,
                    &manager,
                    ticket_id,
                    UpdateTicketStatusRequest {
                        status: TicketStatus::Closed,
                    },
                )
                .await
                .map(|_| ())
            })
        };
        let reply = {
            let (state, customer) = (state.clone(), customer.clone());
            tokio::spawn(async move {
                ticket_service::add_response(
                    &state,
                    &customer,
                    ticket_id,
                    AddTicketResponseRequest {
                        message: "Not yet.".into(),
                    },
                )
                .await
                .map(|_| ())
            })
        };

        close.await??;
        match reply.await? {
            Ok(()) | Err(AppError::BadRequest(_)) => {}
            Err(other) => return Err(other.into()),
        }

        let current = ticket_service::find_unique_or_throw(&state, ticket.id).await?;
        assert_eq!(current.status, TicketStatus::Closed);
    }
    Ok(())
}

#[tokio::test]
async fn customer_reply_reopens_a_resolved_ticket() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let manager = create_user(&state, Role::Manager).await?;
    let customer = create_user(&state, Role::User).await?;
    let stranger = create_user(&state, Role::User).await?;

    let ticket = ticket_service::create_ticket(
        &state,
        &customer,
        CreateTicketRequest {
            subject: "Dates".into(),
            message: "Can I move my booking?".into(),
        },
    )
    .await?
    .into_data()
    .expect("ticket");
    ticket_service::update_ticket_status(
        &state,
        &manager,
        ticket.id,
        UpdateTicketStatusRequest {
            status: TicketStatus::Resolved,
        },
    )
    .await?;

    let hidden = ticket_service::add_response(
        &state,
        &stranger,
        ticket.id,
        AddTicketResponseRequest {
            message: "Me too".into(),
        },
    )
    .await;
    assert!(matches!(hidden, Err(AppError::NotFound)));

    let reply = ticket_service::add_response(
        &state,
        &customer,
        ticket.id,
        AddTicketResponseRequest {
            message: "Actually one more thing.".into(),
        },
    )
    .await?
    .into_data()
    .expect("response");
    assert!(!reply.is_from_staff);
    assert_eq!(
        ticket_service::find_unique_or_throw(&state, ticket.id)
            .await?
            .status,
        TicketStatus::Open
    );
    Ok(())
}

#[tokio::test]
async fn authenticated_role_comes_from_the_users_table() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, Role::Admin).await?;
    let manager = create_user(&state, Role::Manager).await?;

    let resolved = current_user(&state, &manager.user_id).await?;
    assert_eq!(resolved.role, Role::Manager);

    user_service::update_role(
        &state,
        &admin,
        &manager.user_id,
        UpdateRoleRequest { role: Role::User },
    )
    .await?;
    let demoted = current_user(&state, &manager.user_id).await?;
    assert_eq!(demoted.role, Role::User);
    assert!(!demoted.is_staff());

    user_service::delete(&state, &admin, &manager.user_id).await?;
    assert!(matches!(
        current_user(&state, &manager.user_id).await,
        Err(AppError::Unauthorized)
    ));
    Ok(())
}
