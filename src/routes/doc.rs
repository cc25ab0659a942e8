use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        destinations::{CreateDestinationRequest, DestinationList, UpdateDestinationRequest},
        favorites::{AddFavoriteRequest, FavoriteTourList},
        orders::{
            CreateOrderRequest, OrderAggregate, OrderList, OrderStatusGroup, OrderWithTour,
            UpdateOrderStatusRequest,
        },
        reviews::{ApproveReviewRequest, CreateReviewRequest, ReviewList, UpdateReviewRequest},
        tickets::{
            AddTicketResponseRequest, CreateTicketRequest, TicketList, TicketStatusGroup,
            TicketWithResponses, UpdateTicketStatusRequest,
        },
        tours::{CreateTourRequest, RatingSummary, TourDetail, TourList, UpdateTourRequest},
        users::{UpdateProfileRequest, UpdateRoleRequest, UserList},
    },
    entity::sea_orm_active_enums::{OrderStatus, Role, TicketStatus},
    models::{Destination, Favorite, Order, Review, Ticket, TicketResponse, Tour, User},
    response::{ApiResponse, Meta},
    routes::{
        admin, auth, destinations, favorites, health, orders, params, reviews, tickets, tours,
        users,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        health::database_check,
        auth::register,
        auth::login,
        users::me,
        users::update_me,
        destinations::list_destinations,
        destinations::get_destination,
        destinations::get_destination_by_slug,
        destinations::list_destination_tours,
        destinations::create_destination,
        destinations::upsert_destination,
        destinations::update_destination,
        destinations::delete_destination,
        tours::list_tours,
        tours::get_tour,
        tours::get_tour_by_slug,
        tours::list_tour_reviews,
        tours::get_tour_rating,
        tours::create_tour,
        tours::upsert_tour,
        tours::update_tour,
        tours::delete_tour,
        reviews::list_reviews,
        reviews::create_review,
        reviews::update_review,
        reviews::moderate_review,
        reviews::delete_review,
        favorites::list_favorites,
        favorites::add_favorite,
        favorites::remove_favorite,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
        orders::cancel_order,
        tickets::list_tickets,
        tickets::create_ticket,
        tickets::get_ticket,
        tickets::add_response,
        admin::list_users,
        admin::update_user_role,
        admin::verify_user_email,
        admin::delete_user,
        admin::list_all_orders,
        admin::update_order_status,
        admin::order_stats,
        admin::order_aggregate,
        admin::list_all_tickets,
        admin::update_ticket_status,
        admin::delete_ticket,
        admin::ticket_stats
    ),
    components(
        schemas(
            Role,
            OrderStatus,
            TicketStatus,
            User,
            Destination,
            Tour,
            Review,
            Favorite,
            Order,
            Ticket,
            TicketResponse,
            health::HealthData,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            UpdateProfileRequest,
            UpdateRoleRequest,
            UserList,
            CreateDestinationRequest,
            UpdateDestinationRequest,
            DestinationList,
            CreateTourRequest,
            UpdateTourRequest,
            TourList,
            TourDetail,
            RatingSummary,
            CreateReviewRequest,
            UpdateReviewRequest,
            ApproveReviewRequest,
            ReviewList,
            AddFavoriteRequest,
            FavoriteTourList,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            OrderWithTour,
            OrderList,
            OrderStatusGroup,
            OrderAggregate,
            CreateTicketRequest,
            UpdateTicketStatusRequest,
            AddTicketResponseRequest,
            TicketWithResponses,
            TicketList,
            TicketStatusGroup,
            admin::AggregateQuery,
            params::Pagination,
            params::SortOrder,
            params::TourSortBy,
            params::UserQuery,
            params::DestinationQuery,
            params::TourQuery,
            params::ReviewQuery,
            params::OrderListQuery,
            params::TicketListQuery,
            Meta,
            ApiResponse<User>,
            ApiResponse<Tour>,
            ApiResponse<TourDetail>,
            ApiResponse<OrderList>,
            ApiResponse<TicketWithResponses>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and database checks"),
        (name = "Auth", description = "Registration and login"),
        (name = "Users", description = "Current user profile"),
        (name = "Destinations", description = "Destination catalogue"),
        (name = "Tours", description = "Tour catalogue, ratings and reviews per tour"),
        (name = "Reviews", description = "Tour reviews and moderation"),
        (name = "Favorites", description = "Saved tours"),
        (name = "Orders", description = "Tour bookings"),
        (name = "Tickets", description = "Support tickets"),
        (name = "Admin", description = "Staff and admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
