// src/routes.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{config::AppState, handlers, middleware::auth::auth_guard};

pub fn build_router(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Define as rotas de usuário (protegidas pelo middleware)
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Leitura do catálogo é pública; escrita exige token
    let shop_read_routes = Router::new()
        .route("/", get(handlers::shops::list_shops))
        .route("/{shop_id}", get(handlers::shops::get_shop))
        .route("/{shop_id}/services", get(handlers::shops::list_services));

    let shop_manage_routes = Router::new()
        .route("/", post(handlers::shops::create_shop))
        .route("/{shop_id}/services", post(handlers::shops::create_service))
        .route(
            "/{shop_id}/services/{service_id}",
            delete(handlers::shops::delete_service),
        )
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let booking_read_routes = Router::new()
        .route("/available-slots", get(handlers::bookings::available_slots));

    let booking_routes = Router::new()
        .route(
            "/",
            post(handlers::bookings::create_booking).get(handlers::bookings::list_my_bookings),
        )
        .route("/cancel", put(handlers::bookings::cancel_booking))
        .route("/reschedule", put(handlers::bookings::reschedule_booking))
        .route("/{booking_id}", get(handlers::bookings::get_booking))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let availability_read_routes = Router::new()
        .route("/day", get(handlers::availability::day_schedule));

    let availability_routes = Router::new()
        .route("/override", post(handlers::availability::set_override))
        .route("/overrides", get(handlers::availability::list_overrides))
        .route(
            "/override/{override_id}",
            delete(handlers::availability::delete_override),
        )
        .route("/seat-agenda", get(handlers::availability::seat_agenda))
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/shops", shop_read_routes.merge(shop_manage_routes))
        .nest("/api/bookings", booking_read_routes.merge(booking_routes))
        .nest("/api/availability", availability_read_routes.merge(availability_routes))
        .with_state(app_state)
}
