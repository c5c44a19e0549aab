// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Shops ---
        handlers::shops::create_shop,
        handlers::shops::list_shops,
        handlers::shops::get_shop,
        handlers::shops::create_service,
        handlers::shops::list_services,
        handlers::shops::delete_service,

        // --- Bookings ---
        handlers::bookings::available_slots,
        handlers::bookings::create_booking,
        handlers::bookings::list_my_bookings,
        handlers::bookings::get_booking,
        handlers::bookings::cancel_booking,
        handlers::bookings::reschedule_booking,

        // --- Availability ---
        handlers::availability::set_override,
        handlers::availability::list_overrides,
        handlers::availability::delete_override,
        handlers::availability::day_schedule,
        handlers::availability::seat_agenda,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Shops ---
            models::shop::Shop,
            models::shop::Service,
            handlers::shops::CreateShopPayload,
            handlers::shops::CreateServicePayload,

            // --- Schedule ---
            models::schedule::TimeWindow,
            models::schedule::ScheduleOverride,
            models::schedule::DaySchedule,
            handlers::availability::SetOverridePayload,
            handlers::availability::SetOverrideResponse,

            // --- Bookings ---
            models::booking::BookingStatus,
            models::booking::EffectiveStatus,
            models::booking::BookedService,
            models::booking::BookingView,
            models::availability::Slot,
            models::availability::AvailableSlots,
            handlers::bookings::CreateBookingPayload,
            handlers::bookings::CancelBookingPayload,
            handlers::bookings::RescheduleBookingPayload,
            handlers::bookings::BookingMessage,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário"),
        (name = "Shops", description = "Lojas e Catálogo de Serviços"),
        (name = "Bookings", description = "Horários Livres e Reservas"),
        (name = "Availability", description = "Exceções de Agenda")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
