// src/handlers/bookings.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        time_fmt::hhmm,
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{availability::AvailableSlots, booking::BookingView},
    services::{
        availability_service::DateRange,
        booking_service::{CreateBookingRequest, RescheduleRequest},
    },
};

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AvailableSlotsQuery {
    pub shop_id: Uuid,
    /// Duração total em minutos
    pub duration: i64,
    /// Primeiro dia (padrão: hoje no fuso da loja)
    pub from: Option<NaiveDate>,
    /// Último dia, inclusive
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingPayload {
    pub shop_id: Uuid,
    #[validate(length(min = 1, max = 20, message = "Escolha pelo menos um serviço."))]
    pub service_ids: Vec<Uuid>,
    #[schema(value_type = String, example = "2025-12-20")]
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "14:00")]
    pub start_time: NaiveTime,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CancelBookingPayload {
    pub booking_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleBookingPayload {
    pub booking_id: Uuid,
    #[schema(value_type = String, example = "2025-12-21")]
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "15:00")]
    pub new_start_time: NaiveTime,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "16:00")]
    pub new_end_time: NaiveTime,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingMessage {
    #[schema(example = "Reserva cancelada com sucesso.")]
    pub message: String,
    pub booking: BookingView,
}

// GET /api/bookings/available-slots
#[utoipa::path(
    get,
    path = "/api/bookings/available-slots",
    tag = "Bookings",
    params(AvailableSlotsQuery),
    responses(
        (status = 200, description = "Horários livres por data", body = AvailableSlots),
        (status = 400, description = "Duração ou intervalo inválido")
    )
)]
pub async fn available_slots(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<AvailableSlots>, ApiError> {
    let slots = app_state
        .availability_service
        .get_available_slots(
            query.shop_id,
            query.duration,
            DateRange { from: query.from, to: query.to },
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(Json(slots))
}

// POST /api/bookings
#[utoipa::path(
    post,
    path = "/api/bookings",
    tag = "Bookings",
    request_body = CreateBookingPayload,
    responses(
        (status = 201, description = "Reserva criada", body = BookingView),
        (status = 400, description = "Fora do horário de funcionamento"),
        (status = 409, description = "Nenhuma cadeira livre")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Json(payload): Json<CreateBookingPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let booking = app_state
        .booking_service
        .create(
            &ctx,
            CreateBookingRequest {
                shop_id: payload.shop_id,
                service_ids: payload.service_ids,
                date: payload.date,
                start_time: payload.start_time,
            },
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /api/bookings
#[utoipa::path(
    get,
    path = "/api/bookings",
    tag = "Bookings",
    responses((status = 200, description = "Reservas do usuário", body = Vec<BookingView>)),
    security(("api_jwt" = []))
)]
pub async fn list_my_bookings(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(ctx): AuthenticatedUser,
) -> Result<Json<Vec<BookingView>>, ApiError> {
    let bookings = app_state
        .booking_service
        .list_mine(&ctx)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(Json(bookings))
}

// GET /api/bookings/{booking_id}
#[utoipa::path(
    get,
    path = "/api/bookings/{booking_id}",
    tag = "Bookings",
    params(("booking_id" = Uuid, Path, description = "ID da reserva")),
    responses(
        (status = 200, description = "Reserva", body = BookingView),
        (status = 404, description = "Reserva não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingView>, ApiError> {
    let booking = app_state
        .booking_service
        .get(&ctx, booking_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(Json(booking))
}

// PUT /api/bookings/cancel
#[utoipa::path(
    put,
    path = "/api/bookings/cancel",
    tag = "Bookings",
    request_body = CancelBookingPayload,
    responses(
        (status = 200, description = "Reserva cancelada", body = BookingMessage),
        (status = 404, description = "Reserva não encontrada"),
        (status = 409, description = "Reserva já cancelada ou concluída")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Json(payload): Json<CancelBookingPayload>,
) -> Result<Json<BookingMessage>, ApiError> {
    let booking = app_state
        .booking_service
        .cancel(&ctx, payload.booking_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(BookingMessage {
        message: "Reserva cancelada com sucesso.".into(),
        booking,
    }))
}

// PUT /api/bookings/reschedule
#[utoipa::path(
    put,
    path = "/api/bookings/reschedule",
    tag = "Bookings",
    request_body = RescheduleBookingPayload,
    responses(
        (status = 200, description = "Reserva remarcada", body = BookingView),
        (status = 400, description = "Horário inválido"),
        (status = 409, description = "Sem cadeira livre ou reserva não remarcável")
    ),
    security(("api_jwt" = []))
)]
pub async fn reschedule_booking(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Json(payload): Json<RescheduleBookingPayload>,
) -> Result<Json<BookingView>, ApiError> {
    let booking = app_state
        .booking_service
        .reschedule(
            &ctx,
            RescheduleRequest {
                booking_id: payload.booking_id,
                date: payload.date,
                new_start_time: payload.new_start_time,
                new_end_time: payload.new_end_time,
            },
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(Json(booking))
}
