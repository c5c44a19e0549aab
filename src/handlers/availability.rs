// src/handlers/availability.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::{ApiError, AppError},
        time_fmt::hhmm_option,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{RequireRole, RoleShopOwner},
    },
    models::{
        booking::BookingView,
        schedule::{DaySchedule, ScheduleOverride, TimeWindow},
    },
    services::schedule_service::OverrideRequest,
};

// Formato que o app já envia
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetOverridePayload {
    pub shop_id: Uuid,
    #[schema(value_type = String, example = "2025-12-24")]
    pub date: NaiveDate,
    // Opcional: aplica a mesma exceção de `date` até `endDate`
    #[schema(value_type = Option<String>, example = "2025-12-26")]
    pub end_date: Option<NaiveDate>,
    pub is_shop_open: bool,
    #[serde(with = "hhmm_option", default)]
    #[schema(value_type = Option<String>, example = "10:00")]
    pub open_time: Option<NaiveTime>,
    #[serde(with = "hhmm_option", default)]
    #[schema(value_type = Option<String>, example = "14:00")]
    pub close_time: Option<NaiveTime>,
    #[validate(range(min = 0, max = 100, message = "Número de cadeiras entre 0 e 100."))]
    pub seat_count: Option<i32>,
    pub time_range_closed: Option<TimeWindow>,
    #[validate(length(max = 255, message = "Motivo muito longo."))]
    #[schema(example = "Véspera de Natal")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SetOverrideResponse {
    #[schema(example = "Exceção de agenda salva.")]
    pub message: String,
    pub overrides: Vec<ScheduleOverride>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OverridesQuery {
    pub shop_id: Uuid,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ShopQuery {
    pub shop_id: Uuid,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct DayQuery {
    pub shop_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SeatAgendaQuery {
    pub shop_id: Uuid,
    pub seat: i32,
    /// Início, ex.: 2025-12-20T10:00:00
    pub from: NaiveDateTime,
    pub to: NaiveDateTime,
}

// POST /api/availability/override
#[utoipa::path(
    post,
    path = "/api/availability/override",
    tag = "Availability",
    request_body = SetOverridePayload,
    responses(
        (status = 200, description = "Exceção(ões) gravada(s)", body = SetOverrideResponse),
        (status = 400, description = "Combinação de campos inválida"),
        (status = 403, description = "Loja de outro dono")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_override(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(ctx): AuthenticatedUser,
    _guard: RequireRole<RoleShopOwner>,
    Json(payload): Json<SetOverridePayload>,
) -> Result<Json<SetOverrideResponse>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let overrides = app_state
        .schedule_service
        .set_override(
            &ctx,
            OverrideRequest {
                shop_id: payload.shop_id,
                date: payload.date,
                end_date: payload.end_date,
                is_open: payload.is_shop_open,
                open_time: payload.open_time,
                close_time: payload.close_time,
                seat_count: payload.seat_count,
                closure: payload.time_range_closed,
                reason: payload.reason,
            },
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(SetOverrideResponse {
        message: "Exceção de agenda salva.".into(),
        overrides,
    }))
}

// GET /api/availability/overrides
#[utoipa::path(
    get,
    path = "/api/availability/overrides",
    tag = "Availability",
    params(OverridesQuery),
    responses((status = 200, description = "Exceções no intervalo", body = Vec<ScheduleOverride>)),
    security(("api_jwt" = []))
)]
pub async fn list_overrides(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<OverridesQuery>,
) -> Result<Json<Vec<ScheduleOverride>>, ApiError> {
    let overrides = app_state
        .schedule_service
        .list_overrides(query.shop_id, query.from, query.to)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(Json(overrides))
}

// DELETE /api/availability/override/{override_id}
#[utoipa::path(
    delete,
    path = "/api/availability/override/{override_id}",
    tag = "Availability",
    params(
        ("override_id" = Uuid, Path, description = "ID da exceção"),
        ShopQuery
    ),
    responses(
        (status = 204, description = "Exceção removida; o dia volta ao padrão"),
        (status = 404, description = "Exceção não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_override(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(override_id): Path<Uuid>,
    Query(query): Query<ShopQuery>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .schedule_service
        .delete_override(&ctx, query.shop_id, override_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(StatusCode::NO_CONTENT)
}

// GET /api/availability/day
#[utoipa::path(
    get,
    path = "/api/availability/day",
    tag = "Availability",
    params(DayQuery),
    responses(
        (status = 200, description = "Agenda efetiva do dia", body = DaySchedule),
        (status = 404, description = "Loja não encontrada")
    )
)]
pub async fn day_schedule(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<DayQuery>,
) -> Result<Json<DaySchedule>, ApiError> {
    let day = app_state
        .schedule_service
        .resolve_day(query.shop_id, query.date)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(Json(day))
}

// GET /api/availability/seat-agenda
#[utoipa::path(
    get,
    path = "/api/availability/seat-agenda",
    tag = "Availability",
    params(SeatAgendaQuery),
    responses(
        (status = 200, description = "Reservas ativas da cadeira no intervalo", body = Vec<BookingView>),
        (status = 403, description = "Loja de outro dono")
    ),
    security(("api_jwt" = []))
)]
pub async fn seat_agenda(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(ctx): AuthenticatedUser,
    _guard: RequireRole<RoleShopOwner>,
    Query(query): Query<SeatAgendaQuery>,
) -> Result<Json<Vec<BookingView>>, ApiError> {
    let bookings = app_state
        .booking_service
        .seat_agenda(&ctx, query.shop_id, query.seat, query.from, query.to)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(Json(bookings))
}
