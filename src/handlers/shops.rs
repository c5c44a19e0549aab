// src/handlers/shops.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::{
        error::{ApiError, AppError},
        time_fmt::hhmm,
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{RequireRole, RoleShopOwner},
    },
    models::shop::{Service, Shop},
    services::shop_service::{CreateServiceRequest, CreateShopRequest},
};

fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() {
        let mut err = ValidationError::new("range");
        err.add_param("min".into(), &0.0);
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateShopPayload {
    #[validate(length(min = 1, max = 120, message = "O nome é obrigatório."))]
    #[schema(example = "Salão da Maria")]
    pub name: String,
    pub address: Option<String>,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "10:00")]
    pub open_time: NaiveTime,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "20:00")]
    pub close_time: NaiveTime,
    #[validate(range(min = 0, max = 100, message = "Número de cadeiras entre 0 e 100."))]
    #[schema(example = 3)]
    pub seat_count: i32,
    #[serde(default)]
    #[schema(example = -180)]
    pub utc_offset_minutes: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateServicePayload {
    #[validate(length(min = 1, max = 120, message = "O nome é obrigatório."))]
    #[schema(example = "Corte masculino")]
    pub name: String,
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "45.00")]
    pub price: Decimal,
    // minutos
    #[validate(range(min = 1, max = 1440, message = "A duração deve ser entre 1 e 1440 minutos."))]
    #[schema(example = 30)]
    pub duration: i32,
    #[serde(default)]
    pub is_predefined: bool,
}

// POST /api/shops
#[utoipa::path(
    post,
    path = "/api/shops",
    tag = "Shops",
    request_body = CreateShopPayload,
    responses(
        (status = 201, description = "Loja criada", body = Shop),
        (status = 403, description = "Apenas donos de loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_shop(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(ctx): AuthenticatedUser,
    _guard: RequireRole<RoleShopOwner>,
    Json(payload): Json<CreateShopPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let shop = app_state
        .shop_service
        .create_shop(
            &ctx,
            CreateShopRequest {
                name: payload.name,
                address: payload.address,
                open_time: payload.open_time,
                close_time: payload.close_time,
                seat_count: payload.seat_count,
                utc_offset_minutes: payload.utc_offset_minutes,
            },
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(shop)))
}

// GET /api/shops
#[utoipa::path(
    get,
    path = "/api/shops",
    tag = "Shops",
    responses((status = 200, description = "Lojas cadastradas", body = Vec<Shop>))
)]
pub async fn list_shops(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<Json<Vec<Shop>>, ApiError> {
    let shops = app_state
        .shop_service
        .list_shops()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(Json(shops))
}

// GET /api/shops/{shop_id}
#[utoipa::path(
    get,
    path = "/api/shops/{shop_id}",
    tag = "Shops",
    params(("shop_id" = Uuid, Path, description = "ID da loja")),
    responses(
        (status = 200, description = "Loja", body = Shop),
        (status = 404, description = "Loja não encontrada")
    )
)]
pub async fn get_shop(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(shop_id): Path<Uuid>,
) -> Result<Json<Shop>, ApiError> {
    let shop = app_state
        .shop_service
        .get_shop(shop_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(Json(shop))
}

// POST /api/shops/{shop_id}/services
#[utoipa::path(
    post,
    path = "/api/shops/{shop_id}/services",
    tag = "Shops",
    request_body = CreateServicePayload,
    params(("shop_id" = Uuid, Path, description = "ID da loja")),
    responses(
        (status = 201, description = "Serviço criado", body = Service),
        (status = 409, description = "Já existe um serviço com esse nome")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_service(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path(shop_id): Path<Uuid>,
    Json(payload): Json<CreateServicePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let service = app_state
        .shop_service
        .create_service(
            &ctx,
            shop_id,
            CreateServiceRequest {
                name: payload.name,
                price: payload.price,
                duration_minutes: payload.duration,
                is_predefined: payload.is_predefined,
            },
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(service)))
}

// GET /api/shops/{shop_id}/services
#[utoipa::path(
    get,
    path = "/api/shops/{shop_id}/services",
    tag = "Shops",
    params(("shop_id" = Uuid, Path, description = "ID da loja")),
    responses((status = 200, description = "Catálogo da loja", body = Vec<Service>))
)]
pub async fn list_services(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(shop_id): Path<Uuid>,
) -> Result<Json<Vec<Service>>, ApiError> {
    let services = app_state
        .shop_service
        .list_services(shop_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(Json(services))
}

// DELETE /api/shops/{shop_id}/services/{service_id}
#[utoipa::path(
    delete,
    path = "/api/shops/{shop_id}/services/{service_id}",
    tag = "Shops",
    params(
        ("shop_id" = Uuid, Path, description = "ID da loja"),
        ("service_id" = Uuid, Path, description = "ID do serviço")
    ),
    responses(
        (status = 204, description = "Serviço removido"),
        (status = 404, description = "Serviço não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_service(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(ctx): AuthenticatedUser,
    Path((shop_id, service_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    app_state
        .shop_service
        .delete_service(&ctx, shop_id, service_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok(StatusCode::NO_CONTENT)
}
