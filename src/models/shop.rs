// src/models/shop.rs

use chrono::{DateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::time_fmt::hhmm;

// --- Loja (Salão) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub id: Uuid,
    pub owner_id: Uuid,
    #[schema(example = "Salão da Maria")]
    pub name: String,
    #[schema(example = "Rua das Flores, 123 - Centro")]
    pub address: Option<String>,

    // Horário padrão de funcionamento (horário de parede da loja)
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "10:00")]
    pub open_time: NaiveTime,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "20:00")]
    pub close_time: NaiveTime,

    #[schema(example = 3)]
    pub seat_count: i32,

    // Fuso da loja como offset fixo (ex.: -180 = UTC-3)
    #[schema(example = -180)]
    pub utc_offset_minutes: i32,

    pub created_at: DateTime<Utc>,
}

// Dados de criação, já validados pelo handler.
#[derive(Debug, Clone)]
pub struct NewShop {
    pub owner_id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub open_time: NaiveTime,
    pub close_time: NaiveTime,
    pub seat_count: i32,
    pub utc_offset_minutes: i32,
}

// --- Serviços oferecidos (corte, escova, ...) ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Uuid,
    pub shop_id: Uuid,
    #[schema(example = "Corte masculino")]
    pub name: String,
    #[schema(example = "45.00")]
    pub price: Decimal,
    #[schema(example = 30)]
    pub duration_minutes: i32,
    pub is_predefined: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewService {
    pub shop_id: Uuid,
    pub name: String,
    pub price: Decimal,
    pub duration_minutes: i32,
    pub is_predefined: bool,
}
