// src/models/booking.rs

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use utoipa::ToSchema;
use uuid::Uuid;

// --- Status persistido ---
// "Completed" NÃO existe aqui: é derivado na leitura (ver EffectiveStatus).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "booking_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Booked,
    Rescheduled,
    Cancelled,
}

impl BookingStatus {
    /// Status que ocupam a cadeira.
    pub fn is_active(self) -> bool {
        matches!(self, BookingStatus::Booked | BookingStatus::Rescheduled)
    }
}

// --- Status exposto para o app ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum EffectiveStatus {
    Booked,
    Rescheduled,
    Cancelled,
    Completed,
}

// Cópia do serviço no momento da reserva (preço e duração podem mudar depois).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookedService {
    pub service_id: Uuid,
    #[schema(example = "Corte masculino")]
    pub name: String,
    #[schema(example = "45.00")]
    pub price: Decimal,
    #[schema(example = 30)]
    pub duration_minutes: i32,
}

#[derive(Debug, Clone, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub user_id: Uuid,
    pub seat_number: i32,
    pub services: Json<Vec<BookedService>>,
    pub total_duration_minutes: i32,
    pub total_price: Decimal,
    // Horário de parede da loja
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Sobreposição semiaberta: existing.start < end && existing.end > start.
    pub fn overlaps(&self, start: NaiveDateTime, end: NaiveDateTime) -> bool {
        self.start_at < end && self.end_at > start
    }

    pub fn is_completed(&self, now: NaiveDateTime) -> bool {
        self.status.is_active() && self.end_at <= now
    }

    pub fn effective_status(&self, now: NaiveDateTime) -> EffectiveStatus {
        if self.is_completed(now) {
            return EffectiveStatus::Completed;
        }
        match self.status {
            BookingStatus::Booked => EffectiveStatus::Booked,
            BookingStatus::Rescheduled => EffectiveStatus::Rescheduled,
            BookingStatus::Cancelled => EffectiveStatus::Cancelled,
        }
    }

    pub fn view(&self, now: NaiveDateTime) -> BookingView {
        BookingView {
            id: self.id,
            shop_id: self.shop_id,
            user_id: self.user_id,
            seat_number: self.seat_number,
            services: self.services.0.clone(),
            total_duration: self.total_duration_minutes,
            total_price: self.total_price,
            start_time: self.start_at,
            end_time: self.end_at,
            status: self.effective_status(now),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

// O que a API devolve: reserva + status derivado.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub user_id: Uuid,
    #[schema(example = 1)]
    pub seat_number: i32,
    pub services: Vec<BookedService>,
    #[schema(example = 60)]
    pub total_duration: i32,
    #[schema(example = "90.00")]
    pub total_price: Decimal,
    #[schema(value_type = String, example = "2025-12-20T14:00:00")]
    pub start_time: NaiveDateTime,
    #[schema(value_type = String, example = "2025-12-20T15:00:00")]
    pub end_time: NaiveDateTime,
    pub status: EffectiveStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Reserva ainda sem cadeira: o ledger escolhe a cadeira de forma atômica.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub shop_id: Uuid,
    pub user_id: Uuid,
    pub services: Vec<BookedService>,
    pub total_duration_minutes: i32,
    pub total_price: Decimal,
    pub start_at: NaiveDateTime,
    pub end_at: NaiveDateTime,
}
