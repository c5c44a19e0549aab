// src/db/storage.rs

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        auth::{NewUser, User},
        booking::{Booking, NewBooking},
        schedule::ScheduleOverride,
        shop::{NewService, NewShop, Service, Shop},
    },
};

/// Porta de persistência usada pelos serviços.
///
/// Duas implementações: `PgStorage` (produção) e `InMemoryStorage`
/// (desenvolvimento sem banco e testes).
///
/// `insert_booking` e `move_booking` são o ponto crítico: a checagem de
/// sobreposição e a escrita acontecem numa única unidade atômica por loja,
/// e quem perde a corrida recebe `AppError::Conflict`.
#[async_trait]
pub trait Storage: Send + Sync {
    // --- Usuários ---
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    // --- Lojas e catálogo ---
    async fn create_shop(&self, shop: NewShop) -> Result<Shop, AppError>;
    async fn get_shop(&self, id: Uuid) -> Result<Option<Shop>, AppError>;
    async fn list_shops(&self) -> Result<Vec<Shop>, AppError>;
    /// Nome único por loja, sem diferenciar maiúsculas (`Conflict`).
    async fn create_service(&self, service: NewService) -> Result<Service, AppError>;
    async fn list_services(&self, shop_id: Uuid) -> Result<Vec<Service>, AppError>;
    async fn delete_service(&self, shop_id: Uuid, service_id: Uuid) -> Result<bool, AppError>;

    // --- Exceções de agenda ---
    /// Grava todas ou nenhuma; uma data que já tem exceção é substituída.
    async fn upsert_overrides(
        &self,
        overrides: Vec<ScheduleOverride>,
    ) -> Result<Vec<ScheduleOverride>, AppError>;
    async fn find_override(
        &self,
        shop_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<ScheduleOverride>, AppError>;
    async fn list_overrides(
        &self,
        shop_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ScheduleOverride>, AppError>;
    async fn delete_override(&self, shop_id: Uuid, override_id: Uuid) -> Result<bool, AppError>;

    // --- Ledger de reservas ---
    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, AppError>;
    async fn list_user_bookings(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError>;
    /// Reservas ativas da loja que tocam [from, to), de todas as cadeiras.
    async fn list_active_bookings(
        &self,
        shop_id: Uuid,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Booking>, AppError>;
    async fn find_overlapping(
        &self,
        shop_id: Uuid,
        seat_number: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Booking>, AppError>;
    /// Escolhe a primeira cadeira livre de `seats` (na ordem dada) e grava.
    async fn insert_booking(&self, booking: NewBooking, seats: &[i32]) -> Result<Booking, AppError>;
    /// Move a reserva para [start, end) na primeira cadeira livre de `seats`.
    /// Marca como Rescheduled. Reserva cancelada → `InvalidState`.
    async fn move_booking(
        &self,
        id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
        seats: &[i32],
    ) -> Result<Booking, AppError>;
    /// Cancelada → `InvalidState`; inexistente → `ResourceNotFound`.
    async fn cancel_booking(&self, id: Uuid) -> Result<Booking, AppError>;
}

/// Primeira cadeira de `seats` sem reserva ativa sobreposta a [start, end).
pub fn pick_free_seat(
    seats: &[i32],
    existing: &[Booking],
    start: NaiveDateTime,
    end: NaiveDateTime,
    exclude: Option<Uuid>,
) -> Option<i32> {
    seats.iter().copied().find(|&seat| {
        !existing.iter().any(|b| {
            b.seat_number == seat
                && b.status.is_active()
                && Some(b.id) != exclude
                && b.overlaps(start, end)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::BookingStatus;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use sqlx::types::Json;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 5, 6).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn on_seat(seat: i32, from: u32, to: u32, status: BookingStatus) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            shop_id: Uuid::nil(),
            user_id: Uuid::nil(),
            seat_number: seat,
            services: Json(vec![]),
            total_duration_minutes: ((to - from) * 60) as i32,
            total_price: Decimal::ZERO,
            start_at: at(from),
            end_at: at(to),
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn picks_lowest_free_seat() {
        let existing = vec![on_seat(1, 10, 11, BookingStatus::Booked)];
        assert_eq!(pick_free_seat(&[1, 2, 3], &existing, at(10), at(11), None), Some(2));
        assert_eq!(pick_free_seat(&[1, 2, 3], &existing, at(11), at(12), None), Some(1));
    }

    #[test]
    fn cancelled_bookings_do_not_hold_seats() {
        let existing = vec![on_seat(1, 10, 11, BookingStatus::Cancelled)];
        assert_eq!(pick_free_seat(&[1], &existing, at(10), at(11), None), Some(1));
    }

    #[test]
    fn excluded_booking_does_not_block_itself() {
        let own = on_seat(1, 10, 12, BookingStatus::Booked);
        let existing = vec![own.clone()];
        assert_eq!(pick_free_seat(&[1], &existing, at(11), at(13), None), None);
        assert_eq!(pick_free_seat(&[1], &existing, at(11), at(13), Some(own.id)), Some(1));
    }

    #[test]
    fn respects_given_seat_order() {
        assert_eq!(pick_free_seat(&[3, 1, 2], &[], at(10), at(11), None), Some(3));
        assert_eq!(pick_free_seat(&[], &[], at(10), at(11), None), None);
    }
}
