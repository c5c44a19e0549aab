// src/db/booking_repo.rs

use chrono::NaiveDateTime;
use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_booking_write_error, error::AppError},
    models::booking::{Booking, BookingStatus, NewBooking},
};

// Ledger de reservas. As operações de escrita recebem o executor para que o
// serviço possa rodar "trava + checa + grava" dentro da mesma transação.
#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(booking)
    }

    // Mesma busca, mas travando a linha até o fim da transação
    pub async fn find_by_id_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(booking)
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError> {
        let list = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE user_id = $1 ORDER BY start_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(list)
    }

    // Reservas ativas (qualquer cadeira) que tocam [from, to).
    // Uma query por loja/período; a partição por cadeira é feita em memória.
    pub async fn list_active_overlapping<'e, E>(
        &self,
        executor: E,
        shop_id: Uuid,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let list = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE shop_id = $1
              AND status IN ('BOOKED', 'RESCHEDULED')
              AND start_at < $3
              AND end_at > $2
            ORDER BY start_at, seat_number
            "#,
        )
        .bind(shop_id)
        .bind(from)
        .bind(to)
        .fetch_all(executor)
        .await?;
        Ok(list)
    }

    pub async fn find_overlapping(
        &self,
        shop_id: Uuid,
        seat_number: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Booking>, AppError> {
        let list = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE shop_id = $1
              AND seat_number = $2
              AND status IN ('BOOKED', 'RESCHEDULED')
              AND start_at < $4
              AND end_at > $3
              AND ($5::uuid IS NULL OR id <> $5)
            ORDER BY start_at
            "#,
        )
        .bind(shop_id)
        .bind(seat_number)
        .bind(start)
        .bind(end)
        .bind(exclude)
        .fetch_all(&self.pool)
        .await?;
        Ok(list)
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        booking: &NewBooking,
        seat_number: i32,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                shop_id, user_id, seat_number, services,
                total_duration_minutes, total_price, start_at, end_at, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(booking.shop_id)
        .bind(booking.user_id)
        .bind(seat_number)
        .bind(Json(&booking.services))
        .bind(booking.total_duration_minutes)
        .bind(booking.total_price)
        .bind(booking.start_at)
        .bind(booking.end_at)
        .bind(BookingStatus::Booked)
        .fetch_one(executor)
        .await
        .map_err(map_booking_write_error)
    }

    pub async fn update_interval<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        seat_number: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Booking, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET seat_number = $2, start_at = $3, end_at = $4,
                status = 'RESCHEDULED', updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(seat_number)
        .bind(start)
        .bind(end)
        .fetch_one(executor)
        .await
        .map_err(map_booking_write_error)
    }

    // UPDATE condicional: se já estava cancelada, não volta linha nenhuma.
    pub async fn cancel<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Booking>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings
            SET status = 'CANCELLED', updated_at = NOW()
            WHERE id = $1 AND status <> 'CANCELLED'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(booking)
    }
}
