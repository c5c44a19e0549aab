// src/db/schedule_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::schedule::ScheduleOverride};

#[derive(Clone)]
pub struct ScheduleRepository {
    pool: PgPool,
}

impl ScheduleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // UPSERT: uma exceção por (loja, data). A nova substitui a antiga por inteiro.
    pub async fn upsert_override<'e, E>(
        &self,
        executor: E,
        entry: &ScheduleOverride,
    ) -> Result<ScheduleOverride, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let saved = sqlx::query_as::<_, ScheduleOverride>(
            r#"
            INSERT INTO schedule_overrides (
                id, shop_id, date, is_open, open_time, close_time,
                seat_count, closed_from, closed_to, reason
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (shop_id, date)
            DO UPDATE SET
                is_open = EXCLUDED.is_open,
                open_time = EXCLUDED.open_time,
                close_time = EXCLUDED.close_time,
                seat_count = EXCLUDED.seat_count,
                closed_from = EXCLUDED.closed_from,
                closed_to = EXCLUDED.closed_to,
                reason = EXCLUDED.reason
            RETURNING *
            "#,
        )
        .bind(entry.id)
        .bind(entry.shop_id)
        .bind(entry.date)
        .bind(entry.is_open)
        .bind(entry.open_time)
        .bind(entry.close_time)
        .bind(entry.seat_count)
        .bind(entry.closed_from)
        .bind(entry.closed_to)
        .bind(&entry.reason)
        .fetch_one(executor)
        .await?;

        Ok(saved)
    }

    pub async fn find_override(
        &self,
        shop_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<ScheduleOverride>, AppError> {
        let found = sqlx::query_as::<_, ScheduleOverride>(
            "SELECT * FROM schedule_overrides WHERE shop_id = $1 AND date = $2",
        )
        .bind(shop_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found)
    }

    pub async fn list_overrides(
        &self,
        shop_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ScheduleOverride>, AppError> {
        let list = sqlx::query_as::<_, ScheduleOverride>(
            r#"
            SELECT * FROM schedule_overrides
            WHERE shop_id = $1 AND date BETWEEN $2 AND $3
            ORDER BY date
            "#,
        )
        .bind(shop_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(list)
    }

    pub async fn delete_override(&self, shop_id: Uuid, override_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM schedule_overrides WHERE id = $1 AND shop_id = $2")
            .bind(override_id)
            .bind(shop_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
