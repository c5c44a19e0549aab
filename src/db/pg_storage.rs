// src/db/pg_storage.rs

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    storage::{pick_free_seat, Storage},
    BookingRepository, ScheduleRepository, ShopRepository, UserRepository,
};
use crate::{
    common::{db_utils::lock_shop, error::AppError},
    models::{
        auth::{NewUser, User},
        booking::{Booking, NewBooking},
        schedule::ScheduleOverride,
        shop::{NewService, NewShop, Service, Shop},
    },
};

// Storage de produção: junta os repositórios e cuida das transações.
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
    user_repo: UserRepository,
    shop_repo: ShopRepository,
    schedule_repo: ScheduleRepository,
    booking_repo: BookingRepository,
}

impl PgStorage {
    pub fn new(pool: PgPool) -> Self {
        Self {
            user_repo: UserRepository::new(pool.clone()),
            shop_repo: ShopRepository::new(pool.clone()),
            schedule_repo: ScheduleRepository::new(pool.clone()),
            booking_repo: BookingRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl Storage for PgStorage {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        self.user_repo.create_user(user).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.user_repo.find_by_email(email).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        self.user_repo.find_by_id(id).await
    }

    async fn create_shop(&self, shop: NewShop) -> Result<Shop, AppError> {
        self.shop_repo.create_shop(shop).await
    }

    async fn get_shop(&self, id: Uuid) -> Result<Option<Shop>, AppError> {
        self.shop_repo.find_by_id(id).await
    }

    async fn list_shops(&self) -> Result<Vec<Shop>, AppError> {
        self.shop_repo.list().await
    }

    async fn create_service(&self, service: NewService) -> Result<Service, AppError> {
        self.shop_repo.create_service(service).await
    }

    async fn list_services(&self, shop_id: Uuid) -> Result<Vec<Service>, AppError> {
        self.shop_repo.list_services(shop_id).await
    }

    async fn delete_service(&self, shop_id: Uuid, service_id: Uuid) -> Result<bool, AppError> {
        self.shop_repo.delete_service(shop_id, service_id).await
    }

    async fn upsert_overrides(
        &self,
        overrides: Vec<ScheduleOverride>,
    ) -> Result<Vec<ScheduleOverride>, AppError> {
        // Um intervalo de datas vira N linhas: ou grava todas, ou nenhuma.
        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(overrides.len());
        for entry in &overrides {
            saved.push(self.schedule_repo.upsert_override(&mut *tx, entry).await?);
        }
        tx.commit().await?;
        Ok(saved)
    }

    async fn find_override(
        &self,
        shop_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<ScheduleOverride>, AppError> {
        self.schedule_repo.find_override(shop_id, date).await
    }

    async fn list_overrides(
        &self,
        shop_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ScheduleOverride>, AppError> {
        self.schedule_repo.list_overrides(shop_id, from, to).await
    }

    async fn delete_override(&self, shop_id: Uuid, override_id: Uuid) -> Result<bool, AppError> {
        self.schedule_repo.delete_override(shop_id, override_id).await
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        self.booking_repo.find_by_id(id).await
    }

    async fn list_user_bookings(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError> {
        self.booking_repo.list_for_user(user_id).await
    }

    async fn list_active_bookings(
        &self,
        shop_id: Uuid,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Booking>, AppError> {
        self.booking_repo
            .list_active_overlapping(&self.pool, shop_id, from, to)
            .await
    }

    async fn find_overlapping(
        &self,
        shop_id: Uuid,
        seat_number: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Booking>, AppError> {
        self.booking_repo
            .find_overlapping(shop_id, seat_number, start, end, exclude)
            .await
    }

    async fn insert_booking(&self, booking: NewBooking, seats: &[i32]) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await?;

        // 1. Fila da loja: outra criação/remarcação espera o nosso commit
        lock_shop(&mut *tx, booking.shop_id).await?;

        // 2. Ocupação atual, já dentro da transação
        let existing = self
            .booking_repo
            .list_active_overlapping(&mut *tx, booking.shop_id, booking.start_at, booking.end_at)
            .await?;

        let seat = pick_free_seat(seats, &existing, booking.start_at, booking.end_at, None)
            .ok_or_else(|| AppError::Conflict("nenhuma cadeira livre neste horário".into()))?;

        // 3. Grava (a EXCLUDE constraint ainda protege se algo escapar da trava)
        let created = self.booking_repo.insert(&mut *tx, &booking, seat).await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn move_booking(
        &self,
        id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
        seats: &[i32],
    ) -> Result<Booking, AppError> {
        let mut tx = self.pool.begin().await?;

        let current = self
            .booking_repo
            .find_by_id_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Reserva {}", id)))?;

        if !current.status.is_active() {
            return Err(AppError::InvalidState("reserva cancelada".into()));
        }

        lock_shop(&mut *tx, current.shop_id).await?;

        let existing = self
            .booking_repo
            .list_active_overlapping(&mut *tx, current.shop_id, start, end)
            .await?;

        let seat = pick_free_seat(seats, &existing, start, end, Some(id))
            .ok_or_else(|| AppError::Conflict("nenhuma cadeira livre no novo horário".into()))?;

        let moved = self
            .booking_repo
            .update_interval(&mut *tx, id, seat, start, end)
            .await?;

        tx.commit().await?;
        Ok(moved)
    }

    async fn cancel_booking(&self, id: Uuid) -> Result<Booking, AppError> {
        match self.booking_repo.cancel(&self.pool, id).await? {
            Some(booking) => Ok(booking),
            // Nada foi atualizado: ou não existe, ou já estava cancelada
            None => match self.booking_repo.find_by_id(id).await? {
                Some(_) => Err(AppError::InvalidState("reserva já cancelada".into())),
                None => Err(AppError::ResourceNotFound(format!("Reserva {}", id))),
            },
        }
    }
}
