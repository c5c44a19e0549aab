// src/db/memory.rs

//! Armazenamento em memória, para rodar sem Postgres (dev) e nos testes.
//! Um único Mutex serializa as escritas, o que dá ao ledger a mesma
//! atomicidade "checa e grava" que o advisory lock dá no Postgres.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Utc};
use sqlx::types::Json;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::storage::{pick_free_seat, Storage};
use crate::{
    common::error::AppError,
    models::{
        auth::{NewUser, User},
        booking::{Booking, BookingStatus, NewBooking},
        schedule::ScheduleOverride,
        shop::{NewService, NewShop, Service, Shop},
    },
};

#[derive(Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    shops: HashMap<Uuid, Shop>,
    services: HashMap<Uuid, Service>,
    overrides: HashMap<(Uuid, NaiveDate), ScheduleOverride>,
    bookings: HashMap<Uuid, Booking>,
}

impl MemoryState {
    fn active_overlapping(
        &self,
        shop_id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Vec<Booking> {
        self.bookings
            .values()
            .filter(|b| b.shop_id == shop_id && b.status.is_active() && b.overlaps(start, end))
            .cloned()
            .collect()
    }
}

#[derive(Default)]
pub struct InMemoryStorage {
    state: Mutex<MemoryState>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AppError::EmailAlreadyExists);
        }
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            name: user.name,
            role: user.role,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn create_shop(&self, shop: NewShop) -> Result<Shop, AppError> {
        let created = Shop {
            id: Uuid::new_v4(),
            owner_id: shop.owner_id,
            name: shop.name,
            address: shop.address,
            open_time: shop.open_time,
            close_time: shop.close_time,
            seat_count: shop.seat_count,
            utc_offset_minutes: shop.utc_offset_minutes,
            created_at: Utc::now(),
        };
        self.state.lock().await.shops.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_shop(&self, id: Uuid) -> Result<Option<Shop>, AppError> {
        Ok(self.state.lock().await.shops.get(&id).cloned())
    }

    async fn list_shops(&self) -> Result<Vec<Shop>, AppError> {
        let mut shops: Vec<Shop> = self.state.lock().await.shops.values().cloned().collect();
        shops.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(shops)
    }

    async fn create_service(&self, service: NewService) -> Result<Service, AppError> {
        let mut state = self.state.lock().await;
        let duplicated = state.services.values().any(|s| {
            s.shop_id == service.shop_id && s.name.to_lowercase() == service.name.to_lowercase()
        });
        if duplicated {
            return Err(AppError::Conflict(format!("serviço '{}' já existe", service.name)));
        }
        let created = Service {
            id: Uuid::new_v4(),
            shop_id: service.shop_id,
            name: service.name,
            price: service.price,
            duration_minutes: service.duration_minutes,
            is_predefined: service.is_predefined,
            created_at: Utc::now(),
        };
        state.services.insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_services(&self, shop_id: Uuid) -> Result<Vec<Service>, AppError> {
        let state = self.state.lock().await;
        let mut services: Vec<Service> = state
            .services
            .values()
            .filter(|s| s.shop_id == shop_id)
            .cloned()
            .collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(services)
    }

    async fn delete_service(&self, shop_id: Uuid, service_id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.lock().await;
        match state.services.get(&service_id) {
            Some(s) if s.shop_id == shop_id => {
                state.services.remove(&service_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn upsert_overrides(
        &self,
        overrides: Vec<ScheduleOverride>,
    ) -> Result<Vec<ScheduleOverride>, AppError> {
        let mut state = self.state.lock().await;
        let mut saved = Vec::with_capacity(overrides.len());
        for mut entry in overrides {
            // mantém o id da exceção substituída, como o ON CONFLICT do Postgres
            if let Some(existing) = state.overrides.get(&(entry.shop_id, entry.date)) {
                entry.id = existing.id;
            }
            state.overrides.insert((entry.shop_id, entry.date), entry.clone());
            saved.push(entry);
        }
        Ok(saved)
    }

    async fn find_override(
        &self,
        shop_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<ScheduleOverride>, AppError> {
        Ok(self.state.lock().await.overrides.get(&(shop_id, date)).cloned())
    }

    async fn list_overrides(
        &self,
        shop_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ScheduleOverride>, AppError> {
        let state = self.state.lock().await;
        let mut list: Vec<ScheduleOverride> = state
            .overrides
            .values()
            .filter(|o| o.shop_id == shop_id && o.date >= from && o.date <= to)
            .cloned()
            .collect();
        list.sort_by_key(|o| o.date);
        Ok(list)
    }

    async fn delete_override(&self, shop_id: Uuid, override_id: Uuid) -> Result<bool, AppError> {
        let mut state = self.state.lock().await;
        let key = state
            .overrides
            .iter()
            .find(|(_, o)| o.shop_id == shop_id && o.id == override_id)
            .map(|(k, _)| *k);
        Ok(key.and_then(|k| state.overrides.remove(&k)).is_some())
    }

    async fn get_booking(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        Ok(self.state.lock().await.bookings.get(&id).cloned())
    }

    async fn list_user_bookings(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError> {
        let state = self.state.lock().await;
        let mut list: Vec<Booking> = state
            .bookings
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.start_at.cmp(&a.start_at));
        Ok(list)
    }

    async fn list_active_bookings(
        &self,
        shop_id: Uuid,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Booking>, AppError> {
        let mut list = self.state.lock().await.active_overlapping(shop_id, from, to);
        list.sort_by_key(|b| (b.start_at, b.seat_number));
        Ok(list)
    }

    async fn find_overlapping(
        &self,
        shop_id: Uuid,
        seat_number: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
        exclude: Option<Uuid>,
    ) -> Result<Vec<Booking>, AppError> {
        let state = self.state.lock().await;
        Ok(state
            .active_overlapping(shop_id, start, end)
            .into_iter()
            .filter(|b| b.seat_number == seat_number && Some(b.id) != exclude)
            .collect())
    }

    async fn insert_booking(&self, booking: NewBooking, seats: &[i32]) -> Result<Booking, AppError> {
        let mut state = self.state.lock().await;
        let existing = state.active_overlapping(booking.shop_id, booking.start_at, booking.end_at);
        let seat = pick_free_seat(seats, &existing, booking.start_at, booking.end_at, None)
            .ok_or_else(|| AppError::Conflict("nenhuma cadeira livre neste horário".into()))?;

        let now = Utc::now();
        let created = Booking {
            id: Uuid::new_v4(),
            shop_id: booking.shop_id,
            user_id: booking.user_id,
            seat_number: seat,
            services: Json(booking.services),
            total_duration_minutes: booking.total_duration_minutes,
            total_price: booking.total_price,
            start_at: booking.start_at,
            end_at: booking.end_at,
            status: BookingStatus::Booked,
            created_at: now,
            updated_at: now,
        };
        state.bookings.insert(created.id, created.clone());
        Ok(created)
    }

    async fn move_booking(
        &self,
        id: Uuid,
        start: NaiveDateTime,
        end: NaiveDateTime,
        seats: &[i32],
    ) -> Result<Booking, AppError> {
        let mut state = self.state.lock().await;
        let current = state
            .bookings
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::ResourceNotFound(format!("Reserva {}", id)))?;
        if !current.status.is_active() {
            return Err(AppError::InvalidState("reserva cancelada".into()));
        }

        let existing = state.active_overlapping(current.shop_id, start, end);
        let seat = pick_free_seat(seats, &existing, start, end, Some(id))
            .ok_or_else(|| AppError::Conflict("nenhuma cadeira livre no novo horário".into()))?;

        let moved = Booking {
            seat_number: seat,
            start_at: start,
            end_at: end,
            status: BookingStatus::Rescheduled,
            updated_at: Utc::now(),
            ..current
        };
        state.bookings.insert(id, moved.clone());
        Ok(moved)
    }

    async fn cancel_booking(&self, id: Uuid) -> Result<Booking, AppError> {
        let mut state = self.state.lock().await;
        let booking = state
            .bookings
            .get_mut(&id)
            .ok_or_else(|| AppError::ResourceNotFound(format!("Reserva {}", id)))?;
        if booking.status == BookingStatus::Cancelled {
            return Err(AppError::InvalidState("reserva já cancelada".into()));
        }
        booking.status = BookingStatus::Cancelled;
        booking.updated_at = Utc::now();
        Ok(booking.clone())
    }
}
