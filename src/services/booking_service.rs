// src/services/booking_service.rs

use std::{collections::HashMap, sync::Arc};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::{clock::Clock, error::AppError},
    db::Storage,
    models::{
        auth::{RequestContext, Role},
        booking::{BookedService, Booking, BookingStatus, BookingView, NewBooking},
        shop::Shop,
    },
    services::{schedule_service::ScheduleService, shop_service::ensure_owner},
};

#[derive(Debug, Clone)]
pub struct CreateBookingRequest {
    pub shop_id: Uuid,
    pub service_ids: Vec<Uuid>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
}

#[derive(Debug, Clone)]
pub struct RescheduleRequest {
    pub booking_id: Uuid,
    pub date: NaiveDate,
    pub new_start_time: NaiveTime,
    pub new_end_time: NaiveTime,
}

// Cliente dono da reserva ou dono da loja
fn ensure_can_manage(ctx: &RequestContext, booking: &Booking, shop: &Shop) -> Result<(), AppError> {
    let is_customer = booking.user_id == ctx.user_id;
    let is_owner = ctx.role == Role::ShopOwner && shop.owner_id == ctx.user_id;
    if is_customer || is_owner {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

// Cadeiras na ordem de preferência: a atual primeiro, depois crescente.
fn seat_preference(seat_count: i32, current: Option<i32>) -> Vec<i32> {
    let mut seats: Vec<i32> = Vec::with_capacity(usize::try_from(seat_count).unwrap_or(0));
    if let Some(seat) = current.filter(|s| (1..=seat_count).contains(s)) {
        seats.push(seat);
    }
    seats.extend((1..=seat_count).filter(|s| Some(*s) != current));
    seats
}

#[derive(Clone)]
pub struct BookingService {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    schedule: ScheduleService,
}

impl BookingService {
    pub fn new(storage: Arc<dyn Storage>, clock: Arc<dyn Clock>, schedule: ScheduleService) -> Self {
        Self { storage, clock, schedule }
    }

    async fn load_booking(&self, booking_id: Uuid) -> Result<Booking, AppError> {
        self.storage
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Reserva {}", booking_id)))
    }

    // Cancelada ou já concluída não aceita mais mudança
    fn ensure_mutable(booking: &Booking, now: NaiveDateTime) -> Result<(), AppError> {
        if booking.status == BookingStatus::Cancelled {
            return Err(AppError::InvalidState("reserva já cancelada".into()));
        }
        if booking.is_completed(now) {
            return Err(AppError::InvalidState("reserva já concluída".into()));
        }
        Ok(())
    }

    /// Valida [start, end) contra a agenda resolvida do dia e contra o relógio.
    async fn check_window(
        &self,
        shop: &Shop,
        start: NaiveDateTime,
        end: NaiveDateTime,
        now: NaiveDateTime,
    ) -> Result<i32, AppError> {
        if end.date() != start.date() {
            return Err(AppError::InvalidInput("a reserva deve terminar no mesmo dia".into()));
        }
        if start < now {
            return Err(AppError::InvalidInput("o horário escolhido já passou".into()));
        }

        let day = self.schedule.resolve_for_shop(shop, start.date()).await?;
        if !day.accepts(start.time(), end.time()) {
            return Err(AppError::InvalidInput(format!(
                "{} {}-{} fora do horário de funcionamento",
                day.date,
                start.time().format("%H:%M"),
                end.time().format("%H:%M")
            )));
        }
        Ok(day.seat_count)
    }

    pub async fn create(
        &self,
        ctx: &RequestContext,
        req: CreateBookingRequest,
    ) -> Result<BookingView, AppError> {
        let shop = self.schedule.load_shop(req.shop_id).await?;
        if req.service_ids.is_empty() {
            return Err(AppError::InvalidInput("escolha pelo menos um serviço".into()));
        }

        // Snapshot dos serviços na ordem pedida
        let catalogue = self.storage.list_services(shop.id).await?;
        let services = req
            .service_ids
            .iter()
            .map(|id| {
                catalogue
                    .iter()
                    .find(|s| s.id == *id)
                    .map(|s| BookedService {
                        service_id: s.id,
                        name: s.name.clone(),
                        price: s.price,
                        duration_minutes: s.duration_minutes,
                    })
                    .ok_or_else(|| {
                        AppError::InvalidInput(format!("serviço {} não pertence à loja", id))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let total_duration: i32 = services.iter().map(|s| s.duration_minutes).sum();
        let total_price: Decimal = services.iter().map(|s| s.price).sum();

        let start = req.date.and_time(req.start_time);
        let end = start
            .checked_add_signed(Duration::minutes(i64::from(total_duration)))
            .ok_or_else(|| AppError::InvalidInput("data da reserva fora do intervalo suportado".into()))?;
        let now = self.clock.local_now(shop.utc_offset_minutes);
        let seat_count = self.check_window(&shop, start, end, now).await?;

        let booking = self
            .storage
            .insert_booking(
                NewBooking {
                    shop_id: shop.id,
                    user_id: ctx.user_id,
                    services,
                    total_duration_minutes: total_duration,
                    total_price,
                    start_at: start,
                    end_at: end,
                },
                &seat_preference(seat_count, None),
            )
            .await?;

        tracing::info!(
            "✂️ Reserva {} criada na loja {} (cadeira {}, {} - {})",
            booking.id,
            shop.id,
            booking.seat_number,
            booking.start_at,
            booking.end_at
        );
        Ok(booking.view(now))
    }

    pub async fn cancel(&self, ctx: &RequestContext, booking_id: Uuid) -> Result<BookingView, AppError> {
        let booking = self.load_booking(booking_id).await?;
        let shop = self.schedule.load_shop(booking.shop_id).await?;
        ensure_can_manage(ctx, &booking, &shop)?;

        let now = self.clock.local_now(shop.utc_offset_minutes);
        Self::ensure_mutable(&booking, now)?;

        let cancelled = self.storage.cancel_booking(booking_id).await?;
        tracing::info!("🗑️ Reserva {} cancelada por {}", booking_id, ctx.user_id);
        Ok(cancelled.view(now))
    }

    pub async fn reschedule(
        &self,
        ctx: &RequestContext,
        req: RescheduleRequest,
    ) -> Result<BookingView, AppError> {
        let booking = self.load_booking(req.booking_id).await?;
        let shop = self.schedule.load_shop(booking.shop_id).await?;
        ensure_can_manage(ctx, &booking, &shop)?;

        let now = self.clock.local_now(shop.utc_offset_minutes);
        Self::ensure_mutable(&booking, now)?;

        let start = req.date.and_time(req.new_start_time);
        let end = req.date.and_time(req.new_end_time);
        if end <= start {
            return Err(AppError::InvalidInput("newEndTime deve ser depois de newStartTime".into()));
        }
        if (end - start).num_minutes() != i64::from(booking.total_duration_minutes) {
            return Err(AppError::InvalidInput(format!(
                "o novo horário deve ter {} minutos",
                booking.total_duration_minutes
            )));
        }
        let seat_count = self.check_window(&shop, start, end, now).await?;

        let moved = self
            .storage
            .move_booking(
                booking.id,
                start,
                end,
                &seat_preference(seat_count, Some(booking.seat_number)),
            )
            .await?;

        tracing::info!(
            "🔁 Reserva {} remarcada para {} - {} (cadeira {})",
            moved.id,
            moved.start_at,
            moved.end_at,
            moved.seat_number
        );
        Ok(moved.view(now))
    }

    pub async fn get(&self, ctx: &RequestContext, booking_id: Uuid) -> Result<BookingView, AppError> {
        let booking = self.load_booking(booking_id).await?;
        let shop = self.schedule.load_shop(booking.shop_id).await?;
        ensure_can_manage(ctx, &booking, &shop)?;
        Ok(booking.view(self.clock.local_now(shop.utc_offset_minutes)))
    }

    /// Reservas do usuário, mais recentes primeiro.
    pub async fn list_mine(&self, ctx: &RequestContext) -> Result<Vec<BookingView>, AppError> {
        let bookings = self.storage.list_user_bookings(ctx.user_id).await?;

        let mut views = Vec::with_capacity(bookings.len());
        let mut offsets: HashMap<Uuid, i32> = HashMap::new();
        for booking in &bookings {
            let offset = match offsets.get(&booking.shop_id) {
                Some(offset) => *offset,
                None => {
                    let offset = self
                        .storage
                        .get_shop(booking.shop_id)
                        .await?
                        .map_or(0, |s| s.utc_offset_minutes);
                    offsets.insert(booking.shop_id, offset);
                    offset
                }
            };
            views.push(booking.view(self.clock.local_now(offset)));
        }
        Ok(views)
    }

    /// Agenda de uma cadeira no intervalo (só o dono da loja).
    pub async fn seat_agenda(
        &self,
        ctx: &RequestContext,
        shop_id: Uuid,
        seat_number: i32,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<BookingView>, AppError> {
        let shop = self.schedule.load_shop(shop_id).await?;
        ensure_owner(ctx, &shop)?;
        if end <= start {
            return Err(AppError::InvalidInput("'to' deve ser depois de 'from'".into()));
        }

        let now = self.clock.local_now(shop.utc_offset_minutes);
        let bookings = self
            .storage
            .find_overlapping(shop_id, seat_number, start, end, None)
            .await?;
        Ok(bookings.iter().map(|b| b.view(now)).collect())
    }
}
