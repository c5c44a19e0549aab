// src/services/availability_service.rs

use std::{collections::HashMap, sync::Arc};

use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use uuid::Uuid;

use crate::{
    common::{clock::Clock, error::AppError},
    db::Storage,
    models::{
        availability::{AvailableSlots, Slot},
        booking::Booking,
        schedule::DaySchedule,
    },
    services::{
        schedule_service::{range_end, ScheduleService},
        slot_generator::generate_slots,
    },
};

// Maior intervalo que o app pode pedir de uma vez
pub const MAX_RANGE_DAYS: i64 = 62;

/// Horários livres de um dia.
///
/// `bookings` são as reservas ativas do dia (qualquer cadeira). Um slot está
/// livre se pelo menos uma cadeira 1..=seat_count não tem reserva sobreposta.
/// Reservas em cadeiras acima do número do dia (exceção reduziu cadeiras)
/// são ignoradas. `not_before` corta os horários que já passaram hoje.
pub fn free_slots(
    schedule: &DaySchedule,
    duration_minutes: i64,
    bookings: &[&Booking],
    not_before: Option<NaiveTime>,
) -> Result<Vec<Slot>, AppError> {
    let candidates = generate_slots(schedule, duration_minutes)?;
    let seat_count = usize::try_from(schedule.seat_count).unwrap_or(0);

    // Partição por cadeira em memória (índice = cadeira - 1)
    let mut by_seat: Vec<Vec<&Booking>> = vec![Vec::new(); seat_count];
    for booking in bookings {
        let Ok(index) = usize::try_from(booking.seat_number - 1) else {
            continue;
        };
        if let Some(seat) = by_seat.get_mut(index) {
            seat.push(booking);
        }
    }

    let date = schedule.date;
    let mut free: Vec<Slot> = candidates
        .filter(|slot| not_before.is_none_or(|limit| slot.start_time >= limit))
        .filter(|slot| {
            let start = date.and_time(slot.start_time);
            let end = date.and_time(slot.end_time);
            by_seat
                .iter()
                .any(|seat| !seat.iter().any(|b| b.overlaps(start, end)))
        })
        .collect();

    free.dedup_by_key(|slot| slot.start_time);
    Ok(free)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

#[derive(Clone)]
pub struct AvailabilityService {
    storage: Arc<dyn Storage>,
    clock: Arc<dyn Clock>,
    schedule: ScheduleService,
    window_days: u32,
}

impl AvailabilityService {
    pub fn new(
        storage: Arc<dyn Storage>,
        clock: Arc<dyn Clock>,
        schedule: ScheduleService,
        window_days: u32,
    ) -> Self {
        Self { storage, clock, schedule, window_days }
    }

    fn resolve_range(&self, today: NaiveDate, range: DateRange) -> Result<(NaiveDate, NaiveDate), AppError> {
        let from = range.from.unwrap_or(today);
        let to = range.to.unwrap_or_else(|| range_end(from, self.window_days));
        if to < from {
            return Err(AppError::InvalidInput("'to' anterior a 'from'".into()));
        }
        if (to - from).num_days() >= MAX_RANGE_DAYS {
            return Err(AppError::InvalidInput(format!(
                "intervalo máximo de {} dias",
                MAX_RANGE_DAYS
            )));
        }
        Ok((from, to))
    }

    /// Mapa data → horários livres para um serviço de `duration_minutes`.
    ///
    /// Loja inexistente devolve mapa vazio (o app mostra "sem horários").
    pub async fn get_available_slots(
        &self,
        shop_id: Uuid,
        duration_minutes: i64,
        range: DateRange,
    ) -> Result<AvailableSlots, AppError> {
        if duration_minutes <= 0 {
            return Err(AppError::InvalidInput("a duração deve ser maior que zero".into()));
        }

        let Some(shop) = self.storage.get_shop(shop_id).await? else {
            tracing::warn!("Horários pedidos para loja inexistente {}", shop_id);
            return Ok(AvailableSlots::default());
        };

        let now = self.clock.local_now(shop.utc_offset_minutes);
        let today = now.date();
        let (from, to) = self.resolve_range(today, range)?;

        let days = self.schedule.resolve_range(&shop, from, to).await?;

        // Uma única leitura do ledger para o período inteiro
        let range_start = from.and_time(NaiveTime::MIN);
        let range_stop = to
            .checked_add_days(Days::new(1))
            .map(|d| d.and_time(NaiveTime::MIN))
            .unwrap_or(NaiveDateTime::MAX);
        let bookings = self
            .storage
            .list_active_bookings(shop.id, range_start, range_stop)
            .await?;

        let mut by_date: HashMap<NaiveDate, Vec<&Booking>> = HashMap::new();
        for booking in &bookings {
            by_date.entry(booking.start_at.date()).or_default().push(booking);
        }

        let mut result = AvailableSlots::default();
        for day in days {
            if day.date < today {
                result.results.insert(day.date, Vec::new());
                continue;
            }
            let not_before = (day.date == today).then(|| now.time());
            let day_bookings = by_date.get(&day.date).map(Vec::as_slice).unwrap_or(&[]);
            let slots = free_slots(&day, duration_minutes, day_bookings, not_before)?;

            if slots.is_empty() {
                tracing::debug!(
                    "Sem horários em {} para a loja {}: {}",
                    day.date,
                    shop.id,
                    empty_reason(&day, duration_minutes, not_before)
                );
            }
            result.results.insert(day.date, slots);
        }

        Ok(result)
    }
}

// Só para diagnóstico; o contrato devolve lista vazia em todos os casos.
fn empty_reason(day: &DaySchedule, duration_minutes: i64, not_before: Option<NaiveTime>) -> &'static str {
    if !day.is_open {
        "fechado"
    } else if day.seat_count == 0 {
        "sem cadeiras"
    } else if (day.close_time - day.open_time).num_minutes() < duration_minutes {
        "duração maior que o expediente"
    } else if not_before.is_some_and(|limit| limit >= day.close_time) {
        "expediente já encerrado"
    } else {
        "lotado"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::clock::FixedClock,
        db::InMemoryStorage,
        models::{
            auth::Role,
            booking::{BookedService, NewBooking},
            schedule::TimeWindow,
            shop::{NewShop, Shop},
        },
        services::schedule_service::OverrideRequest,
    };
    use crate::models::auth::RequestContext;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    // "Hoje" nos testes é 2030-06-10, 08:00 (UTC, loja sem offset)
    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 6, 10).unwrap()
    }

    fn tomorrow() -> NaiveDate {
        today().succ_opt().unwrap()
    }

    struct Fixture {
        storage: Arc<InMemoryStorage>,
        service: AvailabilityService,
        schedule: ScheduleService,
        shop: Shop,
        owner: RequestContext,
    }

    async fn fixture(seats: i32, hour_now: u32) -> Fixture {
        let storage = Arc::new(InMemoryStorage::new());
        let owner = RequestContext { user_id: Uuid::new_v4(), role: Role::ShopOwner };
        let shop = storage
            .create_shop(NewShop {
                owner_id: owner.user_id,
                name: "Salão".into(),
                address: None,
                open_time: t(10, 0),
                close_time: t(20, 0),
                seat_count: seats,
                utc_offset_minutes: 0,
            })
            .await
            .unwrap();
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2030, 6, 10, hour_now, 0, 0).unwrap()));
        let schedule = ScheduleService::new(storage.clone());
        let service = AvailabilityService::new(storage.clone(), clock, schedule.clone(), 7);
        Fixture { storage, service, schedule, shop, owner }
    }

    async fn book(storage: &InMemoryStorage, shop_id: Uuid, date: NaiveDate, from: NaiveTime, to: NaiveTime, seats: &[i32]) -> Booking {
        let start = date.and_time(from);
        let end = date.and_time(to);
        storage
            .insert_booking(
                NewBooking {
                    shop_id,
                    user_id: Uuid::new_v4(),
                    services: vec![BookedService {
                        service_id: Uuid::new_v4(),
                        name: "Corte".into(),
                        price: Decimal::ZERO,
                        duration_minutes: (end - start).num_minutes() as i32,
                    }],
                    total_duration_minutes: (end - start).num_minutes() as i32,
                    total_price: Decimal::ZERO,
                    start_at: start,
                    end_at: end,
                },
                seats,
            )
            .await
            .unwrap()
    }

    fn only(date: NaiveDate) -> DateRange {
        DateRange { from: Some(date), to: Some(date) }
    }

    fn starts(slots: &[Slot]) -> Vec<String> {
        slots.iter().map(|s| s.start_time.format("%H:%M").to_string()).collect()
    }

    #[tokio::test]
    async fn empty_shop_offers_every_hour() {
        let f = fixture(1, 8).await;
        let res = f.service.get_available_slots(f.shop.id, 60, only(tomorrow())).await.unwrap();
        let slots = &res.results[&tomorrow()];
        assert_eq!(slots.len(), 10);
        assert_eq!(starts(slots).first().map(String::as_str), Some("10:00"));
        assert_eq!(starts(slots).last().map(String::as_str), Some("19:00"));
    }

    #[tokio::test]
    async fn partial_closure_removes_afternoon_slots() {
        let f = fixture(1, 8).await;
        f.schedule
            .set_override(
                &f.owner,
                OverrideRequest {
                    shop_id: f.shop.id,
                    date: tomorrow(),
                    end_date: None,
                    is_open: true,
                    open_time: Some(t(10, 0)),
                    close_time: Some(t(20, 0)),
                    seat_count: Some(1),
                    closure: Some(TimeWindow::new(t(13, 0), t(16, 0))),
                    reason: Some("Reunião".into()),
                },
            )
            .await
            .unwrap();

        let res = f.service.get_available_slots(f.shop.id, 60, only(tomorrow())).await.unwrap();
        assert_eq!(
            starts(&res.results[&tomorrow()]),
            vec!["10:00", "11:00", "12:00", "16:00", "17:00", "18:00", "19:00"]
        );
    }

    #[tokio::test]
    async fn booked_hour_on_single_seat_is_excluded() {
        let f = fixture(1, 8).await;
        book(&f.storage, f.shop.id, tomorrow(), t(14, 0), t(15, 0), &[1]).await;

        let res = f.service.get_available_slots(f.shop.id, 60, only(tomorrow())).await.unwrap();
        let slots = starts(&res.results[&tomorrow()]);
        assert_eq!(slots.len(), 9);
        assert!(!slots.contains(&"14:00".to_string()));
    }

    #[tokio::test]
    async fn slot_disappears_only_when_every_seat_is_taken() {
        let f = fixture(2, 8).await;
        let first = book(&f.storage, f.shop.id, tomorrow(), t(11, 0), t(12, 0), &[1, 2]).await;
        let res = f.service.get_available_slots(f.shop.id, 60, only(tomorrow())).await.unwrap();
        assert!(starts(&res.results[&tomorrow()]).contains(&"11:00".to_string()));

        book(&f.storage, f.shop.id, tomorrow(), t(11, 0), t(12, 0), &[1, 2]).await;
        let res = f.service.get_available_slots(f.shop.id, 60, only(tomorrow())).await.unwrap();
        assert!(!starts(&res.results[&tomorrow()]).contains(&"11:00".to_string()));

        // liberar uma cadeira faz o horário voltar
        f.storage.cancel_booking(first.id).await.unwrap();
        let res = f.service.get_available_slots(f.shop.id, 60, only(tomorrow())).await.unwrap();
        assert!(starts(&res.results[&tomorrow()]).contains(&"11:00".to_string()));
    }

    #[tokio::test]
    async fn closed_day_is_present_but_empty() {
        let f = fixture(1, 8).await;
        f.schedule
            .set_override(
                &f.owner,
                OverrideRequest {
                    shop_id: f.shop.id,
                    date: tomorrow(),
                    end_date: None,
                    is_open: false,
                    open_time: None,
                    close_time: None,
                    seat_count: None,
                    closure: None,
                    reason: Some("Feriado".into()),
                },
            )
            .await
            .unwrap();
        let res = f.service.get_available_slots(f.shop.id, 30, only(tomorrow())).await.unwrap();
        assert_eq!(res.results.get(&tomorrow()), Some(&Vec::new()));
    }

    #[tokio::test]
    async fn past_slots_of_today_are_hidden() {
        let f = fixture(1, 15).await;
        let res = f.service.get_available_slots(f.shop.id, 60, only(today())).await.unwrap();
        assert_eq!(starts(&res.results[&today()]), vec!["15:00", "16:00", "17:00", "18:00", "19:00"]);
    }

    #[tokio::test]
    async fn default_window_covers_configured_days() {
        let f = fixture(1, 8).await;
        let res = f.service.get_available_slots(f.shop.id, 60, DateRange::default()).await.unwrap();
        assert_eq!(res.results.len(), 7);
        assert_eq!(res.results.keys().next(), Some(&today()));
    }

    #[tokio::test]
    async fn too_long_duration_is_empty_not_an_error() {
        let f = fixture(1, 8).await;
        let res = f.service.get_available_slots(f.shop.id, 11 * 60, DateRange::default()).await.unwrap();
        assert!(res.results.values().all(Vec::is_empty));
    }

    #[tokio::test]
    async fn unknown_shop_yields_empty_map() {
        let f = fixture(1, 8).await;
        let res = f.service.get_available_slots(Uuid::new_v4(), 60, DateRange::default()).await.unwrap();
        assert!(res.results.is_empty());
    }

    #[tokio::test]
    async fn reads_are_idempotent() {
        let f = fixture(2, 8).await;
        book(&f.storage, f.shop.id, tomorrow(), t(10, 0), t(11, 30), &[1, 2]).await;
        let a = f.service.get_available_slots(f.shop.id, 45, DateRange::default()).await.unwrap();
        let b = f.service.get_available_slots(f.shop.id, 45, DateRange::default()).await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected() {
        let f = fixture(1, 8).await;
        assert!(matches!(
            f.service.get_available_slots(f.shop.id, 0, DateRange::default()).await,
            Err(AppError::InvalidInput(_))
        ));
        let inverted = DateRange { from: Some(tomorrow()), to: Some(today()) };
        assert!(f.service.get_available_slots(f.shop.id, 60, inverted).await.is_err());
        let huge = DateRange { from: Some(today()), to: Some(today() + chrono::Duration::days(90)) };
        assert!(f.service.get_available_slots(f.shop.id, 60, huge).await.is_err());
    }

    #[test]
    fn bookings_on_seats_beyond_the_day_count_are_ignored() {
        let schedule = DaySchedule {
            date: tomorrow(),
            is_open: true,
            open_time: t(10, 0),
            close_time: t(12, 0),
            seat_count: 1,
            partial_closure: None,
        };
        let ghost = Booking {
            id: Uuid::new_v4(),
            shop_id: Uuid::nil(),
            user_id: Uuid::nil(),
            seat_number: 2,
            services: sqlx::types::Json(vec![]),
            total_duration_minutes: 120,
            total_price: Decimal::ZERO,
            start_at: tomorrow().and_time(t(10, 0)),
            end_at: tomorrow().and_time(t(12, 0)),
            status: crate::models::booking::BookingStatus::Booked,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let slots = free_slots(&schedule, 60, &[&ghost], None).unwrap();
        assert_eq!(slots.len(), 2);

        let no_seats = DaySchedule { seat_count: 0, ..schedule };
        assert!(free_slots(&no_seats, 60, &[], None).unwrap().is_empty());
    }
}
