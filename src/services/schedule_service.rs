// src/services/schedule_service.rs

use std::sync::Arc;

use chrono::{Days, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::Storage,
    models::{
        auth::RequestContext,
        schedule::{DaySchedule, ScheduleOverride, TimeWindow},
        shop::Shop,
    },
    services::shop_service::ensure_owner,
};

// Maior intervalo aceito num único pedido de exceção (date..=end_date)
pub const MAX_OVERRIDE_RANGE_DAYS: u64 = 366;

/// Agenda efetiva de (loja, data).
///
/// Com exceção cadastrada, ela substitui o padrão inteiro (sem misturar
/// campos). Sem exceção, vale o padrão da loja, aberta e sem fechamento
/// parcial.
pub fn resolve_day(shop: &Shop, date: NaiveDate, entry: Option<&ScheduleOverride>) -> DaySchedule {
    let Some(entry) = entry else {
        return DaySchedule {
            date,
            is_open: true,
            open_time: shop.open_time,
            close_time: shop.close_time,
            seat_count: shop.seat_count,
            partial_closure: None,
        };
    };

    match (entry.is_open, entry.open_time, entry.close_time, entry.seat_count) {
        (true, Some(open_time), Some(close_time), Some(seat_count)) => DaySchedule {
            date,
            is_open: true,
            open_time,
            close_time,
            seat_count,
            partial_closure: entry.partial_closure(),
        },
        (true, ..) => {
            // a validação de escrita não deixa isso acontecer; na dúvida, fechado
            tracing::warn!("Exceção {} aberta sem horário completo, tratando como fechado", entry.id);
            closed_day(date)
        }
        (false, ..) => closed_day(date),
    }
}

fn closed_day(date: NaiveDate) -> DaySchedule {
    DaySchedule {
        date,
        is_open: false,
        open_time: NaiveTime::MIN,
        close_time: NaiveTime::MIN,
        seat_count: 0,
        partial_closure: None,
    }
}

/// Pedido de exceção vindo do app (um dia ou um intervalo).
#[derive(Debug, Clone)]
pub struct OverrideRequest {
    pub shop_id: Uuid,
    pub date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub is_open: bool,
    pub open_time: Option<NaiveTime>,
    pub close_time: Option<NaiveTime>,
    pub seat_count: Option<i32>,
    pub closure: Option<TimeWindow>,
    pub reason: Option<String>,
}

impl OverrideRequest {
    fn validate(&self) -> Result<(), AppError> {
        if let Some(end) = self.end_date {
            if end < self.date {
                return Err(AppError::InvalidInput("endDate anterior a date".into()));
            }
            if (end - self.date).num_days() as u64 >= MAX_OVERRIDE_RANGE_DAYS {
                return Err(AppError::InvalidInput(format!(
                    "intervalo máximo de {} dias",
                    MAX_OVERRIDE_RANGE_DAYS
                )));
            }
        }

        if !self.is_open {
            // Dia fechado não carrega horário, cadeiras nem fechamento parcial
            if self.open_time.is_some()
                || self.close_time.is_some()
                || self.seat_count.is_some()
                || self.closure.is_some()
            {
                return Err(AppError::InvalidInput(
                    "dia fechado não aceita horário, cadeiras ou fechamento parcial".into(),
                ));
            }
            return Ok(());
        }

        let (Some(open), Some(close), Some(seats)) = (self.open_time, self.close_time, self.seat_count)
        else {
            return Err(AppError::InvalidInput(
                "dia aberto exige openTime, closeTime e seatCount".into(),
            ));
        };
        if open >= close {
            return Err(AppError::InvalidInput(
                "o horário de abertura deve ser antes do fechamento".into(),
            ));
        }
        if seats < 0 {
            return Err(AppError::InvalidInput("o número de cadeiras não pode ser negativo".into()));
        }
        if let Some(closure) = self.closure {
            if closure.start >= closure.end {
                return Err(AppError::InvalidInput("fechamento parcial com from >= to".into()));
            }
            if closure.start < open || closure.end > close {
                return Err(AppError::InvalidInput(
                    "fechamento parcial fora do horário de funcionamento".into(),
                ));
            }
        }
        Ok(())
    }

    /// Um registro por dia do intervalo (expandido na escrita, não na leitura).
    fn expand(&self) -> Vec<ScheduleOverride> {
        let last = self.end_date.unwrap_or(self.date);
        let created_at = Utc::now();
        self.date
            .iter_days()
            .take_while(|d| *d <= last)
            .map(|date| ScheduleOverride {
                id: Uuid::new_v4(),
                shop_id: self.shop_id,
                date,
                is_open: self.is_open,
                open_time: self.open_time,
                close_time: self.close_time,
                seat_count: self.seat_count,
                closed_from: self.closure.map(|c| c.start),
                closed_to: self.closure.map(|c| c.end),
                reason: self.reason.clone(),
                created_at,
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct ScheduleService {
    storage: Arc<dyn Storage>,
}

impl ScheduleService {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn load_shop(&self, shop_id: Uuid) -> Result<Shop, AppError> {
        self.storage
            .get_shop(shop_id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound(format!("Loja {}", shop_id)))
    }

    pub async fn resolve_day(&self, shop_id: Uuid, date: NaiveDate) -> Result<DaySchedule, AppError> {
        let shop = self.load_shop(shop_id).await?;
        self.resolve_for_shop(&shop, date).await
    }

    pub async fn resolve_for_shop(&self, shop: &Shop, date: NaiveDate) -> Result<DaySchedule, AppError> {
        let entry = self.storage.find_override(shop.id, date).await?;
        Ok(resolve_day(shop, date, entry.as_ref()))
    }

    /// Agenda de vários dias com uma única leitura de exceções.
    pub async fn resolve_range(
        &self,
        shop: &Shop,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DaySchedule>, AppError> {
        let overrides = self.storage.list_overrides(shop.id, from, to).await?;
        Ok(from
            .iter_days()
            .take_while(|d| *d <= to)
            .map(|date| resolve_day(shop, date, overrides.iter().find(|o| o.date == date)))
            .collect())
    }

    pub async fn set_override(
        &self,
        ctx: &RequestContext,
        req: OverrideRequest,
    ) -> Result<Vec<ScheduleOverride>, AppError> {
        let shop = self.load_shop(req.shop_id).await?;
        ensure_owner(ctx, &shop)?;
        req.validate()?;

        let saved = self.storage.upsert_overrides(req.expand()).await?;
        tracing::info!(
            "📅 {} exceção(ões) de agenda gravada(s) para a loja {} a partir de {}",
            saved.len(),
            shop.id,
            req.date
        );
        Ok(saved)
    }

    pub async fn list_overrides(
        &self,
        shop_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<ScheduleOverride>, AppError> {
        if to < from {
            return Err(AppError::InvalidInput("'to' anterior a 'from'".into()));
        }
        self.load_shop(shop_id).await?;
        self.storage.list_overrides(shop_id, from, to).await
    }

    pub async fn delete_override(
        &self,
        ctx: &RequestContext,
        shop_id: Uuid,
        override_id: Uuid,
    ) -> Result<(), AppError> {
        let shop = self.load_shop(shop_id).await?;
        ensure_owner(ctx, &shop)?;
        if !self.storage.delete_override(shop_id, override_id).await? {
            return Err(AppError::ResourceNotFound(format!("Exceção {}", override_id)));
        }
        Ok(())
    }
}

// Última data de um intervalo de `days` dias a partir de `from`.
pub fn range_end(from: NaiveDate, days: u32) -> NaiveDate {
    from.checked_add_days(Days::new(u64::from(days.max(1) - 1)))
        .unwrap_or(NaiveDate::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::InMemoryStorage,
        models::{auth::Role, shop::NewShop},
    };

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2030, 6, day).unwrap()
    }

    async fn setup() -> (ScheduleService, Shop, RequestContext) {
        let storage = Arc::new(InMemoryStorage::new());
        let ctx = RequestContext { user_id: Uuid::new_v4(), role: Role::ShopOwner };
        let shop = storage
            .create_shop(NewShop {
                owner_id: ctx.user_id,
                name: "Salão".into(),
                address: None,
                open_time: t(10),
                close_time: t(20),
                seat_count: 2,
                utc_offset_minutes: 0,
            })
            .await
            .unwrap();
        (ScheduleService::new(storage), shop, ctx)
    }

    fn open_req(shop_id: Uuid, date: NaiveDate) -> OverrideRequest {
        OverrideRequest {
            shop_id,
            date,
            end_date: None,
            is_open: true,
            open_time: Some(t(12)),
            close_time: Some(t(18)),
            seat_count: Some(1),
            closure: None,
            reason: None,
        }
    }

    fn closed_req(shop_id: Uuid, date: NaiveDate) -> OverrideRequest {
        OverrideRequest {
            is_open: false,
            open_time: None,
            close_time: None,
            seat_count: None,
            ..open_req(shop_id, date)
        }
    }

    #[tokio::test]
    async fn no_override_returns_shop_defaults() {
        let (service, shop, _) = setup().await;
        let day = service.resolve_day(shop.id, d(3)).await.unwrap();
        assert!(day.is_open);
        assert_eq!((day.open_time, day.close_time, day.seat_count), (t(10), t(20), 2));
        assert_eq!(day.partial_closure, None);
    }

    #[tokio::test]
    async fn override_replaces_defaults_without_merging() {
        let (service, shop, ctx) = setup().await;
        service.set_override(&ctx, open_req(shop.id, d(3))).await.unwrap();

        let day = service.resolve_day(shop.id, d(3)).await.unwrap();
        assert_eq!((day.open_time, day.close_time, day.seat_count), (t(12), t(18), 1));
        // o dia seguinte continua no padrão
        assert_eq!(service.resolve_day(shop.id, d(4)).await.unwrap().seat_count, 2);
    }

    #[tokio::test]
    async fn range_is_expanded_one_record_per_day() {
        let (service, shop, ctx) = setup().await;
        let mut req = closed_req(shop.id, d(10));
        req.end_date = Some(d(14));
        let saved = service.set_override(&ctx, req).await.unwrap();
        assert_eq!(saved.len(), 5);

        let days = service.resolve_range(&shop, d(9), d(15)).await.unwrap();
        let open: Vec<bool> = days.iter().map(|day| day.is_open).collect();
        assert_eq!(open, vec![true, false, false, false, false, false, true]);
    }

    #[tokio::test]
    async fn rewriting_a_date_replaces_previous_override() {
        let (service, shop, ctx) = setup().await;
        service.set_override(&ctx, closed_req(shop.id, d(3))).await.unwrap();
        service.set_override(&ctx, open_req(shop.id, d(3))).await.unwrap();

        let list = service.list_overrides(shop.id, d(1), d(30)).await.unwrap();
        assert_eq!(list.len(), 1);
        assert!(list[0].is_open);
    }

    #[tokio::test]
    async fn closed_day_rejects_hours() {
        let (service, shop, ctx) = setup().await;
        let mut req = closed_req(shop.id, d(3));
        req.seat_count = Some(2);
        assert!(matches!(
            service.set_override(&ctx, req).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn closure_must_sit_inside_opening_hours() {
        let (service, shop, ctx) = setup().await;
        let mut req = open_req(shop.id, d(3));
        req.closure = Some(TimeWindow::new(t(11), t(13)));
        assert!(service.set_override(&ctx, req.clone()).await.is_err());

        req.closure = Some(TimeWindow::new(t(15), t(14)));
        assert!(service.set_override(&ctx, req.clone()).await.is_err());

        req.closure = Some(TimeWindow::new(t(13), t(16)));
        service.set_override(&ctx, req).await.unwrap();
        let day = service.resolve_day(shop.id, d(3)).await.unwrap();
        assert_eq!(day.partial_closure, Some(TimeWindow::new(t(13), t(16))));
    }

    #[tokio::test]
    async fn open_day_requires_complete_hours() {
        let (service, shop, ctx) = setup().await;
        let mut req = open_req(shop.id, d(3));
        req.seat_count = None;
        assert!(matches!(
            service.set_override(&ctx, req).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn only_owner_writes_overrides() {
        let (service, shop, _) = setup().await;
        let stranger = RequestContext { user_id: Uuid::new_v4(), role: Role::ShopOwner };
        assert!(matches!(
            service.set_override(&stranger, closed_req(shop.id, d(3))).await,
            Err(AppError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn unknown_shop_is_not_found() {
        let (service, _, _) = setup().await;
        assert!(matches!(
            service.resolve_day(Uuid::new_v4(), d(3)).await,
            Err(AppError::ResourceNotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_restores_defaults() {
        let (service, shop, ctx) = setup().await;
        let saved = service.set_override(&ctx, closed_req(shop.id, d(3))).await.unwrap();
        service.delete_override(&ctx, shop.id, saved[0].id).await.unwrap();
        assert!(service.resolve_day(shop.id, d(3)).await.unwrap().is_open);
        assert!(matches!(
            service.delete_override(&ctx, shop.id, saved[0].id).await,
            Err(AppError::ResourceNotFound(_))
        ));
    }

    #[test]
    fn range_end_counts_inclusive_days() {
        assert_eq!(range_end(d(1), 7), d(7));
        assert_eq!(range_end(d(1), 1), d(1));
        assert_eq!(range_end(d(1), 0), d(1));
    }
}
