// src/models/schedule.rs

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::common::time_fmt::{hhmm, hhmm_option};

/// Intervalo [start, end) dentro de um dia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    #[serde(rename = "from", with = "hhmm")]
    #[schema(value_type = String, example = "13:00")]
    pub start: NaiveTime,
    #[serde(rename = "to", with = "hhmm")]
    #[schema(value_type = String, example = "16:00")]
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    pub fn intersects(&self, start: NaiveTime, end: NaiveTime) -> bool {
        start < self.end && end > self.start
    }
}

// --- Exceção de agenda para um dia específico ---
// Se existir para (loja, data), substitui o padrão da loja por inteiro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleOverride {
    pub id: Uuid,
    pub shop_id: Uuid,
    #[schema(value_type = String, example = "2025-12-24")]
    pub date: NaiveDate,
    pub is_open: bool,
    #[serde(with = "hhmm_option")]
    #[schema(value_type = Option<String>, example = "10:00")]
    pub open_time: Option<NaiveTime>,
    #[serde(with = "hhmm_option")]
    #[schema(value_type = Option<String>, example = "14:00")]
    pub close_time: Option<NaiveTime>,
    pub seat_count: Option<i32>,
    #[serde(with = "hhmm_option")]
    #[schema(value_type = Option<String>)]
    pub closed_from: Option<NaiveTime>,
    #[serde(with = "hhmm_option")]
    #[schema(value_type = Option<String>)]
    pub closed_to: Option<NaiveTime>,
    #[schema(example = "Véspera de Natal")]
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ScheduleOverride {
    pub fn partial_closure(&self) -> Option<TimeWindow> {
        match (self.closed_from, self.closed_to) {
            (Some(from), Some(to)) => Some(TimeWindow::new(from, to)),
            _ => None,
        }
    }
}

/// Agenda efetiva de um dia, resultado do resolvedor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DaySchedule {
    #[schema(value_type = String, example = "2025-12-24")]
    pub date: NaiveDate,
    pub is_open: bool,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "10:00")]
    pub open_time: NaiveTime,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "20:00")]
    pub close_time: NaiveTime,
    pub seat_count: i32,
    pub partial_closure: Option<TimeWindow>,
}

impl DaySchedule {
    /// true se [start, end) cabe no expediente e não toca no fechamento parcial.
    pub fn accepts(&self, start: NaiveTime, end: NaiveTime) -> bool {
        self.is_open
            && start < end
            && start >= self.open_time
            && end <= self.close_time
            && !self
                .partial_closure
                .is_some_and(|closure| closure.intersects(start, end))
    }
}
