// src/common/clock.rs

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};

// Fonte do "agora". Os serviços nunca chamam Utc::now() direto,
// assim os testes conseguem congelar o relógio.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Horário de parede da loja (offset fixo em minutos).
    fn local_now(&self, utc_offset_minutes: i32) -> NaiveDateTime {
        let offset = FixedOffset::east_opt(utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix());
        self.now().with_timezone(&offset).naive_local()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
