// src/services/slot_generator.rs

use chrono::{Duration, NaiveTime};

use crate::{
    common::error::AppError,
    models::{
        availability::Slot,
        schedule::{DaySchedule, TimeWindow},
    },
};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Sequência de horários candidatos de um dia.
///
/// Slots encostados (sem intervalo entre eles) de exatamente `duration`,
/// a partir da abertura, até `start + duration > fechamento`. Um slot que
/// encosta em qualquer parte do fechamento parcial é descartado inteiro.
///
/// É um iterador `Clone`: para "recomeçar", basta clonar antes de consumir.
#[derive(Debug, Clone)]
pub struct SlotIter {
    next_start: Option<NaiveTime>,
    close: NaiveTime,
    step: Duration,
    closure: Option<TimeWindow>,
}

impl Iterator for SlotIter {
    type Item = Slot;

    fn next(&mut self) -> Option<Slot> {
        loop {
            let start = self.next_start?;
            let (end, wrapped_secs) = start.overflowing_add_signed(self.step);

            // passou do fechamento (ou da meia-noite): acabou
            if wrapped_secs != 0 || end > self.close {
                self.next_start = None;
                return None;
            }
            self.next_start = Some(end);

            if self.closure.is_some_and(|c| c.intersects(start, end)) {
                continue;
            }
            return Some(Slot { start_time: start, end_time: end });
        }
    }
}

pub fn generate_slots(schedule: &DaySchedule, duration_minutes: i64) -> Result<SlotIter, AppError> {
    if duration_minutes <= 0 {
        return Err(AppError::InvalidInput(
            "a duração deve ser maior que zero".into(),
        ));
    }

    let fits = schedule.is_open
        && schedule.open_time < schedule.close_time
        && duration_minutes <= MINUTES_PER_DAY;

    Ok(SlotIter {
        next_start: fits.then_some(schedule.open_time),
        close: schedule.close_time,
        step: Duration::minutes(duration_minutes.min(MINUTES_PER_DAY)),
        closure: schedule.partial_closure,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day(open: NaiveTime, close: NaiveTime, closure: Option<TimeWindow>) -> DaySchedule {
        DaySchedule {
            date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
            is_open: true,
            open_time: open,
            close_time: close,
            seat_count: 1,
            partial_closure: closure,
        }
    }

    fn starts(iter: SlotIter) -> Vec<String> {
        iter.map(|s| s.start_time.format("%H:%M").to_string()).collect()
    }

    #[test]
    fn ten_hourly_slots_between_ten_and_twenty() {
        let slots: Vec<Slot> = generate_slots(&day(t(10, 0), t(20, 0), None), 60).unwrap().collect();
        assert_eq!(slots.len(), 10);
        assert_eq!(slots[0].start_time, t(10, 0));
        assert_eq!(slots[9].start_time, t(19, 0));
        assert_eq!(slots[9].end_time, t(20, 0));
    }

    #[test]
    fn partial_closure_drops_intersecting_slots() {
        let closure = TimeWindow::new(t(13, 0), t(16, 0));
        let iter = generate_slots(&day(t(10, 0), t(20, 0), Some(closure)), 60).unwrap();
        assert_eq!(
            starts(iter),
            vec!["10:00", "11:00", "12:00", "16:00", "17:00", "18:00", "19:00"]
        );
    }

    #[test]
    fn closure_drops_slot_that_only_partly_touches_it() {
        // 90 min: 13:00-14:30 e 14:30-16:00 tocam 14:00-15:00; 16:00-17:30 passa do fechamento
        let closure = TimeWindow::new(t(14, 0), t(15, 0));
        let iter = generate_slots(&day(t(10, 0), t(17, 0), Some(closure)), 90).unwrap();
        assert_eq!(starts(iter), vec!["10:00", "11:30"]);
    }

    #[test]
    fn slots_are_contiguous_and_exact_length() {
        for duration in [15_i64, 25, 45, 60, 75, 120] {
            let slots: Vec<Slot> =
                generate_slots(&day(t(9, 0), t(18, 30), None), duration).unwrap().collect();
            for pair in slots.windows(2) {
                assert_eq!(pair[0].end_time, pair[1].start_time);
            }
            for slot in &slots {
                assert_eq!((slot.end_time - slot.start_time).num_minutes(), duration);
                assert!(slot.end_time <= t(18, 30));
            }
        }
    }

    #[test]
    fn duration_longer_than_window_yields_nothing() {
        let iter = generate_slots(&day(t(10, 0), t(12, 0), None), 121).unwrap();
        assert_eq!(iter.count(), 0);
        let iter = generate_slots(&day(t(10, 0), t(12, 0), None), 10_000).unwrap();
        assert_eq!(iter.count(), 0);
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        assert!(matches!(
            generate_slots(&day(t(10, 0), t(12, 0), None), 0),
            Err(AppError::InvalidInput(_))
        ));
        assert!(generate_slots(&day(t(10, 0), t(12, 0), None), -30).is_err());
    }

    #[test]
    fn closed_or_inverted_window_is_empty() {
        let mut closed = day(t(10, 0), t(20, 0), None);
        closed.is_open = false;
        assert_eq!(generate_slots(&closed, 30).unwrap().count(), 0);
        assert_eq!(generate_slots(&day(t(20, 0), t(10, 0), None), 30).unwrap().count(), 0);
        assert_eq!(generate_slots(&day(t(10, 0), t(10, 0), None), 30).unwrap().count(), 0);
    }

    #[test]
    fn window_ending_at_midnight_edge_does_not_wrap() {
        let iter = generate_slots(&day(t(22, 0), t(23, 59), None), 60).unwrap();
        assert_eq!(starts(iter), vec!["22:00"]);
    }

    #[test]
    fn iterator_can_be_restarted_by_cloning() {
        let iter = generate_slots(&day(t(10, 0), t(13, 0), None), 60).unwrap();
        let again = iter.clone();
        assert_eq!(iter.collect::<Vec<_>>(), again.collect::<Vec<_>>());
    }
}
