//! Fixed local-time report schedule (§4.7): daily 09:00, Monday 08:00,
//! Friday 10:00. `due_slots` is evaluated every `reportGenerationInterval`
//! and returns which slots have become overdue since they last fired.

use chrono::{DateTime, Datelike, Local, Timelike, Weekday};

use crate::types::ReportType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSlot {
    pub report_type: ReportType,
    pub weekday: Option<Weekday>,
    pub hour: u32,
    pub minute: u32,
}

pub const SLOTS: &[ScheduleSlot] = &[
    ScheduleSlot { report_type: ReportType::DailySummary, weekday: None, hour: 9, minute: 0 },
    ScheduleSlot { report_type: ReportType::PerformanceReport, weekday: Some(Weekday::Mon), hour: 8, minute: 0 },
    ScheduleSlot { report_type: ReportType::LearningInsights, weekday: Some(Weekday::Fri), hour: 10, minute: 0 },
];

impl ScheduleSlot {
    fn matches_day(&self, now: &DateTime<Local>) -> bool {
        self.weekday.map_or(true, |wd| now.weekday() == wd)
    }

    /// True when `now` is at or past this slot's time-of-day for the
    /// matching day, and `last_fired` was before that same occurrence.
    fn is_due(&self, now: &DateTime<Local>, last_fired: Option<DateTime<Local>>) -> bool {
        if !self.matches_day(now) {
            return false;
        }
        let slot_today = now
            .date_naive()
            .and_hms_opt(self.hour, self.minute, 0)
            .expect("valid slot time");
        let slot_today = slot_today.and_local_timezone(Local).single();
        let Some(slot_today) = slot_today else {
            return false;
        };
        if *now < slot_today {
            return false;
        }
        last_fired.map_or(true, |last| last < slot_today)
    }
}

/// Returns the slots due to fire given the current time and each slot's
/// last-fired timestamp (indexed by position in `SLOTS`).
pub fn due_slots(now: DateTime<Local>, last_fired: &[Option<DateTime<Local>>]) -> Vec<usize> {
    SLOTS
        .iter()
        .enumerate()
        .filter(|(idx, slot)| {
            let last = last_fired.get(*idx).copied().flatten();
            slot.is_due(&now, last)
        })
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn daily_slot_is_due_after_nine_am_if_never_fired() {
        let now = Local.with_ymd_and_hms(2026, 7, 27, 9, 5, 0).unwrap();
        let due = due_slots(now, &[]);
        assert!(due.contains(&0));
    }

    #[test]
    fn daily_slot_is_not_due_twice_same_day() {
        let now = Local.with_ymd_and_hms(2026, 7, 27, 9, 5, 0).unwrap();
        let last_fired = vec![Some(now)];
        let later = Local.with_ymd_and_hms(2026, 7, 27, 9, 30, 0).unwrap();
        let due = due_slots(later, &last_fired);
        assert!(!due.contains(&0));
    }
}
