//! The fixed placement-week calendar and the deterministic slot search.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::config::{ConfigError, ScheduleConfig};

use super::domain::Company;

/// Raised once every slot in the window is booked for the company or
/// conflicts with the student's own calendar.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("no interview slot available inside the placement window")]
    NoSlotAvailable,
}

/// The materialized slot grid: `window_days` consecutive calendar days, each
/// offering `slots_per_day` slots of `slot_minutes` starting at `day_start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleWindow {
    days: Vec<NaiveDate>,
    day_start: chrono::NaiveTime,
    slot_minutes: u32,
    slots_per_day: u32,
}

impl ScheduleWindow {
    pub fn new(config: &ScheduleConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let days = (0..config.window_days)
            .map(|offset| config.window_start + Duration::days(i64::from(offset)))
            .collect();
        Ok(Self {
            days,
            day_start: config.day_start,
            slot_minutes: config.slot_minutes,
            slots_per_day: config.slots_per_day(),
        })
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    /// Every slot timestamp in fixed calendar order: days first, then slot
    /// indices within the day. The search relies on this order being stable.
    pub fn slots(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.days.iter().flat_map(move |day| {
            let base = day.and_time(self.day_start);
            (0..self.slots_per_day).map(move |index| {
                base + Duration::minutes(i64::from(index) * i64::from(self.slot_minutes))
            })
        })
    }

    /// Total slots one company can host across the window.
    pub fn capacity_per_company(&self) -> usize {
        self.days.len() * self.slots_per_day as usize
    }

    /// Whether a timestamp falls inside the window's bookable range.
    pub fn contains(&self, date_time: NaiveDateTime) -> bool {
        let day = date_time.date();
        if !self.days.contains(&day) {
            return false;
        }
        let start = day.and_time(self.day_start);
        let end = start
            + Duration::minutes(i64::from(self.slots_per_day) * i64::from(self.slot_minutes));
        date_time >= start && date_time < end
    }
}

/// Deterministic, earliest-first search over the slot grid. Performs no
/// locking of its own: callers must already hold the company's aggregate
/// lock so the interview written for the returned slot is visible before a
/// concurrent search can run.
#[derive(Debug, Clone)]
pub struct SlotFinder {
    window: ScheduleWindow,
}

impl SlotFinder {
    pub fn new(window: ScheduleWindow) -> Self {
        Self { window }
    }

    pub fn window(&self) -> &ScheduleWindow {
        &self.window
    }

    /// One room per company for the whole window, named after the company.
    pub fn room_for(company: &Company) -> String {
        format!("Room {}", company.name)
    }

    /// First slot free for both calendars, in fixed grid order.
    pub fn find(
        &self,
        company_busy: &HashSet<NaiveDateTime>,
        student_busy: &HashSet<NaiveDateTime>,
    ) -> Result<NaiveDateTime, SlotError> {
        self.window
            .slots()
            .find(|slot| !company_busy.contains(slot) && !student_busy.contains(slot))
            .ok_or(SlotError::NoSlotAvailable)
    }
}
