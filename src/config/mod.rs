use std::env;
use std::fmt;

use chrono::{NaiveDate, NaiveTime};

/// Top-level configuration for the placement engine.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub schedule: ScheduleConfig,
    pub policy: PlacementPolicy,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let schedule = ScheduleConfig {
            window_start: parse_var("APP_WINDOW_START", ScheduleConfig::DEFAULT_WINDOW_START)?,
            window_days: parse_var("APP_WINDOW_DAYS", ScheduleConfig::DEFAULT_WINDOW_DAYS)?,
            day_start: parse_time("APP_DAY_START", ScheduleConfig::DEFAULT_DAY_START)?,
            day_end: parse_time("APP_DAY_END", ScheduleConfig::DEFAULT_DAY_END)?,
            slot_minutes: parse_var("APP_SLOT_MINUTES", ScheduleConfig::DEFAULT_SLOT_MINUTES)?,
        };
        schedule.validate()?;

        let policy = PlacementPolicy {
            initial_tokens: parse_var("APP_INITIAL_TOKENS", PlacementPolicy::DEFAULT_INITIAL_TOKENS)?,
            invitation_headroom: parse_var(
                "APP_INVITE_HEADROOM",
                PlacementPolicy::DEFAULT_INVITATION_HEADROOM,
            )?,
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            schedule,
            policy,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// The placement-drive calendar: which days interviews run on, the daily
/// bounds, and the slot granularity. One interview room per company for the
/// whole window, so rooms never contend across companies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub window_start: NaiveDate,
    pub window_days: u32,
    pub day_start: NaiveTime,
    pub day_end: NaiveTime,
    pub slot_minutes: u32,
}

impl ScheduleConfig {
    const DEFAULT_WINDOW_START: &'static str = "2026-02-15";
    const DEFAULT_WINDOW_DAYS: &'static str = "5";
    const DEFAULT_DAY_START: &'static str = "08:00";
    const DEFAULT_DAY_END: &'static str = "12:00";
    const DEFAULT_SLOT_MINUTES: &'static str = "20";

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_days == 0 {
            return Err(ConfigError::EmptyWindow);
        }
        if self.slot_minutes == 0 {
            return Err(ConfigError::ZeroSlotDuration);
        }
        if self.day_end <= self.day_start {
            return Err(ConfigError::InvertedDayBounds {
                start: self.day_start,
                end: self.day_end,
            });
        }
        let span = self.daily_span_minutes();
        if span % self.slot_minutes != 0 {
            return Err(ConfigError::UnevenSlots {
                span_minutes: span,
                slot_minutes: self.slot_minutes,
            });
        }
        Ok(())
    }

    pub fn daily_span_minutes(&self) -> u32 {
        let span = self.day_end - self.day_start;
        span.num_minutes().max(0) as u32
    }

    pub fn slots_per_day(&self) -> u32 {
        self.daily_span_minutes() / self.slot_minutes
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            window_start: Self::DEFAULT_WINDOW_START
                .parse()
                .expect("default window start is a valid date"),
            window_days: 5,
            day_start: NaiveTime::parse_from_str(Self::DEFAULT_DAY_START, "%H:%M")
                .expect("default day start is a valid time"),
            day_end: NaiveTime::parse_from_str(Self::DEFAULT_DAY_END, "%H:%M")
                .expect("default day end is a valid time"),
            slot_minutes: 20,
        }
    }
}

/// Capacity dials that are policy rather than calendar: how many application
/// tokens each student starts with, and how far past a job's quota the
/// invitation pipeline may reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPolicy {
    pub initial_tokens: u32,
    pub invitation_headroom: u32,
}

impl PlacementPolicy {
    const DEFAULT_INITIAL_TOKENS: &'static str = "5";
    const DEFAULT_INVITATION_HEADROOM: &'static str = "10";
}

impl Default for PlacementPolicy {
    fn default() -> Self {
        Self {
            initial_tokens: 5,
            invitation_headroom: 10,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

fn parse_var<T>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse::<T>().map_err(|_| ConfigError::Invalid {
        key,
        value: raw,
    })
}

fn parse_time(key: &'static str, default: &str) -> Result<NaiveTime, ConfigError> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    NaiveTime::parse_from_str(&raw, "%H:%M").map_err(|_| ConfigError::Invalid {
        key,
        value: raw,
    })
}

#[derive(Debug)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String },
    EmptyWindow,
    ZeroSlotDuration,
    InvertedDayBounds { start: NaiveTime, end: NaiveTime },
    UnevenSlots { span_minutes: u32, slot_minutes: u32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { key, value } => {
                write!(f, "{key} could not be parsed from '{value}'")
            }
            ConfigError::EmptyWindow => write!(f, "APP_WINDOW_DAYS must be at least 1"),
            ConfigError::ZeroSlotDuration => write!(f, "APP_SLOT_MINUTES must be at least 1"),
            ConfigError::InvertedDayBounds { start, end } => {
                write!(f, "daily bounds are inverted ({start} >= {end})")
            }
            ConfigError::UnevenSlots {
                span_minutes,
                slot_minutes,
            } => write!(
                f,
                "slot duration of {slot_minutes} minutes does not evenly divide the {span_minutes} minute day"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
