use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;
use uuid::Uuid;

// ==============================================================================
// TIME OF DAY
// ==============================================================================

pub const MINUTES_PER_DAY: i32 = 24 * 60;

/// Wall-clock time within a single day. Ordered by minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self, SchedulingError> {
        if hour > 23 || minute > 59 {
            return Err(SchedulingError::InvalidTime(format!(
                "{}:{} is not a valid time of day", hour, minute
            )));
        }
        Ok(Self { hour, minute })
    }

    /// `None` when the value falls outside `0..MINUTES_PER_DAY`.
    pub fn from_minutes(minutes: i32) -> Option<Self> {
        if !(0..MINUTES_PER_DAY).contains(&minutes) {
            return None;
        }
        Some(Self {
            hour: (minutes / 60) as u8,
            minute: (minutes % 60) as u8,
        })
    }

    pub fn minutes_since_midnight(&self) -> i32 {
        i32::from(self.hour) * 60 + i32::from(self.minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl FromStr for TimeOfDay {
    type Err = SchedulingError;

    /// Accepts `HH:MM` and the datastore's `HH:MM:SS`; seconds are dropped.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SchedulingError::InvalidTime(format!("cannot parse '{}' as HH:MM", s));

        let mut parts = s.trim().split(':');
        let hour = parts.next().ok_or_else(invalid)?;
        let minute = parts.next().ok_or_else(invalid)?;
        let seconds = parts.next();
        if parts.next().is_some() || hour.is_empty() || hour.len() > 2 || minute.len() != 2 {
            return Err(invalid());
        }

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if !all_digits(hour) || !all_digits(minute) {
            return Err(invalid());
        }
        if let Some(seconds) = seconds {
            if seconds.len() != 2 || !all_digits(seconds) {
                return Err(invalid());
            }
        }

        let hour = hour.parse::<u8>().map_err(|_| invalid())?;
        let minute = minute.parse::<u8>().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ==============================================================================
// CLINIC SCHEDULING CONFIGURATION
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingWindow {
    pub open: TimeOfDay,
    pub close: TimeOfDay,
}

impl OperatingWindow {
    pub fn is_empty(&self) -> bool {
        self.open >= self.close
    }
}

/// Recurring daily unavailability such as lunch. Breaks need not be sorted
/// and may overlap each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakInterval {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingMode {
    Auto,
    #[default]
    Manual,
    OpenQueue,
}

impl fmt::Display for BookingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingMode::Auto => write!(f, "auto"),
            BookingMode::Manual => write!(f, "manual"),
            BookingMode::OpenQueue => write!(f, "open_queue"),
        }
    }
}

fn default_active_chairs() -> i32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulingConfig {
    #[serde(default)]
    pub clinic_id: String,
    pub operating_hours: OperatingWindow,
    pub slot_duration_minutes: i32,
    #[serde(default)]
    pub breaks: Vec<BreakInterval>,
    #[serde(default)]
    pub booking_mode: BookingMode,
    #[serde(default = "default_active_chairs")]
    pub active_chairs: i32,
}

impl SchedulingConfig {
    /// Boundary check run before a configuration is used for booking.
    /// Stricter than the slot generator, which tolerates a reversed window.
    pub fn validate(&self) -> Result<(), SchedulingError> {
        if self.slot_duration_minutes <= 0 {
            return Err(SchedulingError::InvalidConfiguration(format!(
                "slot duration must be positive, got {} minutes",
                self.slot_duration_minutes
            )));
        }

        if self.operating_hours.is_empty() {
            return Err(SchedulingError::InvalidConfiguration(format!(
                "operating hours open at {} but close at {}",
                self.operating_hours.open, self.operating_hours.close
            )));
        }

        if let Some(bad) = self.breaks.iter().find(|b| b.start >= b.end) {
            return Err(SchedulingError::InvalidConfiguration(format!(
                "break '{}' starts at {} but ends at {}",
                bad.id, bad.start, bad.end
            )));
        }

        if self.active_chairs <= 0 {
            return Err(SchedulingError::InvalidConfiguration(
                "at least one active chair is required".to_string(),
            ));
        }

        Ok(())
    }
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    CheckedIn,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Completed and cancelled visits can no longer be moved or re-opened.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Scheduled => write!(f, "scheduled"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::CheckedIn => write!(f, "checked_in"),
            AppointmentStatus::InProgress => write!(f, "in_progress"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub clinic_id: String,
    pub patient_name: String,
    pub patient_phone: Option<String>,
    pub date: NaiveDate,
    pub time: TimeOfDay,
    pub duration_minutes: i32,
    pub chair_number: Option<i32>,
    pub doctor_id: Option<Uuid>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_name: String,
    pub patient_phone: Option<String>,
    pub date: NaiveDate,
    pub time: TimeOfDay,
    pub duration_minutes: i32,
    pub chair_number: Option<i32>,
    pub doctor_id: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub date: NaiveDate,
    pub time: TimeOfDay,
    pub chair_number: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateQuery {
    pub date: NaiveDate,
}

// ==============================================================================
// SLOT AVAILABILITY
// ==============================================================================

/// Row returned by the `get_available_slots` datastore function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSlot {
    pub slot_time: String,
    #[serde(default)]
    pub available_chairs: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotSource {
    Remote,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedSlotsResponse {
    pub slots: Vec<String>,
    pub count: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlotsResponse {
    pub date: NaiveDate,
    pub slots: Vec<String>,
    pub count: usize,
    pub message: String,
    pub source: SlotSource,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulingError {
    #[error("Invalid scheduling configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Appointment not found")]
    NotFound,

    #[error("No scheduling configuration for clinic {0}")]
    ConfigNotFound(String),

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error("Remote write failed, local change rolled back: {0}")]
    RemoteWriteFailed(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}
