use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Weekday template of bookable slots for one barber. Written by barber
/// configuration tooling; this core only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub id: Uuid,
    pub barber_id: Uuid,
    pub day_of_week: DayOfWeek,
    pub time_slots: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WeeklySchedule {
    pub fn contains_slot(&self, time_slot: &str) -> bool {
        self.time_slots.iter().any(|slot| slot == time_slot)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayOfWeek::Monday => write!(f, "monday"),
            DayOfWeek::Tuesday => write!(f, "tuesday"),
            DayOfWeek::Wednesday => write!(f, "wednesday"),
            DayOfWeek::Thursday => write!(f, "thursday"),
            DayOfWeek::Friday => write!(f, "friday"),
            DayOfWeek::Saturday => write!(f, "saturday"),
            DayOfWeek::Sunday => write!(f, "sunday"),
        }
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl DayOfWeek {
    pub fn for_date(date: NaiveDate) -> Self {
        chrono::Datelike::weekday(&date).into()
    }
}

/// Parse an "HH:MM" slot label. Labels come from schedule templates and user
/// input alike, so both paths validate through here.
pub fn parse_slot_label(label: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(label, "%H:%M").ok()
}

/// Absolute start of a (date, slot) pair. All shop times are carried as UTC.
pub fn slot_start_at(date: NaiveDate, time_slot: &str) -> Option<DateTime<Utc>> {
    let time = parse_slot_label(time_slot)?;
    Some(Utc.from_utc_datetime(&date.and_time(time)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_slot_labels() {
        assert!(parse_slot_label("09:00").is_some());
        assert!(parse_slot_label("23:30").is_some());
        assert!(parse_slot_label("9am").is_none());
        assert!(parse_slot_label("25:00").is_none());
        assert!(parse_slot_label("").is_none());
    }

    #[test]
    fn weekday_maps_onto_day_of_week() {
        // 2025-06-02 is a Monday
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        assert_eq!(DayOfWeek::for_date(date), DayOfWeek::Monday);
        assert_eq!(DayOfWeek::for_date(date.succ_opt().unwrap()), DayOfWeek::Tuesday);
    }
}
