pub mod appointment;
pub mod schedule;

pub use appointment::{Appointment, AppointmentStatus, ReminderWindow};
pub use schedule::{slot_start_at, parse_slot_label, DayOfWeek, WeeklySchedule};
