pub mod models;
pub mod services;

pub use models::{AvailabilityError, DayAvailability};
pub use services::availability::AvailabilityService;
