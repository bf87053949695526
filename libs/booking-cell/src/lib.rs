pub mod models;
pub mod services;

pub use models::{
    BookAppointmentRequest, BookingError, RescheduleAppointmentRequest, RescheduleDenied,
};
pub use services::booking::BookingService;
