pub mod appointment;
pub mod lead;

pub use appointment::{Appointment, AppointmentStatus, TimeWindow};
pub use lead::Lead;
