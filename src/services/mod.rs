pub mod messaging;
pub mod scheduling;
