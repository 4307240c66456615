pub mod admin;
pub mod health;
pub mod scheduling;
pub mod webhook;
