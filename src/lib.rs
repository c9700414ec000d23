pub mod calendar;
pub mod config;
pub mod discord;
pub mod error;
pub mod sync;
