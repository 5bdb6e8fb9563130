//! Domain records and DTOs.

pub mod statistics;
pub mod user;
