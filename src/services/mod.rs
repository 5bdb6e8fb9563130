//! Business logic services.

pub mod auth;
pub mod session;
pub mod stats;
pub mod view;
