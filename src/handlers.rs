// src/handlers.rs

pub mod auth;
pub mod availability;
pub mod bookings;
pub mod shops;
