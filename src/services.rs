// src/services.rs

pub mod auth;
pub mod availability_service;
pub mod booking_service;
pub mod schedule_service;
pub mod shop_service;
pub mod slot_generator;
