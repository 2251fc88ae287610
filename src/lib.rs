//! PasteCrop: crop pasted or loaded images, copy the result and keep a
//! short history of recent crops.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod database;
pub mod logger;
pub mod managers;
pub mod platform;
pub mod services;
pub mod storage;
pub mod types;
