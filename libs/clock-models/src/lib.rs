//! Wire models for the LED clock JSON API
//!
//! Shapes shared by everything that talks to the clock's `/api/v1` surface.

pub mod models;

pub use models::*;
