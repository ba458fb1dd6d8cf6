//! LED clock client library
//!
//! Keeps a local copy of a networked LED clock's state in sync with the
//! device and forwards configuration changes, OTA and reboot requests to it.

pub mod app;
pub mod config;
pub mod errors;
pub mod events;
pub mod http;
pub mod logs;
pub mod sync;
pub mod utils;
pub mod workers;
