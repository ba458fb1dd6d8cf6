//! HTTP access to the clock's JSON API

pub mod client;
pub mod device;
