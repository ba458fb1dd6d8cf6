//! Background workers

pub mod heartbeat;
pub mod poller;
