//! Device state synchronization

pub mod heartbeat;
pub mod orchestrator;
pub mod reconcile;
pub mod state;
