//! Client configuration

pub mod settings;
