//! Hardware abstraction layer contracts and configuration.

pub mod config;
pub mod driver;
pub mod pins;
pub mod types;
