//! Verdant Common Library
//!
//! This crate provides the shared constants, configuration loading utilities
//! and hardware contracts used by every crate of the Verdant workspace.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - System-wide defaults and limits
//! - [`hal`] - Hardware abstraction types, traits, errors and configuration
//! - [`control_unit`] - Control loop configuration and state enums
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use verdant_common::config::{ConfigLoader, SharedConfig};
//! use verdant_common::hal::types::FullScaleRange;
//! ```

pub mod config;
pub mod consts;
pub mod control_unit;
pub mod hal;
pub mod prelude;
