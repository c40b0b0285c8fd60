//! # Verdant Control Unit Library
//!
//! Supervisory loop for a hydroponic reservoir: reads conductivity, CO2 and
//! the foam probe voltage, doses nutrient and drives the foam valve, and logs
//! every cycle.
//!
//! ## Lifecycle
//!
//! `Initializing → Priming → Running → Safing → Terminated`
//!
//! Every exit path after binding (normal completion, sensor or actuator
//! fault, interrupt) passes through Safing: all pumps off, valve driven
//! closed, hardware released exactly once.
//!
//! ## Single-Threaded Loop
//!
//! The loop owns every handle. Waits go through a [`pacing::Pacer`] so a
//! shutdown request cuts interruptible waits short and tests run without
//! sleeping.

pub mod config;
pub mod control;
pub mod cycle;
pub mod error;
pub mod measurement_log;
pub mod pacing;
pub mod safety;
pub mod state;
