//! Control engine root.
//!
//! Decision rules and the timed actuator sequences that carry them out.

pub mod actuation;
pub mod policy;
