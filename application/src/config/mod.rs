//! Application-level configuration.
//!
//! - [`CycleParams`]: research cycle control (concurrency, timeouts, keyword limits)

pub mod cycle_params;

pub use cycle_params::CycleParams;
