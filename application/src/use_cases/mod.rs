//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod connection_manager;
pub mod fan_out;
pub mod keyword_lifecycle;
pub mod report_assembler;
pub mod run_cycle;
