//! Hyperoptic account monitor
//!
//! Polls account data, resolves each package's pricing schedule into the
//! current tier and the next price increase, and exposes the results as
//! sensor readings.

pub mod cli;
pub mod config;
pub mod services;
pub mod types;
