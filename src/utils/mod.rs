//! Utils module - Utility functions and helpers

pub mod duration;
pub mod logging;
