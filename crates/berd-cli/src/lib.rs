//! CLI library components for the BERD pipeline.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod summary;
