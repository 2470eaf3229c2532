//! CLI command handlers

pub mod commands;

pub use commands::{execute_plan, prepare_plan, run, ImportPlan, RunOptions};
