//! lumenctl - command line host for the lumen orchestration core.

pub mod app;
pub mod commands;
pub mod confirm;
