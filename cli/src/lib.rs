//! pdes-cli library: exposes the command handlers for unit tests.

pub mod app;
pub mod commands;
