//! Command execution for the clipfetch binary.

pub(crate) mod commands;
pub(crate) mod context;
pub(crate) mod exit_handler;
pub(crate) mod progress_manager;
pub(crate) mod runtime;
pub(crate) mod terminal;
