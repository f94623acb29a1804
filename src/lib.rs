//! alertline - a structured log-record pipeline
//!
//! A dispatcher fans each log record out to independent channels, each with
//! its own minimum severity. An SMS channel pages operators on errors while
//! keeping gateway failures away from the code that logged.

pub mod app;
pub mod channels;
pub mod cli;
pub mod config;
pub mod core;
pub mod diagnostics;
pub mod dispatcher;
pub mod formatting;
pub mod middleware;
pub mod notification;
pub mod server;

// Re-export core types for convenience
pub use crate::core::*;
pub use dispatcher::Dispatcher;
