//! Core module - configuration, state, server and background tasks
//!
//! - [`Config`] - environment-driven configuration
//! - [`AppState`] - shared handles cloned per request
//! - [`Server`] - HTTP server lifecycle
//! - [`BackgroundTasks`] - task registration and graceful shutdown

pub mod config;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use server::Server;
pub use state::AppState;
pub use tasks::{BackgroundTasks, TaskKind};
