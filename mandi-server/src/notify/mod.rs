//! Notification delivery
//!
//! Lifecycle commands queue notifications through `NotifyService`; the
//! worker persists them and fans out to the best-effort channels.
//! Delivery never sits on the command path.

pub mod service;
pub mod worker;

pub use service::NotifyService;
pub use worker::NotifyWorker;
