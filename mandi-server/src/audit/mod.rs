//! Audit trail
//!
//! Every state-changing command leaves an audit entry. Entries are
//! queued by the lifecycle manager after commit and persisted by a
//! background worker, so a slow disk never stalls command handling.

pub mod service;
pub mod worker;

pub use service::AuditService;
pub use worker::AuditWorker;
