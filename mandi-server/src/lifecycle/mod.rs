//! Order Lifecycle Module
//!
//! This module implements the marketplace lifecycle core:
//!
//! - **manager**: LifecycleManager for transactional command processing
//! - **actions**: One handler per lifecycle command (offers, orders,
//!   payments, shipments, disputes, reviews, messaging)
//! - **traits**: CommandHandler trait, CommandContext, CommandMetadata
//! - **error**: LifecycleError taxonomy mapped onto API errors
//!
//! # Architecture
//!
//! ```text
//! Command → LifecycleManager → CommandHandler → redb transaction
//!                 ↓                                  ↓
//!          Idempotency replay                 Entity writes
//!                 ↓                                  ↓
//!          Post-commit dispatch  ←──────────  SideEffects
//!           (notify / audit / broadcast)
//! ```
//!
//! # Data Flow
//!
//! 1. API handler builds an action plus CommandMetadata
//! 2. LifecycleManager checks the command id for a recorded response
//! 3. Handler validates and mutates entities inside one write transaction
//! 4. Response is recorded under the command id, transaction commits
//! 5. Notifications and audit entries are handed to background workers
//! 6. Lifecycle events are broadcast to all subscribers

pub mod actions;
pub mod error;
pub mod manager;
pub mod traits;

// Re-exports
pub use error::{LifecycleError, LifecycleResult};
pub use manager::LifecycleManager;
pub use traits::{CommandContext, CommandHandler, CommandMetadata, SideEffects, SYSTEM_ACTOR};
