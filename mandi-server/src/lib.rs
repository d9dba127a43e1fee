//! Mandi Server - order lifecycle core for a B2B produce marketplace
//!
//! # Architecture overview
//!
//! Farmers list produce, traders make offers, and an accepted offer
//! becomes an order that moves through payment, shipping, delivery and
//! (when things go wrong) disputes. Every state transition runs as one
//! command through the [`lifecycle`] manager: validation and entity
//! writes share a single storage transaction, and notifications, audit
//! entries and broadcast events are dispatched only after commit.
//!
//! # Module structure
//!
//! ```text
//! mandi-server/src/
//! ├── core/       # configuration, shared state, server, background tasks
//! ├── auth/       # JWT bearer auth and the CurrentUser extractor
//! ├── api/        # HTTP routes and handlers
//! ├── lifecycle/  # command manager and one handler per transition
//! ├── storage/    # embedded redb tables and queries
//! ├── notify/     # post-commit notification queue and worker
//! ├── audit/      # post-commit audit log queue and worker
//! ├── pricing/    # order fees and shipping rate card
//! ├── reviews/    # review eligibility and rating stats
//! └── utils/      # errors, logging, validation
//! ```

pub mod api;
pub mod audit;
pub mod auth;
pub mod core;
pub mod lifecycle;
pub mod notify;
pub mod pricing;
pub mod reviews;
pub mod storage;
pub mod utils;

// Re-export common types
pub use auth::{CurrentUser, JwtService};
pub use core::{AppState, Config, Server};
pub use lifecycle::LifecycleManager;
pub use storage::MarketStorage;
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

pub fn print_banner() {
    println!(
        r#"
                           _ _
 _ __ ___   __ _ _ __   __| (_)
| '_ ` _ \ / _` | '_ \ / _` | |
| | | | | | (_| | | | | (_| | |
|_| |_| |_|\__,_|_| |_|\__,_|_|
    "#
    );
}
