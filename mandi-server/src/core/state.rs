//! Server state - shared handles for every request
//!
//! `AppState` is cloned per request by axum; every field is a cheap
//! shared handle.

use std::sync::Arc;

use crate::audit::{AuditService, AuditWorker};
use crate::auth::JwtService;
use crate::core::config::Config;
use crate::core::tasks::{BackgroundTasks, TaskKind, event_log_listener, offer_expiry_sweep};
use crate::lifecycle::LifecycleManager;
use crate::notify::{NotifyService, NotifyWorker};
use crate::storage::MarketStorage;

/// Queue capacity for the notification and audit pipelines
const SERVICE_QUEUE_CAPACITY: usize = 1024;

/// Shared server state
///
/// | Field | Role |
/// |-------|------|
/// | config | immutable configuration |
/// | storage | embedded redb database, used directly for reads |
/// | manager | transactional lifecycle command processing |
/// | jwt | bearer token validation |
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub storage: MarketStorage,
    pub manager: Arc<LifecycleManager>,
    pub jwt: Arc<JwtService>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("storage", &"<MarketStorage>")
            .field("manager", &self.manager)
            .finish()
    }
}

impl AppState {
    /// Initialize state and register the background pipeline.
    ///
    /// Order matters: the notify and audit workers must exist before the
    /// manager gets their queue handles, and the event listener subscribes
    /// before any command can run.
    pub fn initialize(config: &Config, tasks: &mut BackgroundTasks) -> anyhow::Result<Self> {
        // 1. Work directory structure
        config.ensure_work_dir_structure()?;

        // 2. Embedded database
        let db_path = config.database_path();
        let storage = MarketStorage::open(&db_path)?;
        let stats = storage.get_stats()?;
        tracing::info!(
            path = %db_path.display(),
            listings = stats.listing_count,
            offers = stats.offer_count,
            orders = stats.order_count,
            disputes = stats.dispute_count,
            commands = stats.processed_command_count,
            "Database opened"
        );

        // 3. Notification and audit pipelines
        let shutdown = tasks.shutdown_token();
        let (notify_service, notify_rx) = NotifyService::new(SERVICE_QUEUE_CAPACITY);
        let (audit_service, audit_rx) = AuditService::new(SERVICE_QUEUE_CAPACITY);
        tasks.spawn(
            "notify_worker",
            TaskKind::Worker,
            NotifyWorker::new(storage.clone()).run(notify_rx, shutdown.clone()),
        );
        tasks.spawn(
            "audit_worker",
            TaskKind::Worker,
            AuditWorker::new(storage.clone()).run(audit_rx, shutdown.clone()),
        );

        // 4. Lifecycle manager with both sinks attached
        let mut manager = LifecycleManager::new(storage.clone());
        manager.set_notifier(notify_service);
        manager.set_audit_sink(audit_service);
        let manager = Arc::new(manager);

        // 5. Event log listener and offer expiry sweep
        tasks.spawn(
            "lifecycle_event_log",
            TaskKind::Listener,
            event_log_listener(manager.subscribe(), shutdown.clone()),
        );
        tasks.spawn(
            "offer_expiry_sweep",
            TaskKind::Periodic,
            offer_expiry_sweep(
                manager.clone(),
                config.offer_sweep_interval_secs,
                shutdown,
            ),
        );

        // 6. JWT service
        let jwt = Arc::new(JwtService::new(
            &config.jwt_secret,
            config.jwt_expiry_hours,
        ));

        Ok(Self {
            config: config.clone(),
            storage,
            manager,
            jwt,
        })
    }
}
