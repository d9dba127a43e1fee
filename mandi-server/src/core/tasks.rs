//! Background task management
//!
//! Registers, supervises and shuts down the server's background tasks:
//!
//! - [`TaskKind::Worker`] - long-running queue consumers (notifications, audit)
//! - [`TaskKind::Listener`] - broadcast subscribers (lifecycle event log)
//! - [`TaskKind::Periodic`] - scheduled jobs (offer expiry sweep)

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::FutureExt;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use shared::event::LifecycleEvent;

use crate::lifecycle::actions::ExpireOffersAction;
use crate::lifecycle::{CommandMetadata, LifecycleManager};

/// Task type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    /// Long-running queue consumer
    Worker,
    /// Broadcast subscriber
    Listener,
    /// Scheduled job on a fixed interval
    Periodic,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Worker => write!(f, "Worker"),
            TaskKind::Listener => write!(f, "Listener"),
            TaskKind::Periodic => write!(f, "Periodic"),
        }
    }
}

/// A registered background task
struct RegisteredTask {
    name: &'static str,
    kind: TaskKind,
    handle: JoinHandle<()>,
}

/// Background task supervisor
///
/// Tasks registered here are wrapped to catch panics, and are cancelled
/// together through one token on shutdown.
pub struct BackgroundTasks {
    tasks: Vec<RegisteredTask>,
    shutdown: CancellationToken,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// Token tasks can watch for the shutdown signal
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Register and start a background task
    ///
    /// The future is wrapped to catch panics; a panicking task is logged
    /// instead of taking the process down.
    pub fn spawn<F>(&mut self, name: &'static str, kind: TaskKind, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let wrapped = async move {
            let result: Result<(), Box<dyn std::any::Any + Send>> =
                AssertUnwindSafe(future).catch_unwind().await;
            match result {
                Ok(()) => {}
                Err(panic_info) => {
                    let panic_msg: String = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        (*s).to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    tracing::error!(task = %name, kind = %kind, panic = %panic_msg, "Background task panicked");
                }
            }
        };

        let handle = tokio::spawn(wrapped);
        tracing::debug!(task = %name, kind = %kind, "Registered background task");
        self.tasks.push(RegisteredTask { name, kind, handle });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Log a one-line summary of the registered tasks
    pub fn log_summary(&self) {
        let count = |kind| self.tasks.iter().filter(|t| t.kind == kind).count();
        tracing::info!(
            "Background tasks registered: {} total (Worker: {}, Listener: {}, Periodic: {})",
            self.tasks.len(),
            count(TaskKind::Worker),
            count(TaskKind::Listener),
            count(TaskKind::Periodic)
        );
    }

    /// Cancel all tasks and wait for them to finish
    pub async fn shutdown(self) {
        tracing::info!("Shutting down {} background tasks...", self.tasks.len());

        self.shutdown.cancel();

        for task in self.tasks {
            match task.handle.await {
                Ok(()) => {
                    tracing::debug!(task = %task.name, "Task completed");
                }
                Err(e) if e.is_cancelled() => {
                    tracing::debug!(task = %task.name, "Task cancelled");
                }
                Err(e) => {
                    tracing::error!(task = %task.name, error = ?e, "Task panicked");
                }
            }
        }

        tracing::info!("All background tasks stopped");
    }
}

impl Default for BackgroundTasks {
    fn default() -> Self {
        Self::new()
    }
}

/// Log every committed lifecycle event with structured fields.
///
/// First consumer of the manager's broadcast stream. Lag means events
/// were skipped, which only costs log lines here, but downstream
/// consumers with durability needs should use a dedicated channel.
pub async fn event_log_listener(
    mut events: broadcast::Receiver<LifecycleEvent>,
    shutdown: CancellationToken,
) {
    tracing::info!("Lifecycle event listener started");

    loop {
        tokio::select! {
            result = events.recv() => match result {
                Ok(event) => {
                    tracing::debug!(
                        event_id = %event.event_id,
                        entity_type = %event.entity_type,
                        entity_id = %event.entity_id,
                        action = %event.action,
                        actor_id = %event.actor_id,
                        "Lifecycle event"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event listener lagged, events skipped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event channel closed, listener stopping");
                    break;
                }
            },
            _ = shutdown.cancelled() => {
                tracing::info!("Lifecycle event listener stopping");
                break;
            }
        }
    }
}

/// Periodic sweep that expires pending offers past their deadline.
///
/// Runs as a system-initiated command through the manager, so expiry
/// follows the same transactional path as user commands. The first tick
/// fires immediately, catching offers that lapsed while the server was
/// down.
pub async fn offer_expiry_sweep(
    manager: Arc<LifecycleManager>,
    interval_secs: u64,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs.max(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    tracing::info!(interval_secs, "Offer expiry sweep started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let action = ExpireOffersAction { now: Utc::now() };
                match manager.execute(&action, &CommandMetadata::system()) {
                    Ok(0) => {}
                    Ok(expired) => {
                        tracing::info!(expired, "Expired pending offers past their deadline");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Offer expiry sweep failed");
                    }
                }
            }
            _ = shutdown.cancelled() => {
                tracing::info!("Offer expiry sweep stopping");
                break;
            }
        }
    }
}
