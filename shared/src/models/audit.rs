//! Audit trail record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{EntityKind, LifecycleAction};

/// One append-only audit row. `metadata` carries per-action details such
/// as old and new values or cancellation context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: String,
    pub entity_type: EntityKind,
    pub entity_id: String,
    pub action: LifecycleAction,
    /// None for system-initiated transitions such as expiry sweeps
    pub actor_user_id: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl AuditLog {
    pub fn new(
        entity_type: EntityKind,
        entity_id: impl Into<String>,
        action: LifecycleAction,
        actor_user_id: Option<String>,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            entity_type,
            entity_id: entity_id.into(),
            action,
            actor_user_id,
            metadata,
            created_at: Utc::now(),
        }
    }
}
