//! Session store - the current user's identity and interaction status.
//!
//! All mutation goes through [`SessionStore::apply`]. Base attributes and the
//! interaction state are persisted through the storage port after every
//! update and reloaded by [`SessionStore::load`].

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use galaxytalk_domain::{InteractionState, Session, UserBase, UserId, UserStatus};

use crate::ports::outbound::{storage_keys, StorageProvider};

/// Server-driven changes to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionUpdate {
    /// Response of `GET /oauth`
    Base(UserBase),
    /// Response of `GET /oauth/status`
    Status(UserStatus),
    /// Back to the anonymous default (logout, expired session)
    Reset,
}

pub struct SessionStore {
    session: RwLock<Session>,
    storage: Arc<dyn StorageProvider>,
}

impl SessionStore {
    /// Empty store; nothing is read from storage.
    pub fn new(storage: Arc<dyn StorageProvider>) -> Self {
        Self {
            session: RwLock::new(Session::anonymous()),
            storage,
        }
    }

    /// Store seeded from whatever the previous run persisted.
    pub fn load(storage: Arc<dyn StorageProvider>) -> Self {
        let base = storage
            .load(storage_keys::USER_BASE)
            .and_then(|raw| match serde_json::from_str::<UserBase>(&raw) {
                Ok(base) => Some(base),
                Err(e) => {
                    tracing::warn!("Discarding unreadable stored session: {}", e);
                    None
                }
            })
            .unwrap_or_default();
        let user_interaction_state = storage
            .load(storage_keys::INTERACTION_STATE)
            .and_then(|raw| serde_json::from_str::<InteractionState>(&raw).ok())
            .unwrap_or_default();

        Self {
            session: RwLock::new(Session {
                base,
                status: UserStatus {
                    user_interaction_state,
                },
            }),
            storage,
        }
    }

    /// The single reducer entry point.
    pub fn apply(&self, update: SessionUpdate) {
        let snapshot = {
            let mut session = self.write();
            match update {
                SessionUpdate::Base(base) => session.base = base,
                SessionUpdate::Status(status) => session.status = status,
                SessionUpdate::Reset => *session = Session::anonymous(),
            }
            session.clone()
        };
        tracing::debug!(
            user_id = %snapshot.base.user_id,
            state = %snapshot.interaction_state(),
            "Session updated"
        );
        self.persist(&snapshot);
    }

    pub fn reset(&self) {
        self.apply(SessionUpdate::Reset);
    }

    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    pub fn base(&self) -> UserBase {
        self.read().base.clone()
    }

    pub fn user_id(&self) -> UserId {
        self.read().base.user_id.clone()
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.read().interaction_state()
    }

    pub fn is_logged_in(&self) -> bool {
        !self.read().base.is_anonymous()
    }

    fn persist(&self, session: &Session) {
        if session.base.is_anonymous() {
            self.storage.remove(storage_keys::USER_BASE);
            self.storage.remove(storage_keys::INTERACTION_STATE);
            return;
        }
        match serde_json::to_string(&session.base) {
            Ok(raw) => self.storage.save(storage_keys::USER_BASE, &raw),
            Err(e) => tracing::warn!("Failed to persist session: {}", e),
        }
        match serde_json::to_string(&session.interaction_state()) {
            Ok(raw) => self.storage.save(storage_keys::INTERACTION_STATE, &raw),
            Err(e) => tracing::warn!("Failed to persist interaction state: {}", e),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.session.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.session.write().unwrap_or_else(|e| e.into_inner())
    }
}
