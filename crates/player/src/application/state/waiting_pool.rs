//! Locally known set of other users waiting for a match.

use galaxytalk_domain::{UserId, WaitingUser};

pub const WAITING_POOL_CAP: usize = 20;

/// Capped, deduplicated by user id, insertion ordered, never holding the local user.
#[derive(Debug, Clone)]
pub struct WaitingPool {
    me: UserId,
    users: Vec<WaitingUser>,
}

impl WaitingPool {
    pub fn new(me: UserId) -> Self {
        Self {
            me,
            users: Vec::new(),
        }
    }

    /// Replace the contents with the server's list, keeping the first
    /// [`WAITING_POOL_CAP`] eligible entries.
    pub fn seed(&mut self, users: Vec<WaitingUser>) {
        self.users.clear();
        for user in users {
            if self.users.len() == WAITING_POOL_CAP {
                break;
            }
            self.insert(user);
        }
    }

    /// Returns `false` when the user was ignored (self, duplicate, or full).
    pub fn insert(&mut self, user: WaitingUser) -> bool {
        if user.user_id == self.me || user.user_id.is_empty() {
            return false;
        }
        if self.contains(&user.user_id) {
            return false;
        }
        if self.users.len() >= WAITING_POOL_CAP {
            tracing::debug!(user_id = %user.user_id, "Waiting pool full, ignoring new user");
            return false;
        }
        self.users.push(user);
        true
    }

    /// Removing an absent id is a no-op.
    pub fn remove(&mut self, user_id: &UserId) -> bool {
        let before = self.users.len();
        self.users.retain(|u| &u.user_id != user_id);
        self.users.len() != before
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        self.users.iter().any(|u| &u.user_id == user_id)
    }

    pub fn users(&self) -> &[WaitingUser] {
        &self.users
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn clear(&mut self) {
        self.users.clear();
    }
}
