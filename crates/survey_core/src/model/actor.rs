//! Resolved caller identity.

use serde::{Deserialize, Serialize};

/// Identity of an authenticated user, as issued by the host's auth layer.
pub type ActorId = i64;

/// The identity performing an operation, possibly anonymous.
///
/// Anonymous actors never carry superuser standing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    id: Option<ActorId>,
    superuser: bool,
}

impl Actor {
    pub fn anonymous() -> Self {
        Self {
            id: None,
            superuser: false,
        }
    }

    pub fn user(id: ActorId) -> Self {
        Self {
            id: Some(id),
            superuser: false,
        }
    }

    pub fn superuser(id: ActorId) -> Self {
        Self {
            id: Some(id),
            superuser: true,
        }
    }

    pub fn id(&self) -> Option<ActorId> {
        self.id
    }

    pub fn is_authenticated(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_superuser(&self) -> bool {
        self.id.is_some() && self.superuser
    }

    /// Returns whether this actor is the given user.
    pub fn is(&self, other: ActorId) -> bool {
        self.id == Some(other)
    }
}
