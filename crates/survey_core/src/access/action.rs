//! Actions, entity kinds and the capability each combination requires.

use serde::Serialize;

/// Record family an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Survey,
    Question,
    Option,
    Response,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Survey => "survey",
            Self::Question => "question",
            Self::Option => "option",
            Self::Response => "response",
        }
    }
}

/// Operation requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    List,
    Retrieve,
    Create,
    Update,
    PartialUpdate,
    Delete,
    Stats,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Retrieve => "retrieve",
            Self::Create => "create",
            Self::Update => "update",
            Self::PartialUpdate => "partial_update",
            Self::Delete => "delete",
            Self::Stats => "stats",
        }
    }

    pub fn is_read_only(self) -> bool {
        matches!(self, Self::List | Self::Retrieve)
    }
}

/// Standing an actor needs before an action may proceed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Read-only; the guard is bypassed.
    Public,
    /// Writes open to anyone, including anonymous actors.
    Anyone,
    /// Any authenticated actor.
    Authenticated,
    /// The owning survey's creator, or a superuser.
    Owner,
}

/// Returns the capability `action` on `kind` requires.
///
/// Question and option creation are owner-gated against the parent's survey.
/// Response creation is open so anonymous respondents can submit.
pub fn capability_for(kind: EntityKind, action: Action) -> Capability {
    match (kind, action) {
        (_, Action::List | Action::Retrieve) => Capability::Public,
        (EntityKind::Response, Action::Create) => Capability::Anyone,
        (EntityKind::Survey, Action::Create) => Capability::Authenticated,
        (EntityKind::Question | EntityKind::Option, Action::Create) => Capability::Owner,
        (_, Action::Update | Action::PartialUpdate | Action::Delete | Action::Stats) => {
            Capability::Owner
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{capability_for, Action, Capability, EntityKind};

    #[test]
    fn read_actions_are_public_for_every_kind() {
        for kind in [
            EntityKind::Survey,
            EntityKind::Question,
            EntityKind::Option,
            EntityKind::Response,
        ] {
            assert_eq!(capability_for(kind, Action::List), Capability::Public);
            assert_eq!(capability_for(kind, Action::Retrieve), Capability::Public);
        }
    }

    #[test]
    fn creation_requirements_depend_on_kind() {
        assert_eq!(
            capability_for(EntityKind::Response, Action::Create),
            Capability::Anyone
        );
        assert_eq!(
            capability_for(EntityKind::Survey, Action::Create),
            Capability::Authenticated
        );
        assert_eq!(
            capability_for(EntityKind::Question, Action::Create),
            Capability::Owner
        );
        assert_eq!(
            capability_for(EntityKind::Option, Action::Create),
            Capability::Owner
        );
    }

    #[test]
    fn mutations_and_stats_require_ownership() {
        for action in [
            Action::Update,
            Action::PartialUpdate,
            Action::Delete,
            Action::Stats,
        ] {
            assert!(!action.is_read_only());
            assert_eq!(
                capability_for(EntityKind::Survey, action),
                Capability::Owner
            );
        }
    }
}
