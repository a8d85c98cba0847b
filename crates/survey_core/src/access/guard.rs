//! Object-level write guard.
//!
//! # Invariants
//! - Read-only actions bypass the guard entirely.
//! - Writes need an authenticated actor who owns the entity or is a superuser.
//! - Every denial is logged with kind/action metadata only.

use crate::access::action::{capability_for, Action, Capability, EntityKind};
use crate::error::ServiceError;
use crate::model::actor::{Actor, ActorId};
use log::warn;

pub const AUTHENTICATION_REQUIRED: &str = "Authentication credentials were not provided.";
pub const PERMISSION_DENIED: &str = "You do not have permission to perform this action.";

/// Returns whether `actor` may mutate an entity owned by `owner_id`.
pub fn can_mutate(actor: &Actor, owner_id: ActorId) -> bool {
    actor.is_authenticated() && (actor.is(owner_id) || actor.is_superuser())
}

/// Checks actor-level standing before any entity is looked up.
///
/// Public and open actions always pass; everything else needs authentication.
pub fn require_standing(
    actor: &Actor,
    kind: EntityKind,
    action: Action,
) -> Result<(), ServiceError> {
    match capability_for(kind, action) {
        Capability::Public | Capability::Anyone => Ok(()),
        Capability::Authenticated | Capability::Owner if actor.is_authenticated() => Ok(()),
        Capability::Authenticated | Capability::Owner => {
            Err(deny(actor, kind, action, AUTHENTICATION_REQUIRED))
        }
    }
}

/// Confirms `actor` may perform `action` on an entity owned by `owner_id`.
///
/// For question/option creation, `owner_id` is the parent survey's creator.
pub fn ensure_can_mutate(
    actor: &Actor,
    kind: EntityKind,
    action: Action,
    owner_id: ActorId,
) -> Result<(), ServiceError> {
    match capability_for(kind, action) {
        Capability::Public | Capability::Anyone => Ok(()),
        Capability::Authenticated if actor.is_authenticated() => Ok(()),
        Capability::Authenticated => Err(deny(actor, kind, action, AUTHENTICATION_REQUIRED)),
        Capability::Owner if can_mutate(actor, owner_id) => Ok(()),
        Capability::Owner => Err(deny(actor, kind, action, denial_message(kind, action))),
    }
}

/// Caller-facing message for an ownership denial.
pub fn denial_message(kind: EntityKind, action: Action) -> &'static str {
    match (kind, action) {
        (EntityKind::Question, Action::Create) => {
            "You do not have permission to add questions to this survey."
        }
        (EntityKind::Option, Action::Create) => {
            "You do not have permission to add options to this question."
        }
        (EntityKind::Survey, Action::Stats) => {
            "You do not have permission to view statistics for this survey."
        }
        _ => PERMISSION_DENIED,
    }
}

fn deny(actor: &Actor, kind: EntityKind, action: Action, message: &'static str) -> ServiceError {
    warn!(
        "event=access_denied module=access status=denied kind={} action={} authenticated={}",
        kind.as_str(),
        action.as_str(),
        actor.is_authenticated()
    );
    ServiceError::Forbidden(message)
}

#[cfg(test)]
mod tests {
    use super::{can_mutate, ensure_can_mutate, require_standing, PERMISSION_DENIED};
    use crate::access::action::{Action, EntityKind};
    use crate::error::{ErrorKind, ServiceError};
    use crate::model::actor::Actor;

    #[test]
    fn owner_and_superuser_may_mutate() {
        assert!(can_mutate(&Actor::user(1), 1));
        assert!(can_mutate(&Actor::superuser(9), 1));
        assert!(!can_mutate(&Actor::user(2), 1));
        assert!(!can_mutate(&Actor::anonymous(), 1));
    }

    #[test]
    fn read_only_actions_bypass_ownership() {
        ensure_can_mutate(&Actor::anonymous(), EntityKind::Survey, Action::Retrieve, 1)
            .expect("reads are never denied by the guard");
    }

    #[test]
    fn non_owner_update_is_forbidden() {
        let err = ensure_can_mutate(&Actor::user(2), EntityKind::Survey, Action::Update, 1)
            .expect_err("non-owner must be denied");
        assert!(matches!(err, ServiceError::Forbidden(PERMISSION_DENIED)));
    }

    #[test]
    fn anonymous_actor_lacks_standing_for_writes() {
        let err = require_standing(&Actor::anonymous(), EntityKind::Survey, Action::Create)
            .expect_err("anonymous create must be denied");
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        require_standing(&Actor::anonymous(), EntityKind::Response, Action::Create)
            .expect("anonymous respondents may submit");
    }

    #[test]
    fn question_denial_names_the_attempted_action() {
        let err = ensure_can_mutate(&Actor::user(2), EntityKind::Question, Action::Create, 1)
            .expect_err("non-owner must be denied");
        assert!(err.to_string().contains("add questions"));
    }
}
