//! Access control for survey core operations.
//!
//! # Responsibility
//! - Map each (entity kind, action) pair to the standing it requires.
//! - Narrow read sets to what an actor may see (visibility).
//! - Deny writes on entities the actor does not own (guard).
//!
//! # Invariants
//! - Visibility never errors for lack of standing; it narrows instead.
//! - Guard denials are explicit `Forbidden` errors.

pub mod action;
pub mod guard;
pub mod visibility;
