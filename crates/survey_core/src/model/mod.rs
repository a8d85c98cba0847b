//! Survey domain model.
//!
//! # Responsibility
//! - Define the records stored by the survey core and their read models.
//! - Validate caller-supplied drafts before they reach persistence.
//!
//! # Invariants
//! - Every stored record is identified by a stable UUID v4.
//! - A survey's creator never changes after creation.
//! - Read models nest children in display order (`order ASC`, then insertion).

pub mod actor;
pub mod field_error;
pub mod response;
pub mod survey;
