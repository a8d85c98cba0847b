//! Anonymous response ingestion helpers.
//!
//! # Responsibility
//! - Derive the trusted source address of a submission.
//! - Turn a raw JSON payload into a validated response graph.
//!
//! # Invariants
//! - The derived address always overwrites any client-supplied `ip_address`.
//! - Validation collects every field failure before reporting.

pub mod source_address;
pub mod submission;

pub use source_address::{source_address, RequestOrigin, FORWARDED_FOR_HEADER};
pub use submission::{check_references, inject_source_address, parse_submission, IngestPolicy};
