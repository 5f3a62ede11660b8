//! # Submission Service
//!
//! Typed business operations (contact, service query, quote, newsletter,
//! upload, auth) and the validation they run before dispatch.

pub mod submission;
pub mod validation;

pub use submission::{Operation, SubmissionError, SubmissionService};
pub use validation::{Validate, ValidationErrors};
