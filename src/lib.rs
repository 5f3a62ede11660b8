pub mod client;
pub mod common;
pub mod service;

pub use client::{ApiClient, SessionStore};
pub use common::errors::{ApiError, ErrorKind};
pub use common::messages::Envelope;
pub use service::{SubmissionError, SubmissionService};
