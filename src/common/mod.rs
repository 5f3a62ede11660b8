//! # Common Components
//!
//! Shared data structures used by both the transport client and the
//! submission service.
//!
//! ## Modules
//!
//! - [`messages`]: Request payloads and the response envelope
//! - [`attachment`]: File blobs attached to submissions
//! - [`errors`]: The failure taxonomy
//! - [`config`]: Configuration parsing utilities

pub mod attachment;
pub mod config;
pub mod errors;
pub mod messages;
