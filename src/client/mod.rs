//! # Client Components
//!
//! The transport client is split into a core and its cross-cutting layers:
//!
//! ## Core Client ([`client`])
//! Builds URLs, enforces the timeout, decodes responses and classifies
//! failures. Every backend call goes through [`ApiClient`].
//!
//! ## Client Middleware ([`middleware`])
//! Manages everything that happens around a call:
//! - Bearer-token attachment from the session store
//! - Request/response tracing
//! - Session invalidation on 401
//! - One user-facing notice per failure
//!
//! ## Supporting pieces
//! - [`transport`]: the wire layer (`reqwest` in production)
//! - [`classify`]: pure failure → classification mapping
//! - [`session`]: persisted session token
//! - [`notify`]: user-facing notices

pub mod classify;
pub mod client;
pub mod middleware;
pub mod notify;
pub mod session;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// Re-export for convenience
pub use client::{ApiClient, ClientSettings};
pub use middleware::{Middleware, MiddlewareChain};
pub use notify::{LogNotifier, MemoryNotifier, Notice, NoticeLevel, Notifier};
pub use session::{FileSessionStore, MemorySessionStore, SessionStore};
pub use transport::{ApiRequest, ApiResponse, ReqwestTransport, Transport, TransportError};
