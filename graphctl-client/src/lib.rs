//! graphctl client adapter — translates reconciler intents into platform
//! RPCs and classifies the replies.
//!
//! - [`messages`] — wire messages and the status envelope
//! - [`service`] — the [`PlatformService`] transport seam
//! - [`client`] — [`PlatformClient`], one method per remote capability
//! - [`error`] — [`ApiError`] and its kinds
//! - `memory` — in-memory control plane (tests and the `testing` feature)

pub mod client;
pub mod error;
pub mod messages;
pub mod service;

#[cfg(any(test, feature = "testing"))]
pub mod memory;

pub use client::{Applied, PlatformClient};
pub use error::{ApiError, ApiErrorKind, Operation};
pub use messages::{CompositionError, StatusCode};
pub use service::{PlatformService, RpcResult, TransportError};
