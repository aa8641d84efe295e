//! Error types for graphctl-reconcile.
//!
//! Lifecycle failures are not errors here: they travel as
//! [`ReconcileOutcome::Failure`](crate::ReconcileOutcome) diagnostics. These
//! variants cover what stops a whole run.

use thiserror::Error;

use graphctl_core::{KindMismatch, ResourceAddress, StateError, ValidationError};

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    KindMismatch(#[from] KindMismatch),

    #[error("{address} is not declared in the manifest")]
    NotDeclared { address: ResourceAddress },

    #[error("{address} is already tracked")]
    AlreadyTracked { address: ResourceAddress },

    #[error("failed to render plan: {0}")]
    Render(#[from] serde_yaml::Error),
}
