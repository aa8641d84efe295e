//! graphctl reconciliation — per-kind lifecycle state machines, diagnostics,
//! planning and the apply engine.
//!
//! - [`resource`] — the [`Resource`] and [`DataSource`] capability traits
//! - [`federated_graph`], [`token`], [`monograph`] — one reconciler per kind
//! - [`diagnostics`] — [`ReconcileOutcome`], [`Diagnostics`], [`RunReport`]
//! - [`plan`] — declared vs tracked comparison, redacted diffs
//! - [`engine`] — refresh / apply / import over a whole manifest

pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod federated_graph;
pub mod monograph;
pub mod plan;
pub mod resource;
pub mod schema;
pub mod token;

pub use diagnostics::{Diagnostic, Diagnostics, ErrorClass, ReconcileOutcome, RunReport, Severity};
pub use engine::Engine;
pub use error::ReconcileError;
pub use federated_graph::FederatedGraphResource;
pub use monograph::MonographDataSource;
pub use plan::{plan, plan_destroy, ChangeAction, Plan, PlannedChange};
pub use resource::{DataSource, Resource};
pub use schema::{Attribute, AttributeMode, ResourceSchema};
pub use token::RouterTokenResource;
