//! graphctl core library — domain types, label matcher codec, manifest,
//! tracked state persistence, errors.
//!
//! Public API surface:
//! - [`types`] — newtypes and resource models
//! - [`label_matcher`] — `key=value` matcher validation
//! - [`manifest`] — declared resources and provider settings
//! - [`state`] — load / save of tracked state
//! - [`error`] — [`ValidationError`], [`StateError`], [`ManifestError`]

pub mod error;
pub mod label_matcher;
pub mod manifest;
pub mod state;
pub mod types;

pub use error::{ManifestError, MatcherDefect, StateError, ValidationError};
pub use label_matcher::LabelMatcher;
pub use manifest::{Manifest, ProviderConfig, ResolvedProvider};
pub use state::StateFile;
pub use types::{
    FederatedGraphState, GraphDefinition, KindMismatch, MonographLookup, MonographState,
    Namespace, ResourceAddress, ResourceId, ResourceKind, ResourceModel, RouterTokenState,
    Sensitive, DEFAULT_NAMESPACE,
};
