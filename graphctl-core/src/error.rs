//! Error types for graphctl-core.

use std::path::PathBuf;

use thiserror::Error;

/// Why a label matcher entry was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MatcherDefect {
    #[error("expected key=value")]
    MissingSeparator,

    #[error("key must not be empty")]
    EmptyKey,

    #[error("value must not be empty")]
    EmptyValue,

    #[error("only a single '=' is allowed per pair")]
    MultipleSeparators,
}

/// Local validation failures. These never reach the control plane.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A label matcher entry is not `key=value`.
    #[error("invalid label matcher '{entry}': {defect}")]
    MalformedLabelMatcher { entry: String, defect: MatcherDefect },

    /// A required field is empty or absent.
    #[error("missing required field '{field}'")]
    MissingField { field: &'static str },

    /// A field owned by the control plane was set in a declaration.
    #[error("'{field}' is computed by the control plane and cannot be declared ({address})")]
    ComputedFieldDeclared { address: String, field: &'static str },

    /// A resource address did not have the `<kind>.<key>` shape.
    #[error("invalid resource address '{address}': expected <kind>.<key>")]
    InvalidAddress { address: String },

    /// The kind part of an address is not a managed kind.
    #[error("unknown resource kind '{kind}'; expected: federated_graph, router_token")]
    UnknownKind { kind: String },
}

/// All errors that can arise from loading or saving tracked state.
#[derive(Debug, Error)]
pub enum StateError {
    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load, with the file path and serde_yaml's line context.
    #[error("failed to parse state at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The state file was written by a newer graphctl.
    #[error("state at {path} has version {found}; this build understands up to {supported}")]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    /// `dirs::home_dir()` returned `None`, so `~/.graphctl/` cannot be located.
    #[error("cannot determine home directory; set $HOME or pass --state")]
    HomeNotFound,
}

/// All errors that can arise from loading a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest not found at {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid manifest: {0}")]
    Invalid(#[from] ValidationError),
}

pub(crate) fn state_io(path: impl Into<PathBuf>, source: std::io::Error) -> StateError {
    StateError::Io {
        path: path.into(),
        source,
    }
}
