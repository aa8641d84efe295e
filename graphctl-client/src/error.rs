//! Classified API outcomes.

use std::fmt;

use thiserror::Error;

use crate::messages::StatusCode;
use crate::service::TransportError;

/// The client operation that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateGraph,
    ReadGraph,
    UpdateGraph,
    DeleteGraph,
    ReadMonograph,
    CreateToken,
    DeleteToken,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::CreateGraph => "CreateGraph",
            Operation::ReadGraph => "ReadGraph",
            Operation::UpdateGraph => "UpdateGraph",
            Operation::DeleteGraph => "DeleteGraph",
            Operation::ReadMonograph => "ReadMonograph",
            Operation::CreateToken => "CreateToken",
            Operation::DeleteToken => "DeleteToken",
        }
    }

    /// Mutations the control plane applies even when composition fails.
    pub fn tolerates_composition_failure(self) -> bool {
        matches!(self, Operation::CreateGraph | Operation::UpdateGraph)
    }

    /// Lookups whose not-found status is meaningful to the caller.
    pub fn reports_not_found(self) -> bool {
        matches!(self, Operation::ReadGraph | Operation::ReadMonograph)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    NotFound,
    CompositionFailed,
    Generic,
}

/// A classified failure of one client operation.
#[derive(Debug, Error)]
#[error("{reason} failed ({status}): {message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub reason: Operation,
    pub status: StatusCode,
    pub message: String,
    #[source]
    pub source: Option<TransportError>,
}

impl ApiError {
    pub(crate) fn transport(reason: Operation, source: TransportError) -> Self {
        Self {
            kind: ApiErrorKind::Generic,
            reason,
            status: StatusCode::Unknown,
            message: source.to_string(),
            source: Some(source),
        }
    }

    pub(crate) fn nil_response(reason: Operation) -> Self {
        Self {
            kind: ApiErrorKind::Generic,
            reason,
            status: StatusCode::Unknown,
            message: "the server response is nil".to_owned(),
            source: None,
        }
    }

    pub(crate) fn from_status(reason: Operation, status: StatusCode, details: Option<String>) -> Self {
        let kind = match status {
            StatusCode::ErrSubgraphCompositionFailed if reason.tolerates_composition_failure() => {
                ApiErrorKind::CompositionFailed
            }
            StatusCode::ErrNotFound if reason.reports_not_found() => ApiErrorKind::NotFound,
            _ => ApiErrorKind::Generic,
        };
        Self {
            kind,
            reason,
            status,
            message: details
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| status.as_str().to_owned()),
            source: None,
        }
    }

    /// `OK` status but the payload the operation needs is absent.
    pub(crate) fn missing_payload(reason: Operation, what: &str) -> Self {
        Self {
            kind: ApiErrorKind::Generic,
            reason,
            status: StatusCode::Ok,
            message: format!("response carried no {what}"),
            source: None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ApiErrorKind::NotFound
    }

    pub fn is_composition_failed(&self) -> bool {
        self.kind == ApiErrorKind::CompositionFailed
    }
}
