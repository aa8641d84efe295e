//! Diagnostics aggregation.
//!
//! Every lifecycle call owns one [`Diagnostics`] collector. Warnings pile up
//! as the call proceeds; the call then ends with either
//! [`Diagnostics::finish`] (a model, with or without warnings) or
//! [`Diagnostics::fail`] (exactly one error, no model). Success and failure
//! are exclusive by construction.

use std::fmt;

use serde::Serialize;

use graphctl_client::ApiError;
use graphctl_core::{ResourceAddress, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// Where a diagnostic came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// Bad local input; nothing was sent.
    Validation,
    /// The remote resource is gone.
    NotFound,
    /// The mutation was applied but composition failed.
    CompositionFailed,
    /// Transport failure, nil envelope or any other non-OK status.
    Api,
    /// The caller broke the lifecycle contract (missing id, unsupported call).
    CallerContract,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub class: ErrorClass,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Diagnostic {
    pub fn warning(class: ErrorClass, summary: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            severity: Severity::Warning,
            class,
            summary: summary.into(),
            detail,
        }
    }

    pub fn error(class: ErrorClass, summary: impl Into<String>, detail: Option<String>) -> Self {
        Self {
            severity: Severity::Error,
            class,
            summary: summary.into(),
            detail,
        }
    }

    pub fn validation(err: &ValidationError) -> Self {
        Self::error(ErrorClass::Validation, "Invalid configuration", Some(err.to_string()))
    }

    pub fn caller_contract(summary: impl Into<String>) -> Self {
        Self::error(ErrorClass::CallerContract, summary, None)
    }

    /// A fatal diagnostic for a failed API call.
    pub fn api(summary: impl Into<String>, err: &ApiError) -> Self {
        Self::error(ErrorClass::Api, summary, Some(err.to_string()))
    }

    /// A warning for a mutation the control plane applied with composition errors.
    pub fn composition(detail: impl Into<String>) -> Self {
        Self::warning(
            ErrorClass::CompositionFailed,
            "Composition errors",
            Some(detail.into()),
        )
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.summary)?;
        if let Some(detail) = &self.detail {
            write!(f, ": {detail}")?;
        }
        Ok(())
    }
}

/// What one lifecycle call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome<T> {
    Success(T),
    SuccessWithWarnings(T, Vec<Diagnostic>),
    Failure(Diagnostic),
}

impl<T> ReconcileOutcome<T> {
    pub fn is_failure(&self) -> bool {
        matches!(self, ReconcileOutcome::Failure(_))
    }

    pub fn model(&self) -> Option<&T> {
        match self {
            ReconcileOutcome::Success(model) | ReconcileOutcome::SuccessWithWarnings(model, _) => {
                Some(model)
            }
            ReconcileOutcome::Failure(_) => None,
        }
    }

    pub fn into_model(self) -> Option<T> {
        match self {
            ReconcileOutcome::Success(model) | ReconcileOutcome::SuccessWithWarnings(model, _) => {
                Some(model)
            }
            ReconcileOutcome::Failure(_) => None,
        }
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        match self {
            ReconcileOutcome::SuccessWithWarnings(_, warnings) => warnings,
            _ => &[],
        }
    }

    pub fn error(&self) -> Option<&Diagnostic> {
        match self {
            ReconcileOutcome::Failure(diagnostic) => Some(diagnostic),
            _ => None,
        }
    }

    /// All attached diagnostics: the warnings, or the single error.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            ReconcileOutcome::Success(_) => Vec::new(),
            ReconcileOutcome::SuccessWithWarnings(_, warnings) => warnings.clone(),
            ReconcileOutcome::Failure(diagnostic) => vec![diagnostic.clone()],
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ReconcileOutcome<U> {
        match self {
            ReconcileOutcome::Success(model) => ReconcileOutcome::Success(f(model)),
            ReconcileOutcome::SuccessWithWarnings(model, warnings) => {
                ReconcileOutcome::SuccessWithWarnings(f(model), warnings)
            }
            ReconcileOutcome::Failure(diagnostic) => ReconcileOutcome::Failure(diagnostic),
        }
    }
}

/// Per-call collector.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(class = ?diagnostic.class, "{diagnostic}");
        self.warnings.push(Diagnostic {
            severity: Severity::Warning,
            ..diagnostic
        });
    }

    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// End the call with `model`.
    pub fn finish<T>(self, model: T) -> ReconcileOutcome<T> {
        if self.warnings.is_empty() {
            ReconcileOutcome::Success(model)
        } else {
            ReconcileOutcome::SuccessWithWarnings(model, self.warnings)
        }
    }

    /// End the call with a fatal `diagnostic`. Warnings collected so far were
    /// already logged and are dropped.
    pub fn fail<T>(self, diagnostic: Diagnostic) -> ReconcileOutcome<T> {
        tracing::error!(class = ?diagnostic.class, "{diagnostic}");
        ReconcileOutcome::Failure(Diagnostic {
            severity: Severity::Error,
            ..diagnostic
        })
    }
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// One resource's line in a [`RunReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub address: ResourceAddress,
    pub action: String,
    pub failed: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Outcomes of a whole refresh, apply or destroy run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub entries: Vec<ReportEntry>,
}

impl RunReport {
    pub fn record<T>(
        &mut self,
        address: &ResourceAddress,
        action: impl Into<String>,
        outcome: &ReconcileOutcome<T>,
    ) {
        self.entries.push(ReportEntry {
            address: address.clone(),
            action: action.into(),
            failed: outcome.is_failure(),
            diagnostics: outcome.diagnostics(),
        });
    }

    /// Record a failure that happened before any lifecycle call.
    pub fn record_error(
        &mut self,
        address: &ResourceAddress,
        action: impl Into<String>,
        diagnostic: Diagnostic,
    ) {
        self.entries.push(ReportEntry {
            address: address.clone(),
            action: action.into(),
            failed: true,
            diagnostics: vec![diagnostic],
        });
    }

    pub fn error_count(&self) -> usize {
        self.entries.iter().filter(|e| e.failed).count()
    }

    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .flat_map(|e| &e.diagnostics)
            .filter(|d| !d.is_error())
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphctl_core::ResourceKind;

    #[test]
    fn finish_without_warnings_is_success() {
        let outcome = Diagnostics::new().finish(7);
        assert_eq!(outcome, ReconcileOutcome::Success(7));
        assert!(outcome.warnings().is_empty());
    }

    #[test]
    fn finish_with_warnings_keeps_them() {
        let mut diags = Diagnostics::new();
        diags.warn(Diagnostic::composition("field conflict"));
        let outcome = diags.finish("model");
        assert_eq!(outcome.warnings().len(), 1);
        assert_eq!(outcome.model(), Some(&"model"));
    }

    #[test]
    fn fail_excludes_model_and_forces_error_severity() {
        let mut diags = Diagnostics::new();
        diags.warn(Diagnostic::composition("field conflict"));
        let outcome: ReconcileOutcome<()> = diags.fail(Diagnostic::warning(
            ErrorClass::Api,
            "boom",
            None,
        ));
        let err = outcome.error().expect("error");
        assert!(err.is_error());
        assert!(outcome.model().is_none());
        assert_eq!(outcome.diagnostics().len(), 1);
    }

    #[test]
    fn display_includes_detail() {
        let d = Diagnostic::error(ErrorClass::Api, "Failed", Some("ERR".to_string()));
        assert_eq!(d.to_string(), "error: Failed: ERR");
    }

    #[test]
    fn report_counts() {
        let address = ResourceAddress::new(ResourceKind::FederatedGraph, "orders");
        let mut report = RunReport::default();

        let mut diags = Diagnostics::new();
        diags.warn(Diagnostic::composition("conflict"));
        report.record(&address, "create", &diags.finish(()));
        report.record::<()>(
            &address,
            "update",
            &Diagnostics::new().fail(Diagnostic::caller_contract("missing ID")),
        );

        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.error_count(), 1);
        assert!(report.has_errors());
    }
}
