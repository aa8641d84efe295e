//! Planning: compare declared resources with tracked state.
//!
//! Plans are computed locally and make no remote calls. Fields the control
//! plane owns (`id`, `token`) are carried from tracked state into the planned
//! model so an in-place update keeps them.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_yaml::Value;
use similar::TextDiff;

use graphctl_core::{Manifest, ResourceAddress, ResourceKind, ResourceModel, StateFile};

use crate::error::ReconcileError;
use crate::schema::ResourceSchema;
use crate::{federated_graph, token};

/// What apply will do at one address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ChangeAction {
    Create,
    Update { fields: Vec<&'static str> },
    /// Destroy and recreate because an immutable field changed.
    Replace { fields: Vec<&'static str> },
    Delete,
    NoOp,
}

impl ChangeAction {
    pub fn label(&self) -> &'static str {
        match self {
            ChangeAction::Create => "create",
            ChangeAction::Update { .. } => "update",
            ChangeAction::Replace { .. } => "replace",
            ChangeAction::Delete => "delete",
            ChangeAction::NoOp => "no-op",
        }
    }

    /// Whether apply removes the tracked resource first.
    pub fn deletes(&self) -> bool {
        matches!(self, ChangeAction::Delete | ChangeAction::Replace { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedChange {
    pub address: ResourceAddress,
    pub action: ChangeAction,
    pub prior: Option<ResourceModel>,
    pub planned: Option<ResourceModel>,
}

impl PlannedChange {
    /// Unified YAML diff of prior vs planned, sensitive values redacted.
    pub fn render_diff(&self) -> Result<String, ReconcileError> {
        let schema = schema_for(self.address.kind);
        let old = redacted_yaml(self.prior.as_ref(), &schema)?;
        let new = redacted_yaml(self.planned.as_ref(), &schema)?;
        let old_header = format!("a/{}", self.address);
        let new_header = format!("b/{}", self.address);
        Ok(TextDiff::from_lines(&old, &new)
            .unified_diff()
            .header(&old_header, &new_header)
            .context_radius(3)
            .to_string())
    }
}

/// Counts per action, for summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub create: usize,
    pub update: usize,
    pub replace: usize,
    pub delete: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    pub changes: Vec<PlannedChange>,
}

impl Plan {
    /// Changes that do something.
    pub fn pending(&self) -> impl Iterator<Item = &PlannedChange> {
        self.changes
            .iter()
            .filter(|c| c.action != ChangeAction::NoOp)
    }

    pub fn has_changes(&self) -> bool {
        self.pending().next().is_some()
    }

    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary::default();
        for change in &self.changes {
            match change.action {
                ChangeAction::Create => summary.create += 1,
                ChangeAction::Update { .. } => summary.update += 1,
                ChangeAction::Replace { .. } => summary.replace += 1,
                ChangeAction::Delete => summary.delete += 1,
                ChangeAction::NoOp => {}
            }
        }
        summary
    }
}

pub fn schema_for(kind: ResourceKind) -> ResourceSchema {
    match kind {
        ResourceKind::FederatedGraph => federated_graph::schema(),
        ResourceKind::RouterToken => token::schema(),
    }
}

/// Plan the changes that converge `state` on `manifest`.
pub fn plan(manifest: &Manifest, state: &StateFile) -> Plan {
    let desired = manifest.desired();
    let addresses: BTreeSet<&ResourceAddress> =
        desired.keys().chain(state.resources.keys()).collect();

    let changes = addresses
        .into_iter()
        .map(|address| {
            let prior = state.get(address).cloned();
            let declared = desired.get(address).cloned();
            let (action, planned) = match (&prior, declared) {
                (None, Some(declared)) => (ChangeAction::Create, Some(declared)),
                (Some(_), None) => (ChangeAction::Delete, None),
                (Some(prior), Some(declared)) => diff(prior, declared),
                (None, None) => (ChangeAction::NoOp, None),
            };
            PlannedChange {
                address: address.clone(),
                action,
                prior,
                planned,
            }
        })
        .collect();
    Plan { changes }
}

/// Plan the deletion of everything tracked.
pub fn plan_destroy(state: &StateFile) -> Plan {
    let changes = state
        .resources
        .iter()
        .map(|(address, model)| PlannedChange {
            address: address.clone(),
            action: ChangeAction::Delete,
            prior: Some(model.clone()),
            planned: None,
        })
        .collect();
    Plan { changes }
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn diff(prior: &ResourceModel, declared: ResourceModel) -> (ChangeAction, Option<ResourceModel>) {
    let fields = changed_fields(prior, &declared);
    if fields.is_empty() {
        return (ChangeAction::NoOp, Some(carry_computed(prior, declared)));
    }
    let schema = schema_for(prior.kind());
    if fields.iter().any(|f| schema.requires_replace(f)) {
        // The replacement starts unmanaged, so nothing is carried over.
        return (ChangeAction::Replace { fields }, Some(declared));
    }
    (ChangeAction::Update { fields }, Some(carry_computed(prior, declared)))
}

macro_rules! changed {
    ($new:expr, $old:expr; $($field:ident),+ $(,)?) => {{
        let mut fields = Vec::new();
        $(if $new.$field != $old.$field {
            fields.push(stringify!($field));
        })+
        fields
    }};
}

/// Declared fields whose value differs between tracked and declared models.
pub fn changed_fields(prior: &ResourceModel, declared: &ResourceModel) -> Vec<&'static str> {
    match (declared, prior) {
        (ResourceModel::FederatedGraph(new), ResourceModel::FederatedGraph(old)) => changed!(
            new, old;
            name,
            namespace,
            routing_url,
            readme,
            admission_webhook_url,
            admission_webhook_secret,
            label_matchers,
        ),
        (ResourceModel::RouterToken(new), ResourceModel::RouterToken(old)) => {
            changed!(new, old; name, graph_name, namespace)
        }
        _ => vec!["kind"],
    }
}

fn carry_computed(prior: &ResourceModel, declared: ResourceModel) -> ResourceModel {
    match (declared, prior) {
        (ResourceModel::FederatedGraph(mut new), ResourceModel::FederatedGraph(old)) => {
            new.id = old.id.clone();
            new.into()
        }
        (ResourceModel::RouterToken(mut new), ResourceModel::RouterToken(old)) => {
            new.token = old.token.clone();
            new.into()
        }
        (declared, _) => declared,
    }
}

fn redacted_yaml(model: Option<&ResourceModel>, schema: &ResourceSchema) -> Result<String, ReconcileError> {
    let Some(model) = model else {
        return Ok(String::new());
    };
    let mut value = serde_yaml::to_value(model)?;
    if let Value::Mapping(map) = &mut value {
        for attribute in schema.attributes.iter().filter(|a| a.sensitive) {
            if let Some(field) = map.get_mut(attribute.name) {
                *field = Value::String("(sensitive)".to_owned());
            }
        }
    }
    Ok(serde_yaml::to_string(&value)?)
}
