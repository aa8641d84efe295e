//! Federated graph reconciler.
//!
//! Lifecycle: `Unmanaged → Creating → Managed → Updating → Managed →
//! Deleting → Unmanaged`, plus `Managed → Unmanaged` when a read finds the
//! graph gone. Name and namespace are immutable; the planner replaces the
//! graph instead of updating them.

use async_trait::async_trait;

use graphctl_client::messages::FederatedGraph;
use graphctl_client::PlatformClient;
use graphctl_core::{FederatedGraphState, GraphDefinition, Namespace, ResourceId};

use crate::diagnostics::{Diagnostic, Diagnostics, ErrorClass, ReconcileOutcome};
use crate::resource::Resource;
use crate::schema::{Attribute, ResourceSchema};

#[derive(Debug, Clone)]
pub struct FederatedGraphResource {
    client: PlatformClient,
}

impl FederatedGraphResource {
    /// Copy the control-plane-owned fields of `remote` into `state`.
    fn absorb(state: &mut FederatedGraphState, remote: FederatedGraph) {
        state.id = Some(ResourceId::from(remote.id));
        state.name = remote.name;
        state.namespace = Namespace::new(remote.namespace);
        state.routing_url = remote.routing_url;
    }
}

pub fn schema() -> ResourceSchema {
    ResourceSchema {
        type_name: "federated_graph",
        description: "A composed API surface built from the subgraphs its label matchers select.",
        attributes: vec![
            Attribute::computed("id", "Identifier assigned by the control plane."),
            Attribute::required("name", "Name of the federated graph.").replace(),
            Attribute::optional("namespace", "Namespace of the graph. Defaults to \"default\".")
                .replace(),
            Attribute::required("routing_url", "URL the router serves the graph on."),
            Attribute::optional("readme", "Readme of the graph."),
            Attribute::optional("admission_webhook_url", "Admission webhook URL."),
            Attribute::optional("admission_webhook_secret", "Admission webhook secret.")
                .sensitive(),
            Attribute::optional("label_matchers", "Ordered key=value subgraph selectors."),
        ],
    }
}

#[async_trait]
impl Resource for FederatedGraphResource {
    type Model = FederatedGraphState;

    fn configure(client: PlatformClient) -> Self {
        Self { client }
    }

    fn schema(&self) -> ResourceSchema {
        schema()
    }

    async fn create(&self, planned: FederatedGraphState) -> ReconcileOutcome<FederatedGraphState> {
        let mut diags = Diagnostics::new();
        let definition = match GraphDefinition::try_from(&planned) {
            Ok(definition) => definition,
            Err(e) => return diags.fail(Diagnostic::validation(&e)),
        };

        match self
            .client
            .create_federated_graph(&definition, planned.admission_webhook_secret.as_ref())
            .await
        {
            Ok(applied) => {
                if let Some(degraded) = applied.degraded {
                    diags.warn(Diagnostic::composition(degraded.to_string()));
                }
            }
            Err(e) => return diags.fail(Diagnostic::api("Error creating federated graph", &e)),
        }

        let remote = match self
            .client
            .get_federated_graph(&definition.name, &definition.namespace)
            .await
        {
            Ok(remote) => remote,
            Err(e) => {
                return diags.fail(Diagnostic::api(
                    format!(
                        "Could not fetch created federated graph '{}' in namespace '{}'",
                        definition.name, definition.namespace
                    ),
                    &e,
                ))
            }
        };
        if remote.id.is_empty() {
            return diags.fail(Diagnostic::error(
                ErrorClass::Api,
                format!("Federated graph '{}' was created without an ID", definition.name),
                None,
            ));
        }

        let mut state = planned;
        Self::absorb(&mut state, remote);
        tracing::info!(
            id = state.id_str(),
            name = %state.name,
            namespace = %state.namespace,
            "created federated graph"
        );
        diags.finish(state)
    }

    async fn read(
        &self,
        current: FederatedGraphState,
    ) -> ReconcileOutcome<Option<FederatedGraphState>> {
        let mut diags = Diagnostics::new();
        if !current.has_id() {
            return diags.fail(Diagnostic::caller_contract(
                "Cannot read federated graph without an ID",
            ));
        }

        let fetched = self
            .client
            .get_federated_graph(&current.name, &current.namespace)
            .await;
        match fetched {
            Ok(remote) => {
                let mut state = current;
                state.label_matchers = remote.label_matchers.clone();
                Self::absorb(&mut state, remote);
                tracing::info!(
                    id = state.id_str(),
                    name = %state.name,
                    namespace = %state.namespace,
                    "read federated graph"
                );
                diags.finish(Some(state))
            }
            Err(e) if e.is_not_found() => {
                diags.warn(Diagnostic::warning(
                    ErrorClass::NotFound,
                    "Graph not found",
                    Some(format!("Graph '{}' not found will be recreated", current.name)),
                ));
                diags.finish(None)
            }
            Err(e) => diags.fail(Diagnostic::api(
                format!("Could not fetch federated graph '{}'", current.name),
                &e,
            )),
        }
    }

    async fn update(
        &self,
        planned: FederatedGraphState,
        prior: &FederatedGraphState,
    ) -> ReconcileOutcome<FederatedGraphState> {
        let mut diags = Diagnostics::new();
        if !prior.has_id() {
            return diags.fail(Diagnostic::caller_contract(format!(
                "Cannot update federated graph because the resource ID is missing. Graph name: {}, graph namespace: {}",
                prior.name, prior.namespace
            )));
        }

        let state = FederatedGraphState {
            id: prior.id.clone(),
            name: prior.name.clone(),
            namespace: prior.namespace.clone(),
            ..planned
        };
        let definition = match GraphDefinition::try_from(&state) {
            Ok(definition) => definition,
            Err(e) => return diags.fail(Diagnostic::validation(&e)),
        };

        let applied = match self
            .client
            .update_federated_graph(&definition, state.admission_webhook_secret.as_ref())
            .await
        {
            Ok(applied) => applied,
            Err(e) => return diags.fail(Diagnostic::api("Error updating federated graph", &e)),
        };
        if let Some(degraded) = applied.degraded {
            diags.warn(Diagnostic::composition(degraded.to_string()));
        }
        if !applied.response.is_empty() {
            let errors: Vec<String> = applied.response.iter().map(ToString::to_string).collect();
            diags.warn(Diagnostic::composition(format!(
                "Composition errors: [{}], graph name: {}, graph namespace: {}",
                errors.join("; "),
                definition.name,
                definition.namespace
            )));
        }

        tracing::info!(
            id = state.id_str(),
            name = %state.name,
            namespace = %state.namespace,
            "updated federated graph"
        );
        diags.finish(state)
    }

    async fn delete(&self, current: &FederatedGraphState) -> ReconcileOutcome<()> {
        let diags = Diagnostics::new();
        if !current.has_id() {
            return diags.fail(Diagnostic::caller_contract(format!(
                "Cannot delete the federated graph because the resource ID is missing. Graph name: {}, graph namespace: {}",
                current.name, current.namespace
            )));
        }

        if let Err(e) = self
            .client
            .delete_federated_graph(&current.name, &current.namespace)
            .await
        {
            return diags.fail(Diagnostic::api(
                format!(
                    "Could not delete federated graph '{}' in namespace '{}'",
                    current.name, current.namespace
                ),
                &e,
            ));
        }
        tracing::info!(
            id = current.id_str(),
            name = %current.name,
            namespace = %current.namespace,
            "deleted federated graph"
        );
        diags.finish(())
    }

    fn import(&self, id: &str) -> ReconcileOutcome<FederatedGraphState> {
        let diags = Diagnostics::new();
        if id.trim().is_empty() {
            return diags.fail(Diagnostic::caller_contract(
                "Cannot import a federated graph without an ID",
            ));
        }
        diags.finish(FederatedGraphState {
            id: Some(ResourceId::from(id)),
            ..FederatedGraphState::default()
        })
    }
}
