//! Router token reconciler.
//!
//! The control plane can create and delete router tokens but cannot read
//! them back, and the token value is only ever returned by create. Every
//! declared field therefore forces replacement.

use async_trait::async_trait;

use graphctl_client::PlatformClient;
use graphctl_core::{RouterTokenState, ValidationError};

use crate::diagnostics::{Diagnostic, Diagnostics, ReconcileOutcome};
use crate::resource::Resource;
use crate::schema::{Attribute, ResourceSchema};

#[derive(Debug, Clone)]
pub struct RouterTokenResource {
    client: PlatformClient,
}

fn missing_name(action: &str, token: &RouterTokenState) -> Diagnostic {
    Diagnostic::caller_contract(format!(
        "Cannot {action} router token without a name. Graph name: {}, namespace: {}",
        token.graph_name, token.namespace
    ))
}

pub fn schema() -> ResourceSchema {
    ResourceSchema {
        type_name: "router_token",
        description: "A credential a router uses to fetch its federated graph's config.",
        attributes: vec![
            Attribute::required("name", "Name of the token.").replace(),
            Attribute::required("graph_name", "Federated graph the token belongs to.")
                .replace(),
            Attribute::optional("namespace", "Namespace of the graph. Defaults to \"default\".")
                .replace(),
            Attribute::computed("token", "The token value.").sensitive(),
        ],
    }
}

#[async_trait]
impl Resource for RouterTokenResource {
    type Model = RouterTokenState;

    fn configure(client: PlatformClient) -> Self {
        Self { client }
    }

    fn schema(&self) -> ResourceSchema {
        schema()
    }

    async fn create(&self, planned: RouterTokenState) -> ReconcileOutcome<RouterTokenState> {
        let diags = Diagnostics::new();
        if planned.name.trim().is_empty() {
            return diags.fail(Diagnostic::validation(&ValidationError::MissingField {
                field: "name",
            }));
        }
        if planned.graph_name.trim().is_empty() {
            return diags.fail(Diagnostic::validation(&ValidationError::MissingField {
                field: "graph_name",
            }));
        }

        let created = self
            .client
            .create_token(&planned.name, &planned.graph_name, &planned.namespace)
            .await;
        match created {
            Ok(token) => {
                tracing::info!(
                    name = %planned.name,
                    graph_name = %planned.graph_name,
                    namespace = %planned.namespace,
                    "created router token"
                );
                diags.finish(RouterTokenState {
                    token: Some(token),
                    ..planned
                })
            }
            Err(e) => diags.fail(Diagnostic::api("Error creating router token", &e)),
        }
    }

    async fn read(&self, current: RouterTokenState) -> ReconcileOutcome<Option<RouterTokenState>> {
        let diags = Diagnostics::new();
        if current.name.is_empty() {
            return diags.fail(missing_name("read", &current));
        }
        diags.finish(Some(current))
    }

    async fn update(
        &self,
        planned: RouterTokenState,
        prior: &RouterTokenState,
    ) -> ReconcileOutcome<RouterTokenState> {
        let diags = Diagnostics::new();
        if prior.name.is_empty() {
            return diags.fail(missing_name("update", prior));
        }
        diags.finish(RouterTokenState {
            token: prior.token.clone(),
            ..planned
        })
    }

    async fn delete(&self, current: &RouterTokenState) -> ReconcileOutcome<()> {
        let diags = Diagnostics::new();
        if current.name.is_empty() {
            return diags.fail(missing_name("delete", current));
        }
        if let Err(e) = self
            .client
            .delete_token(&current.name, &current.namespace)
            .await
        {
            return diags.fail(Diagnostic::api(
                format!(
                    "Could not delete router token '{}' in namespace '{}'",
                    current.name, current.namespace
                ),
                &e,
            ));
        }
        tracing::info!(
            name = %current.name,
            graph_name = %current.graph_name,
            namespace = %current.namespace,
            "deleted router token"
        );
        diags.finish(())
    }

    fn import(&self, _id: &str) -> ReconcileOutcome<RouterTokenState> {
        Diagnostics::new().fail(Diagnostic::caller_contract(
            "Router tokens cannot be imported: the token value is only returned on create",
        ))
    }
}
