//! Monograph data source.

use async_trait::async_trait;

use graphctl_client::PlatformClient;
use graphctl_core::{MonographLookup, MonographState, ValidationError};

use crate::diagnostics::{Diagnostic, Diagnostics, ReconcileOutcome};
use crate::resource::DataSource;
use crate::schema::{Attribute, ResourceSchema};

#[derive(Debug, Clone)]
pub struct MonographDataSource {
    client: PlatformClient,
}

pub fn schema() -> ResourceSchema {
    ResourceSchema {
        type_name: "monograph",
        description: "Looks up a single-subgraph graph.",
        attributes: vec![
            Attribute::required("name", "Name of the monograph."),
            Attribute::optional("namespace", "Namespace of the monograph. Defaults to \"default\"."),
            Attribute::computed("id", "Identifier of the monograph."),
            Attribute::computed("routing_url", "URL the router serves the graph on."),
            Attribute::computed("readme", "Readme of the monograph."),
            Attribute::computed("admission_webhook_url", "Admission webhook URL."),
            Attribute::computed("label_matchers", "Label matchers of the monograph."),
            Attribute::computed("websocket_subprotocol", "Subprotocol for websocket subscriptions."),
            Attribute::computed("subscription_protocol", "Protocol used for subscriptions."),
        ],
    }
}

#[async_trait]
impl DataSource for MonographDataSource {
    type Query = MonographLookup;
    type Model = MonographState;

    fn configure(client: PlatformClient) -> Self {
        Self { client }
    }

    fn schema(&self) -> ResourceSchema {
        schema()
    }

    async fn read(&self, query: MonographLookup) -> ReconcileOutcome<MonographState> {
        let diags = Diagnostics::new();
        let namespace = query.namespace;
        if query.name.trim().is_empty() {
            return diags.fail(Diagnostic::validation(&ValidationError::MissingField {
                field: "name",
            }));
        }

        match self.client.get_monograph(&query.name, &namespace).await {
            Ok(monograph) => {
                tracing::info!(
                    id = %monograph.id,
                    name = %monograph.name,
                    namespace = %monograph.namespace,
                    "read monograph"
                );
                diags.finish(monograph)
            }
            Err(e) => diags.fail(Diagnostic::api(
                format!(
                    "Could not read monograph '{}' in namespace '{}'",
                    query.name, namespace
                ),
                &e,
            )),
        }
    }
}
