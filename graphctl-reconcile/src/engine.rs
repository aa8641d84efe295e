//! The host side: drives reconcilers over a whole manifest.
//!
//! The engine owns no state of its own. Callers pass the tracked
//! [`StateFile`] plus a `persist` callback that runs after every resource
//! whose tracked entry changed, so an interrupted or failing run never
//! loses earlier progress. Failed lifecycle calls leave their entry
//! untouched.

use std::collections::BTreeSet;

use graphctl_client::PlatformClient;
use graphctl_core::{
    FederatedGraphState, Manifest, MonographLookup, MonographState, ResourceAddress,
    ResourceKind, ResourceModel, StateError, StateFile,
};

use crate::diagnostics::{Diagnostic, Diagnostics, ReconcileOutcome, RunReport};
use crate::error::ReconcileError;
use crate::federated_graph::FederatedGraphResource;
use crate::monograph::MonographDataSource;
use crate::plan::{ChangeAction, Plan};
use crate::resource::{DataSource, Resource};
use crate::schema::ResourceSchema;
use crate::token::RouterTokenResource;

#[derive(Debug, Clone)]
pub struct Engine {
    graphs: FederatedGraphResource,
    tokens: RouterTokenResource,
    monographs: MonographDataSource,
}

impl Engine {
    pub fn configure(client: PlatformClient) -> Self {
        Self {
            graphs: FederatedGraphResource::configure(client.clone()),
            tokens: RouterTokenResource::configure(client.clone()),
            monographs: MonographDataSource::configure(client),
        }
    }

    pub fn schemas(&self) -> Vec<ResourceSchema> {
        vec![
            self.graphs.schema(),
            self.tokens.schema(),
            self.monographs.schema(),
        ]
    }

    // -----------------------------------------------------------------------
    // 1. Refresh
    // -----------------------------------------------------------------------

    /// Read every tracked resource and fold the result into `state`.
    pub async fn refresh<F>(
        &self,
        state: &mut StateFile,
        mut persist: F,
    ) -> Result<RunReport, ReconcileError>
    where
        F: FnMut(&StateFile) -> Result<(), StateError>,
    {
        let mut report = RunReport::default();
        let tracked: Vec<(ResourceAddress, ResourceModel)> = state
            .resources
            .iter()
            .map(|(a, m)| (a.clone(), m.clone()))
            .collect();

        for (address, model) in tracked {
            let outcome = self.read_model(model).await;
            report.record(&address, "refresh", &outcome);
            match outcome.into_model() {
                Some(Some(model)) => state.insert(address, model),
                Some(None) => {
                    state.remove(&address);
                }
                None => continue,
            }
            persist(state)?;
        }
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // 2. Apply
    // -----------------------------------------------------------------------

    /// Execute `plan` against the control plane.
    ///
    /// Order: token deletes, graph deletes, graph creates and updates, token
    /// creates and updates. A replace whose delete failed is not recreated.
    pub async fn apply<F>(
        &self,
        plan: &Plan,
        state: &mut StateFile,
        mut persist: F,
    ) -> Result<RunReport, ReconcileError>
    where
        F: FnMut(&StateFile) -> Result<(), StateError>,
    {
        let mut report = RunReport::default();
        let mut blocked: BTreeSet<&ResourceAddress> = BTreeSet::new();

        for kind in [ResourceKind::RouterToken, ResourceKind::FederatedGraph] {
            for change in plan.changes.iter().filter(|c| c.address.kind == kind) {
                if !change.action.deletes() {
                    continue;
                }
                let Some(prior) = &change.prior else {
                    continue;
                };
                let outcome = self.delete_model(prior).await;
                report.record(&change.address, "delete", &outcome);
                if outcome.is_failure() {
                    blocked.insert(&change.address);
                    continue;
                }
                state.remove(&change.address);
                persist(state)?;
            }
        }

        for kind in [ResourceKind::FederatedGraph, ResourceKind::RouterToken] {
            for change in plan.changes.iter().filter(|c| c.address.kind == kind) {
                let Some(planned) = &change.planned else {
                    continue;
                };
                let outcome = match (&change.action, &change.prior) {
                    (ChangeAction::Create, _) => self.create_model(planned.clone()).await,
                    (ChangeAction::Replace { .. }, _) if !blocked.contains(&change.address) => {
                        self.create_model(planned.clone()).await
                    }
                    (ChangeAction::Update { .. }, Some(prior)) => {
                        self.update_model(planned.clone(), prior).await
                    }
                    _ => continue,
                };
                report.record(&change.address, change.action.label(), &outcome);
                if let Some(model) = outcome.into_model() {
                    state.insert(change.address.clone(), model);
                    persist(state)?;
                }
            }
        }
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // 3. Import
    // -----------------------------------------------------------------------

    /// Start tracking the resource with `id` at `address`.
    ///
    /// The identifier is taken as given. Only name and namespace come from
    /// the manifest declaration, so the follow-up read can locate the
    /// resource. Declared fields the read does not report stay unset and
    /// show up in the next plan as an update.
    pub async fn import<F>(
        &self,
        address: &ResourceAddress,
        id: &str,
        manifest: &Manifest,
        state: &mut StateFile,
        mut persist: F,
    ) -> Result<RunReport, ReconcileError>
    where
        F: FnMut(&StateFile) -> Result<(), StateError>,
    {
        if state.get(address).is_some() {
            return Err(ReconcileError::AlreadyTracked {
                address: address.clone(),
            });
        }
        let declared = manifest
            .declared(address)
            .ok_or_else(|| ReconcileError::NotDeclared {
                address: address.clone(),
            })?;

        let mut report = RunReport::default();
        let imported = match address.kind {
            ResourceKind::FederatedGraph => self.graphs.import(id).map(ResourceModel::from),
            ResourceKind::RouterToken => self.tokens.import(id).map(ResourceModel::from),
        };
        let imported = match imported {
            ReconcileOutcome::Success(model) | ReconcileOutcome::SuccessWithWarnings(model, _) => {
                model
            }
            ReconcileOutcome::Failure(diagnostic) => {
                report.record_error(address, "import", diagnostic);
                return Ok(report);
            }
        };

        let outcome = self.read_model(seed(imported, declared)).await;
        report.record(address, "import", &outcome);
        if let Some(Some(model)) = outcome.into_model() {
            state.insert(address.clone(), model);
            persist(state)?;
        }
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // 4. Data sources
    // -----------------------------------------------------------------------

    pub async fn lookup_monograph(&self, lookup: MonographLookup) -> ReconcileOutcome<MonographState> {
        self.monographs.read(lookup).await
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    async fn read_model(&self, model: ResourceModel) -> ReconcileOutcome<Option<ResourceModel>> {
        match model {
            ResourceModel::FederatedGraph(graph) => self
                .graphs
                .read(graph)
                .await
                .map(|m| m.map(ResourceModel::from)),
            ResourceModel::RouterToken(token) => self
                .tokens
                .read(token)
                .await
                .map(|m| m.map(ResourceModel::from)),
        }
    }

    async fn create_model(&self, planned: ResourceModel) -> ReconcileOutcome<ResourceModel> {
        match planned {
            ResourceModel::FederatedGraph(graph) => {
                self.graphs.create(graph).await.map(ResourceModel::from)
            }
            ResourceModel::RouterToken(token) => {
                self.tokens.create(token).await.map(ResourceModel::from)
            }
        }
    }

    async fn update_model(
        &self,
        planned: ResourceModel,
        prior: &ResourceModel,
    ) -> ReconcileOutcome<ResourceModel> {
        match (planned, prior) {
            (ResourceModel::FederatedGraph(new), ResourceModel::FederatedGraph(old)) => {
                self.graphs.update(new, old).await.map(ResourceModel::from)
            }
            (ResourceModel::RouterToken(new), ResourceModel::RouterToken(old)) => {
                self.tokens.update(new, old).await.map(ResourceModel::from)
            }
            (new, old) => Diagnostics::new().fail(Diagnostic::caller_contract(format!(
                "cannot update a {} with a {} model",
                old.kind(),
                new.kind()
            ))),
        }
    }

    async fn delete_model(&self, current: &ResourceModel) -> ReconcileOutcome<()> {
        match current {
            ResourceModel::FederatedGraph(graph) => self.graphs.delete(graph).await,
            ResourceModel::RouterToken(token) => self.tokens.delete(token).await,
        }
    }
}

fn seed(imported: ResourceModel, declared: ResourceModel) -> ResourceModel {
    match (imported, declared) {
        (ResourceModel::FederatedGraph(imported), ResourceModel::FederatedGraph(declared)) => {
            ResourceModel::from(FederatedGraphState {
                id: imported.id,
                name: declared.name,
                namespace: declared.namespace,
                ..FederatedGraphState::default()
            })
        }
        (imported, _) => imported,
    }
}
