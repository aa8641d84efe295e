//! Lifecycle capabilities the host invokes on each resource kind.

use async_trait::async_trait;

use graphctl_client::PlatformClient;

use crate::diagnostics::ReconcileOutcome;
use crate::schema::ResourceSchema;

/// A managed resource kind.
///
/// Implementations hold only the injected client, so one value can serve
/// any number of resource instances. Methods never persist anything; the
/// host stores the returned model.
#[async_trait]
pub trait Resource: Send + Sync {
    type Model: Clone + Send + Sync;

    fn configure(client: PlatformClient) -> Self
    where
        Self: Sized;

    fn schema(&self) -> ResourceSchema;

    /// Create `planned` remotely and return the tracked model.
    async fn create(&self, planned: Self::Model) -> ReconcileOutcome<Self::Model>;

    /// Refresh `current` from the control plane. `None` means the resource
    /// is gone and must be dropped from tracked state.
    async fn read(&self, current: Self::Model) -> ReconcileOutcome<Option<Self::Model>>;

    /// Apply `planned` over `prior` in place.
    async fn update(&self, planned: Self::Model, prior: &Self::Model)
        -> ReconcileOutcome<Self::Model>;

    async fn delete(&self, current: &Self::Model) -> ReconcileOutcome<()>;

    /// Start tracking an existing resource by identifier.
    fn import(&self, id: &str) -> ReconcileOutcome<Self::Model>;
}

/// A read-only lookup.
#[async_trait]
pub trait DataSource: Send + Sync {
    type Query: Send;
    type Model: Send;

    fn configure(client: PlatformClient) -> Self
    where
        Self: Sized;

    fn schema(&self) -> ResourceSchema;

    async fn read(&self, query: Self::Query) -> ReconcileOutcome<Self::Model>;
}
