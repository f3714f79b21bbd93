use std::sync::Arc;

use nova_core::agents::AgentKind;
use nova_core::projections::DashboardView;
use nova_core::telemetry::{TelemetryCollection, TelemetryKind};
use uuid::Uuid;

use crate::client::ApiClient;
use crate::config::SyncConfig;
use crate::coordinator::{Ack, WriteCoordinator};
use crate::error::{Result, SyncError};
use crate::reconcile::{ReconcileScheduler, ReconciliationLoader, ReloadReport};
use crate::router::AgentRouter;
use crate::store::SharedStore;
use crate::users::{UserRecord, resolve_user};

/// Everything one confirmed user's dashboard needs, from the first load to
/// teardown. Nothing outlives the session.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    user: UserRecord,
    config: SyncConfig,
    store: SharedStore,
    coordinator: WriteCoordinator,
    loader: Arc<ReconciliationLoader>,
    scheduler: Arc<ReconcileScheduler>,
}

impl Session {
    /// Looks `raw_user_id` up in the user directory and opens a session for
    /// it. The store starts empty; call [`Session::initial_load`] next.
    pub async fn open_validated(config: SyncConfig, raw_user_id: &str) -> Result<Self> {
        let client = ApiClient::new(&config)?;
        let user = resolve_user(&client, raw_user_id).await?;
        Ok(Self::with_client(config, client, user))
    }

    /// Opens a session for a user already confirmed by the directory.
    pub fn open(config: SyncConfig, user: UserRecord) -> Result<Self> {
        let client = ApiClient::new(&config)?;
        Ok(Self::with_client(config, client, user))
    }

    fn with_client(config: SyncConfig, client: ApiClient, user: UserRecord) -> Self {
        let store = SharedStore::new(user.id);
        let loader = Arc::new(ReconciliationLoader::new(
            client.clone(),
            store.clone(),
            config.history_limit,
        ));
        let scheduler = Arc::new(ReconcileScheduler::new(
            Arc::clone(&loader),
            config.reconcile_delay,
        ));
        let coordinator = WriteCoordinator::new(
            AgentRouter::new(client),
            store.clone(),
            Arc::clone(&scheduler),
        );
        let id = Uuid::now_v7();
        tracing::info!(session_id = %id, user_id = user.id, "session opened");
        Self {
            id,
            user,
            config,
            store,
            coordinator,
            loader,
            scheduler,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn user(&self) -> &UserRecord {
        &self.user
    }

    pub fn user_id(&self) -> u64 {
        self.user.id
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Full reconciliation that populates the empty store.
    pub async fn initial_load(&self) -> Result<ReloadReport> {
        self.ensure_open()?;
        Ok(self.loader.reload().await)
    }

    pub async fn submit(&self, kind: AgentKind, raw: &str) -> Result<Ack> {
        self.coordinator.submit(kind, raw).await
    }

    /// Waits for every reconciliation scheduled so far.
    pub async fn settle(&self) -> Vec<ReloadReport> {
        self.scheduler.settle().await
    }

    pub fn collection(&self, kind: TelemetryKind) -> TelemetryCollection {
        self.store.collection(kind)
    }

    pub fn view(&self) -> DashboardView {
        self.store
            .read(|store| store.view(self.config.window, self.config.timezone))
    }

    pub fn is_closed(&self) -> bool {
        self.store.read(|store| store.is_closed())
    }

    /// Cancels pending reconciliations and closes the store. Idempotent.
    pub fn teardown(&self) {
        if self.is_closed() {
            return;
        }
        self.scheduler.cancel_all();
        self.store.lock().close();
        tracing::info!(session_id = %self.id, user_id = self.user.id, "session torn down");
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(SyncError::SessionClosed)
        } else {
            Ok(())
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}
