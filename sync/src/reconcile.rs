//! Authoritative reloads and their delayed, cancellable scheduling.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use nova_core::mood::MoodScoreTable;
use nova_core::telemetry::TelemetryKind;
use serde::Serialize;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::client::ApiClient;
use crate::history::fetch_history;
use crate::store::{ReplaceOutcome, SharedStore};

/// What one reload did to each collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReloadReport {
    pub seq: u64,
    pub applied: Vec<TelemetryKind>,
    /// Kinds where a later-issued reload had already landed
    pub stale: Vec<TelemetryKind>,
    /// Kinds whose fetch failed; their collections were left as they were
    pub failed: Vec<(TelemetryKind, String)>,
    pub closed: bool,
}

impl ReloadReport {
    pub fn is_complete(&self) -> bool {
        self.applied.len() == TelemetryKind::ALL.len()
    }
}

/// Replaces the store's collections with server history. Every reload takes
/// a sequence number when it is issued so that a slow response can never
/// overwrite one issued after it.
#[derive(Debug)]
pub struct ReconciliationLoader {
    client: ApiClient,
    store: SharedStore,
    history_limit: u64,
    next_seq: AtomicU64,
}

impl ReconciliationLoader {
    pub fn new(client: ApiClient, store: SharedStore, history_limit: u64) -> Self {
        Self {
            client,
            store,
            history_limit,
            next_seq: AtomicU64::new(0),
        }
    }

    /// Fetches all three histories in parallel and replaces each collection
    /// independently. A failing kind never blocks the others.
    pub async fn reload(&self) -> ReloadReport {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let user_id = self.store.read(|store| store.user_id());
        let table = MoodScoreTable::canonical();

        let (cgm, mood, food) = tokio::join!(
            fetch_history(&self.client, TelemetryKind::Cgm, user_id, self.history_limit, table),
            fetch_history(&self.client, TelemetryKind::Mood, user_id, self.history_limit, table),
            fetch_history(&self.client, TelemetryKind::Food, user_id, self.history_limit, table),
        );

        let mut report = ReloadReport {
            seq,
            ..ReloadReport::default()
        };
        for (kind, fetched) in [
            (TelemetryKind::Cgm, cgm),
            (TelemetryKind::Mood, mood),
            (TelemetryKind::Food, food),
        ] {
            let entries = match fetched {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!(user_id, seq, %kind, error = %err, "history reload failed");
                    report.failed.push((kind, err.to_string()));
                    continue;
                }
            };
            let count = entries.len();
            match self.store.lock().replace(kind, entries, seq) {
                ReplaceOutcome::Applied => {
                    tracing::debug!(user_id, seq, %kind, count, "collection reconciled");
                    report.applied.push(kind);
                }
                ReplaceOutcome::Stale { newest_applied } => {
                    tracing::info!(user_id, seq, newest_applied, %kind, "discarding stale reload");
                    report.stale.push(kind);
                }
                ReplaceOutcome::Closed => report.closed = true,
            }
        }
        report
    }
}

/// Delayed reloads owned by one session. Dropping the scheduler aborts
/// whatever is still pending.
#[derive(Debug)]
pub struct ReconcileScheduler {
    loader: Arc<ReconciliationLoader>,
    delay: Duration,
    cancel: CancellationToken,
    tasks: Mutex<JoinSet<Option<ReloadReport>>>,
}

impl ReconcileScheduler {
    pub fn new(loader: Arc<ReconciliationLoader>, delay: Duration) -> Self {
        Self {
            loader,
            delay,
            cancel: CancellationToken::new(),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    fn tasks(&self) -> MutexGuard<'_, JoinSet<Option<ReloadReport>>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queues one reload after the configured delay. Returns false once the
    /// scheduler has been cancelled.
    pub fn schedule(&self) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        let loader = Arc::clone(&self.loader);
        let cancel = self.cancel.clone();
        let delay = self.delay;
        self.tasks().spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => None,
                _ = tokio::time::sleep(delay) => Some(loader.reload().await),
            }
        });
        true
    }

    pub fn pending(&self) -> usize {
        self.tasks().len()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Waits for every reload scheduled so far, including ones scheduled
    /// while waiting. Cancelled reloads are left out of the result.
    pub async fn settle(&self) -> Vec<ReloadReport> {
        let mut reports = Vec::new();
        loop {
            let mut batch = std::mem::take(&mut *self.tasks());
            if batch.is_empty() {
                return reports;
            }
            while let Some(joined) = batch.join_next().await {
                match joined {
                    Ok(Some(report)) => reports.push(report),
                    Ok(None) => {}
                    Err(err) if err.is_cancelled() => {}
                    Err(err) => tracing::error!(error = %err, "reconciliation task panicked"),
                }
            }
        }
    }

    /// Cancels pending reloads. Nothing scheduled afterwards will run.
    pub fn cancel_all(&self) {
        self.cancel.cancel();
        let mut tasks = self.tasks();
        let pending = tasks.len();
        tasks.abort_all();
        if pending > 0 {
            tracing::debug!(pending, "cancelled pending reconciliations");
        }
    }
}

impl Drop for ReconcileScheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
