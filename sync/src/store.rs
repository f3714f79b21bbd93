use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono_tz::Tz;
use nova_core::mealplan::MealPlan;
use nova_core::projections::DashboardView;
use nova_core::telemetry::{TelemetryCollection, TelemetryEntry, TelemetryKind};

/// Outcome of offering a reconciliation result to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Applied,
    /// A reload issued later already landed for this kind
    Stale { newest_applied: u64 },
    /// The session was torn down
    Closed,
}

/// Per-user telemetry held for the lifetime of one session.
///
/// Only the write coordinator appends and only the reconciliation loader
/// replaces; both are crate-private. Everything else reads.
#[derive(Debug)]
pub struct TelemetryStore {
    user_id: u64,
    collections: HashMap<TelemetryKind, TelemetryCollection>,
    /// Highest reconciliation sequence applied per kind
    applied_seq: HashMap<TelemetryKind, u64>,
    meal_plan: Option<MealPlan>,
    closed: bool,
}

impl TelemetryStore {
    pub fn new(user_id: u64) -> Self {
        let collections = TelemetryKind::ALL
            .into_iter()
            .map(|kind| (kind, TelemetryCollection::new(kind)))
            .collect();
        Self {
            user_id,
            collections,
            applied_seq: HashMap::new(),
            meal_plan: None,
            closed: false,
        }
    }

    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    pub fn collection(&self, kind: TelemetryKind) -> &TelemetryCollection {
        // every kind is inserted in new() and replaced, never removed
        &self.collections[&kind]
    }

    pub fn meal_plan(&self) -> Option<&MealPlan> {
        self.meal_plan.as_ref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn applied_seq(&self, kind: TelemetryKind) -> u64 {
        self.applied_seq.get(&kind).copied().unwrap_or(0)
    }

    pub fn view(&self, window: usize, tz: Tz) -> DashboardView {
        DashboardView::project(
            self.collection(TelemetryKind::Cgm),
            self.collection(TelemetryKind::Mood),
            self.collection(TelemetryKind::Food),
            self.meal_plan.as_ref(),
            window,
            tz,
        )
    }

    /// Optimistic append after a confirmed write. Returns false once closed.
    pub(crate) fn append(&mut self, entry: TelemetryEntry) -> bool {
        if self.closed {
            return false;
        }
        self.collections
            .entry(entry.kind())
            .or_insert_with(|| TelemetryCollection::new(entry.kind()))
            .insert(entry)
    }

    /// Replaces one collection wholesale with server truth, unless a reload
    /// with a higher sequence number already did.
    pub(crate) fn replace(
        &mut self,
        kind: TelemetryKind,
        entries: Vec<TelemetryEntry>,
        seq: u64,
    ) -> ReplaceOutcome {
        if self.closed {
            return ReplaceOutcome::Closed;
        }
        let newest_applied = self.applied_seq(kind);
        if seq <= newest_applied {
            return ReplaceOutcome::Stale { newest_applied };
        }
        self.collections
            .insert(kind, TelemetryCollection::from_entries(kind, entries));
        self.applied_seq.insert(kind, seq);
        ReplaceOutcome::Applied
    }

    pub(crate) fn set_meal_plan(&mut self, plan: MealPlan) -> bool {
        if self.closed {
            return false;
        }
        self.meal_plan = Some(plan);
        true
    }

    pub(crate) fn close(&mut self) {
        self.closed = true;
    }
}

/// Handle shared by the session's coordinator, loader and readers. Locks are
/// never held across an await.
#[derive(Clone, Debug)]
pub struct SharedStore(Arc<Mutex<TelemetryStore>>);

impl SharedStore {
    pub fn new(user_id: u64) -> Self {
        Self(Arc::new(Mutex::new(TelemetryStore::new(user_id))))
    }

    pub fn lock(&self) -> MutexGuard<'_, TelemetryStore> {
        self.0.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Reads under the lock.
    pub fn read<R>(&self, f: impl FnOnce(&TelemetryStore) -> R) -> R {
        f(&self.lock())
    }

    pub fn collection(&self, kind: TelemetryKind) -> TelemetryCollection {
        self.read(|store| store.collection(kind).clone())
    }
}
