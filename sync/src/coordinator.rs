use std::sync::Arc;

use chrono::Utc;
use nova_core::agents::AgentKind;
use nova_core::error::ValidationError;
use nova_core::mealplan::{MealPlan, assemble};
use nova_core::mood::MoodScoreTable;
use nova_core::nutrients::NutrientBreakdown;
use nova_core::telemetry::TelemetryEntry;
use serde::Serialize;

use crate::error::{Result, SyncError};
use crate::reconcile::ReconcileScheduler;
use crate::router::{AgentInput, AgentRouter};
use crate::store::{SharedStore, TelemetryStore};

/// Advisory CGM range accepted for manual entry, mg/dL inclusive.
pub const CGM_MIN_READING: f64 = 80.0;
pub const CGM_MAX_READING: f64 = 300.0;

/// Confirmation of a successful agent write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ack {
    pub kind: AgentKind,
    pub message: String,
    /// Score the mood agent reported, if any; the stored entry uses the
    /// canonical table instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nutrients: Option<NutrientBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_plan: Option<MealPlan>,
    /// The optimistic entry appended to the store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry: Option<TelemetryEntry>,
    pub reconcile_scheduled: bool,
}

/// Rejects manual CGM readings outside the advisory range.
pub fn check_reading(reading: f64) -> std::result::Result<f64, ValidationError> {
    if (CGM_MIN_READING..=CGM_MAX_READING).contains(&reading) {
        Ok(reading)
    } else {
        Err(ValidationError::OutOfRange {
            reading,
            min: CGM_MIN_READING,
            max: CGM_MAX_READING,
        })
    }
}

/// Sends writes through the router and folds confirmed ones into the store.
#[derive(Debug)]
pub struct WriteCoordinator {
    router: AgentRouter,
    store: SharedStore,
    scheduler: Arc<ReconcileScheduler>,
}

impl WriteCoordinator {
    pub fn new(router: AgentRouter, store: SharedStore, scheduler: Arc<ReconcileScheduler>) -> Self {
        Self {
            router,
            store,
            scheduler,
        }
    }

    /// Validates, dispatches and, on success, appends the locally known entry
    /// and schedules exactly one reconciliation. Any error leaves the store
    /// as it was.
    pub async fn submit(&self, kind: AgentKind, raw: &str) -> Result<Ack> {
        let input = AgentInput::parse(kind, raw)?;
        if let AgentInput::Cgm(reading) = input {
            check_reading(reading)?;
        }

        let user_id = self.store.read(TelemetryStore::user_id);
        if self.store.read(TelemetryStore::is_closed) {
            return Err(SyncError::SessionClosed);
        }

        let request = self.router.request_for(user_id, &input);
        let reply = self.router.dispatch(&request).await.inspect_err(|err| {
            tracing::warn!(user_id, %kind, error = %err, "agent write failed");
        })?;

        let now = Utc::now();
        let nutrients = reply.nutrients();
        let entry = match &input {
            AgentInput::Cgm(reading) => Some(TelemetryEntry::cgm(now, *reading)),
            AgentInput::Mood(label) => {
                Some(TelemetryEntry::mood(now, label.clone(), MoodScoreTable::canonical()))
            }
            AgentInput::Food(description) => {
                Some(TelemetryEntry::food(now, description.clone(), nutrients.clone()))
            }
            AgentInput::Greeting | AgentInput::Mealplan | AgentInput::Interrupt(_) => None,
        };
        let meal_plan = (kind == AgentKind::Mealplan).then(|| assemble(&reply.suggestions()));

        {
            let mut store = self.store.lock();
            let appended = entry.as_ref().is_none_or(|e| store.append(e.clone()));
            let planned = meal_plan.as_ref().is_none_or(|p| store.set_meal_plan(p.clone()));
            if !(appended && planned) {
                return Err(SyncError::SessionClosed);
            }
        }

        let collection = kind.telemetry_kind();
        let reconcile_scheduled = collection.is_some() && self.scheduler.schedule();
        tracing::info!(user_id, %kind, ?collection, reconcile_scheduled, "agent write confirmed");

        Ok(Ack {
            kind,
            message: reply.message.clone(),
            mood_score: reply.mood_score(),
            nutrients,
            meal_plan,
            entry,
            reconcile_scheduled,
        })
    }
}
