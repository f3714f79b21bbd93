use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mood::MoodScoreTable;
use crate::nutrients::NutrientBreakdown;

/// Number of most recent entries the dashboard shows per kind.
pub const ROLLING_WINDOW: usize = 7;

/// Charted value of one food log: each meal counts once.
pub const FOOD_LOG_VALUE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryKind {
    Cgm,
    Mood,
    Food,
}

impl TelemetryKind {
    pub const ALL: [TelemetryKind; 3] = [TelemetryKind::Cgm, TelemetryKind::Mood, TelemetryKind::Food];

    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryKind::Cgm => "cgm",
            TelemetryKind::Mood => "mood",
            TelemetryKind::Food => "food",
        }
    }
}

impl fmt::Display for TelemetryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind-specific payload of a telemetry entry. The variant is the kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TelemetryValue {
    /// Glucose reading in mg/dL
    Cgm { reading: f64 },
    /// Free-text label plus its score on the canonical mood scale
    Mood { label: String, score: u8 },
    Food {
        description: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        nutrients: Option<NutrientBreakdown>,
    },
}

/// A single timestamped observation. Never mutated once stored; a
/// reconciliation replaces whole collections instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub value: TelemetryValue,
}

impl TelemetryEntry {
    pub fn cgm(timestamp: DateTime<Utc>, reading: f64) -> Self {
        Self {
            timestamp,
            value: TelemetryValue::Cgm { reading },
        }
    }

    /// Builds a mood entry, deriving the score from `table`.
    pub fn mood(timestamp: DateTime<Utc>, label: impl Into<String>, table: &MoodScoreTable) -> Self {
        let label = label.into();
        let score = table.score(&label);
        Self {
            timestamp,
            value: TelemetryValue::Mood { label, score },
        }
    }

    pub fn food(
        timestamp: DateTime<Utc>,
        description: impl Into<String>,
        nutrients: Option<NutrientBreakdown>,
    ) -> Self {
        Self {
            timestamp,
            value: TelemetryValue::Food {
                description: description.into(),
                nutrients,
            },
        }
    }

    pub fn kind(&self) -> TelemetryKind {
        match self.value {
            TelemetryValue::Cgm { .. } => TelemetryKind::Cgm,
            TelemetryValue::Mood { .. } => TelemetryKind::Mood,
            TelemetryValue::Food { .. } => TelemetryKind::Food,
        }
    }

    /// The number charted for this entry: reading, mood score, or
    /// [`FOOD_LOG_VALUE`] per meal. Food history carries no nutrients, so the
    /// food series only depends on fields the server returns.
    pub fn numeric_value(&self) -> f64 {
        match &self.value {
            TelemetryValue::Cgm { reading } => *reading,
            TelemetryValue::Mood { score, .. } => f64::from(*score),
            TelemetryValue::Food { .. } => FOOD_LOG_VALUE,
        }
    }

    pub fn nutrients(&self) -> Option<&NutrientBreakdown> {
        match &self.value {
            TelemetryValue::Food { nutrients, .. } => nutrients.as_ref(),
            _ => None,
        }
    }
}

/// Entries of one kind for one user, kept ascending by timestamp.
///
/// Storage is unbounded; [`TelemetryCollection::window`] is the view the
/// dashboard projects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryCollection {
    kind: TelemetryKind,
    entries: Vec<TelemetryEntry>,
}

impl TelemetryCollection {
    pub fn new(kind: TelemetryKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    /// Builds a sorted collection. Entries of another kind are dropped.
    /// The sort is stable, so same-instant entries keep their given order.
    pub fn from_entries(kind: TelemetryKind, entries: Vec<TelemetryEntry>) -> Self {
        let mut entries: Vec<TelemetryEntry> =
            entries.into_iter().filter(|e| e.kind() == kind).collect();
        entries.sort_by_key(|e| e.timestamp);
        Self { kind, entries }
    }

    /// Inserts after every entry at or before its timestamp. Returns false
    /// (and stores nothing) if the entry is of another kind.
    pub fn insert(&mut self, entry: TelemetryEntry) -> bool {
        if entry.kind() != self.kind {
            return false;
        }
        let at = self
            .entries
            .partition_point(|e| e.timestamp <= entry.timestamp);
        self.entries.insert(at, entry);
        true
    }

    pub fn kind(&self) -> TelemetryKind {
        self.kind
    }

    pub fn entries(&self) -> &[TelemetryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&TelemetryEntry> {
        self.entries.last()
    }

    /// The `size` most recent entries, still ascending.
    pub fn window(&self, size: usize) -> TelemetryCollection {
        let start = self.entries.len().saturating_sub(size);
        Self {
            kind: self.kind,
            entries: self.entries[start..].to_vec(),
        }
    }
}

/// Parses the timestamp shapes the backend emits: RFC 3339, or a naive
/// `YYYY-MM-DD HH:MM:SS[.f]` (space or `T` separated) taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, minute, 0).unwrap()
    }

    #[test]
    fn from_entries_sorts_ascending_and_drops_foreign_kinds() {
        let collection = TelemetryCollection::from_entries(
            TelemetryKind::Cgm,
            vec![
                TelemetryEntry::cgm(at(30), 150.0),
                TelemetryEntry::food(at(5), "toast", None),
                TelemetryEntry::cgm(at(10), 110.0),
            ],
        );
        let stamps: Vec<_> = collection.entries().iter().map(|e| e.timestamp).collect();
        assert_eq!(stamps, vec![at(10), at(30)]);
    }

    #[test]
    fn insert_keeps_order_and_rejects_other_kinds() {
        let mut collection = TelemetryCollection::new(TelemetryKind::Cgm);
        assert!(collection.insert(TelemetryEntry::cgm(at(20), 120.0)));
        assert!(collection.insert(TelemetryEntry::cgm(at(10), 100.0)));
        assert!(collection.insert(TelemetryEntry::cgm(at(20), 130.0)));
        assert!(!collection.insert(TelemetryEntry::food(at(15), "apple", None)));

        let readings: Vec<_> = collection.entries().iter().map(|e| e.numeric_value()).collect();
        assert_eq!(readings, vec![100.0, 120.0, 130.0]);
        assert_eq!(collection.latest().unwrap().numeric_value(), 130.0);
    }

    #[test]
    fn window_keeps_the_most_recent_entries() {
        let base = at(0);
        let entries = (0..10)
            .map(|i| TelemetryEntry::cgm(base + Duration::minutes(i), 100.0 + i as f64))
            .collect();
        let collection = TelemetryCollection::from_entries(TelemetryKind::Cgm, entries);

        let window = collection.window(ROLLING_WINDOW);
        assert_eq!(window.len(), ROLLING_WINDOW);
        assert_eq!(window.entries()[0].numeric_value(), 103.0);
        assert_eq!(collection.len(), 10);
        assert_eq!(collection.window(50).len(), 10);
    }

    #[test]
    fn mood_entries_derive_canonical_score() {
        let entry = TelemetryEntry::mood(at(0), "Happy", MoodScoreTable::canonical());
        assert_eq!(entry.numeric_value(), 4.0);
        assert_eq!(entry.kind(), TelemetryKind::Mood);
    }

    #[test]
    fn food_value_ignores_agent_nutrients() {
        let nutrients = NutrientBreakdown {
            calories: Some(crate::nutrients::NutrientValue::Text("300-340".into())),
            ..NutrientBreakdown::default()
        };
        let optimistic = TelemetryEntry::food(at(0), "pasta", Some(nutrients));
        let reconciled = TelemetryEntry::food(at(0), "pasta", None);
        assert_eq!(optimistic.numeric_value(), FOOD_LOG_VALUE);
        assert_eq!(reconciled.numeric_value(), optimistic.numeric_value());
        assert!(optimistic.nutrients().is_some());
        assert!(reconciled.nutrients().is_none());
    }

    #[test]
    fn entry_serializes_with_flat_kind_tag() {
        let json = serde_json::to_value(TelemetryEntry::cgm(at(0), 142.0)).unwrap();
        assert_eq!(json["kind"], "cgm");
        assert_eq!(json["reading"], 142.0);
        assert!(json["timestamp"].as_str().unwrap().starts_with("2025-03-01T09:00:00"));
    }

    #[test]
    fn parse_timestamp_accepts_backend_shapes() {
        let expected = at(5);
        assert_eq!(parse_timestamp("2025-03-01T09:05:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T10:05:00+01:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01 09:05:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-01T09:05:00.000"), Some(expected));
        assert_eq!(parse_timestamp("yesterday"), None);
    }
}
