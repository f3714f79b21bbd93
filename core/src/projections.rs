//! Chart-ready read models derived from telemetry snapshots. Everything
//! here is pure: same collection in, same projection out.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::mealplan::MealPlan;
use crate::mood::{MoodBand, emoji_for};
use crate::nutrients::{DEFAULT_CARBS, DEFAULT_FAT, DEFAULT_PROTEIN, NutrientBreakdown, calories_or_default};
use crate::telemetry::{TelemetryCollection, TelemetryEntry, TelemetryKind, TelemetryValue};

pub const GLUCOSE_LOW_BELOW: f64 = 80.0;
pub const GLUCOSE_HIGH_ABOVE: f64 = 180.0;
pub const GLUCOSE_TARGET_MIN: f64 = 80.0;
pub const GLUCOSE_TARGET_MAX: f64 = 140.0;

pub const NO_DATA: &str = "No data";

/// Labels and values aligned index-to-index with the source collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Projects every entry of `collection`, oldest first. Labels are the
/// 12-hour time of day in `tz`.
pub fn to_chart_series(collection: &TelemetryCollection, tz: Tz) -> ChartSeries {
    let mut entries: Vec<&TelemetryEntry> = collection.entries().iter().collect();
    entries.sort_by_key(|e| e.timestamp);

    let mut series = ChartSeries {
        labels: Vec::with_capacity(entries.len()),
        values: Vec::with_capacity(entries.len()),
    };
    for entry in entries {
        series.labels.push(time_label(entry.timestamp, tz));
        series.values.push(entry.numeric_value());
    }
    series
}

/// e.g. "09:05 AM"
pub fn time_label(timestamp: DateTime<Utc>, tz: Tz) -> String {
    timestamp.with_timezone(&tz).format("%I:%M %p").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GlucoseZone {
    Low,
    Normal,
    High,
}

impl GlucoseZone {
    pub fn as_str(&self) -> &'static str {
        match self {
            GlucoseZone::Low => "low",
            GlucoseZone::Normal => "normal",
            GlucoseZone::High => "high",
        }
    }
}

/// Alert zone for point colouring. Never used to reject a reading.
pub fn classify(reading: f64) -> GlucoseZone {
    if reading > GLUCOSE_HIGH_ABOVE {
        GlucoseZone::High
    } else if reading < GLUCOSE_LOW_BELOW {
        GlucoseZone::Low
    } else {
        GlucoseZone::Normal
    }
}

pub fn in_target_range(reading: f64) -> bool {
    (GLUCOSE_TARGET_MIN..=GLUCOSE_TARGET_MAX).contains(&reading)
}

/// Zone per point of a CGM series, aligned with its values.
pub fn classify_series(series: &ChartSeries) -> Vec<GlucoseZone> {
    series.values.iter().copied().map(classify).collect()
}

/// Most recent entry, or `None` as the "no data" sentinel.
pub fn latest(collection: &TelemetryCollection) -> Option<&TelemetryEntry> {
    collection.entries().iter().max_by_key(|e| e.timestamp)
}

/// Latest-value card for one kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestSummary {
    pub kind: TelemetryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    /// Classification of the value: glucose zone or mood band
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<String>,
    pub display: String,
}

impl LatestSummary {
    pub fn no_data(kind: TelemetryKind) -> Self {
        Self {
            kind,
            timestamp: None,
            value: None,
            band: None,
            display: NO_DATA.to_string(),
        }
    }

    pub fn has_data(&self) -> bool {
        self.timestamp.is_some()
    }
}

pub fn summarize_latest(collection: &TelemetryCollection) -> LatestSummary {
    let Some(entry) = latest(collection) else {
        return LatestSummary::no_data(collection.kind());
    };
    let (band, display) = match &entry.value {
        TelemetryValue::Cgm { reading } => (
            Some(classify(*reading).as_str().to_string()),
            format!("{reading} mg/dL"),
        ),
        TelemetryValue::Mood { label, score } => {
            let score = f64::from(*score);
            (
                Some(MoodBand::for_score(score).as_str().to_string()),
                format!("{} {label}", emoji_for(score)),
            )
        }
        TelemetryValue::Food { description, .. } => (None, description.clone()),
    };
    LatestSummary {
        kind: entry.kind(),
        timestamp: Some(entry.timestamp),
        value: Some(entry.numeric_value()),
        band,
        display,
    }
}

/// Carbs/protein/fat split of one food log, for a pie chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionBreakdown {
    pub labels: [&'static str; 3],
    pub values: [f64; 3],
    pub calories: f64,
}

pub fn nutrition_breakdown(nutrients: Option<&NutrientBreakdown>) -> NutritionBreakdown {
    let values = match nutrients {
        Some(n) => [n.carbs_amount(), n.protein_amount(), n.fat_amount()],
        None => [DEFAULT_CARBS, DEFAULT_PROTEIN, DEFAULT_FAT],
    };
    NutritionBreakdown {
        labels: ["Carbs", "Protein", "Fat"],
        values,
        calories: calories_or_default(nutrients),
    }
}

/// Everything the dashboard renders, computed from one store snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub cgm: ChartSeries,
    pub cgm_zones: Vec<GlucoseZone>,
    pub mood: ChartSeries,
    pub food: ChartSeries,
    pub latest_cgm: LatestSummary,
    pub latest_mood: LatestSummary,
    pub latest_food: LatestSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_nutrition: Option<NutritionBreakdown>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_plan: Option<MealPlan>,
}

impl DashboardView {
    /// Projects each collection over its most recent `window` entries.
    pub fn project(
        cgm: &TelemetryCollection,
        mood: &TelemetryCollection,
        food: &TelemetryCollection,
        meal_plan: Option<&MealPlan>,
        window: usize,
        tz: Tz,
    ) -> Self {
        let (cgm, mood, food) = (cgm.window(window), mood.window(window), food.window(window));
        let cgm_series = to_chart_series(&cgm, tz);
        let latest_nutrition = latest(&food).map(|entry| nutrition_breakdown(entry.nutrients()));
        Self {
            cgm_zones: classify_series(&cgm_series),
            cgm: cgm_series,
            mood: to_chart_series(&mood, tz),
            food: to_chart_series(&food, tz),
            latest_cgm: summarize_latest(&cgm),
            latest_mood: summarize_latest(&mood),
            latest_food: summarize_latest(&food),
            latest_nutrition,
            meal_plan: meal_plan.cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::mood::MoodScoreTable;
    use crate::nutrients::NutrientValue;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, hour, minute, 0).unwrap()
    }

    fn cgm(entries: &[(DateTime<Utc>, f64)]) -> TelemetryCollection {
        TelemetryCollection::from_entries(
            TelemetryKind::Cgm,
            entries.iter().map(|(ts, r)| TelemetryEntry::cgm(*ts, *r)).collect(),
        )
    }

    #[test]
    fn series_is_aligned_with_collection() {
        let collection = cgm(&[(at(14, 30), 190.0), (at(9, 5), 95.0), (at(12, 0), 120.0)]);
        let series = to_chart_series(&collection, Tz::UTC);
        assert_eq!(series.labels.len(), collection.len());
        assert_eq!(series.values.len(), collection.len());
        assert_eq!(series.labels, vec!["09:05 AM", "12:00 PM", "02:30 PM"]);
        assert_eq!(series.values, vec![95.0, 120.0, 190.0]);
    }

    #[test]
    fn series_ignores_input_permutation() {
        let points = [(at(8, 0), 100.0), (at(9, 0), 110.0), (at(10, 0), 120.0), (at(11, 0), 130.0)];
        let expected = to_chart_series(&cgm(&points), Tz::UTC);
        let mut reversed = points;
        reversed.reverse();
        assert_eq!(to_chart_series(&cgm(&reversed), Tz::UTC), expected);
        let rotated = [points[2], points[0], points[3], points[1]];
        assert_eq!(to_chart_series(&cgm(&rotated), Tz::UTC), expected);
    }

    #[test]
    fn empty_collection_projects_empty_series() {
        let series = to_chart_series(&TelemetryCollection::new(TelemetryKind::Mood), Tz::UTC);
        assert!(series.labels.is_empty());
        assert!(series.values.is_empty());
    }

    #[test]
    fn labels_follow_display_timezone() {
        let tz: Tz = "America/New_York".parse().unwrap();
        assert_eq!(time_label(at(14, 0), tz), "09:00 AM");
    }

    #[test]
    fn classify_uses_alert_thresholds() {
        assert_eq!(classify(79.9), GlucoseZone::Low);
        assert_eq!(classify(80.0), GlucoseZone::Normal);
        assert_eq!(classify(180.0), GlucoseZone::Normal);
        assert_eq!(classify(180.5), GlucoseZone::High);
        assert!(in_target_range(140.0));
        assert!(!in_target_range(141.0));
    }

    #[test]
    fn latest_summary_reports_sentinel_when_empty() {
        let summary = summarize_latest(&TelemetryCollection::new(TelemetryKind::Cgm));
        assert!(!summary.has_data());
        assert_eq!(summary.display, NO_DATA);
        assert!(latest(&TelemetryCollection::new(TelemetryKind::Food)).is_none());
    }

    #[test]
    fn latest_mood_summary_uses_canonical_band() {
        let table = MoodScoreTable::canonical();
        let mood = TelemetryCollection::from_entries(
            TelemetryKind::Mood,
            vec![
                TelemetryEntry::mood(at(10, 0), "happy", table),
                TelemetryEntry::mood(at(9, 0), "sad", table),
            ],
        );
        let summary = summarize_latest(&mood);
        assert_eq!(summary.value, Some(4.0));
        assert_eq!(summary.band.as_deref(), Some("great"));
        assert_eq!(summary.display, "😊 happy");
    }

    #[test]
    fn nutrition_breakdown_defaults_without_nutrients() {
        let split = nutrition_breakdown(None);
        assert_eq!(split.values, [30.0, 20.0, 15.0]);
        assert_eq!(split.calories, 400.0);

        let parsed = nutrition_breakdown(Some(&NutrientBreakdown {
            carbs: Some(NutrientValue::Text("30-60g".into())),
            protein: Some(NutrientValue::Number(12.0)),
            ..Default::default()
        }));
        assert_eq!(parsed.values, [45.0, 12.0, 15.0]);
    }

    #[test]
    fn dashboard_projects_rolling_window() {
        let points: Vec<_> = (0..9)
            .map(|i| (at(8, 0) + Duration::minutes(i * 10), 100.0 + i as f64))
            .collect();
        let view = DashboardView::project(
            &cgm(&points),
            &TelemetryCollection::new(TelemetryKind::Mood),
            &TelemetryCollection::new(TelemetryKind::Food),
            None,
            7,
            Tz::UTC,
        );
        assert_eq!(view.cgm.len(), 7);
        assert_eq!(view.cgm_zones.len(), 7);
        assert_eq!(view.cgm.values[0], 102.0);
        assert_eq!(view.latest_cgm.value, Some(108.0));
        assert!(view.mood.is_empty());
        assert!(!view.latest_food.has_data());
        assert!(view.latest_nutrition.is_none());
    }
}
