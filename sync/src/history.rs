//! Adapter between the backend's history records and canonical telemetry
//! entries. Backend field names stop here.

use nova_core::mood::MoodScoreTable;
use nova_core::nutrients::NutrientBreakdown;
use nova_core::telemetry::{TelemetryEntry, TelemetryKind, parse_timestamp};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::client::ApiClient;
use crate::error::{Result, SyncError};

#[derive(Debug, Deserialize)]
struct RawCgmRecord {
    timestamp: String,
    #[serde(alias = "reading")]
    glucose_level: f64,
}

#[derive(Debug, Deserialize)]
struct RawMoodRecord {
    timestamp: String,
    mood: String,
}

#[derive(Debug, Deserialize)]
struct RawFoodRecord {
    timestamp: String,
    #[serde(alias = "meal_description")]
    description: String,
    #[serde(default)]
    nutrients: Option<NutrientBreakdown>,
}

pub fn history_path(kind: TelemetryKind, user_id: u64) -> String {
    format!("/history/{}/{user_id}", kind.as_str())
}

/// Fetches and normalizes one kind's full history.
pub async fn fetch_history(
    client: &ApiClient,
    kind: TelemetryKind,
    user_id: u64,
    limit: u64,
    table: &MoodScoreTable,
) -> Result<Vec<TelemetryEntry>> {
    let path = history_path(kind, user_id);
    let body = client.get_json(&path, &[("limit", limit.to_string())]).await?;
    normalize(kind, &body, table).map_err(|message| SyncError::MalformedResponse {
        endpoint: path,
        message,
    })
}

/// Converts a history array into entries. A non-array body is an error;
/// individual records that cannot be read are dropped with a warning.
pub fn normalize(
    kind: TelemetryKind,
    body: &Value,
    table: &MoodScoreTable,
) -> std::result::Result<Vec<TelemetryEntry>, String> {
    let records = body
        .as_array()
        .ok_or_else(|| format!("expected an array of {kind} records"))?;

    let mut entries = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        match normalize_record(kind, record, table) {
            Ok(entry) => entries.push(entry),
            Err(reason) => {
                tracing::warn!(%kind, index, reason = %reason, "dropping unreadable history record");
            }
        }
    }
    Ok(entries)
}

fn normalize_record(
    kind: TelemetryKind,
    record: &Value,
    table: &MoodScoreTable,
) -> std::result::Result<TelemetryEntry, String> {
    let timestamp_of = |raw: &str| {
        parse_timestamp(raw).ok_or_else(|| format!("unparseable timestamp '{raw}'"))
    };
    match kind {
        TelemetryKind::Cgm => {
            let raw: RawCgmRecord = decode(record)?;
            if !raw.glucose_level.is_finite() {
                return Err("non-finite glucose level".to_string());
            }
            Ok(TelemetryEntry::cgm(timestamp_of(&raw.timestamp)?, raw.glucose_level))
        }
        TelemetryKind::Mood => {
            let raw: RawMoodRecord = decode(record)?;
            Ok(TelemetryEntry::mood(timestamp_of(&raw.timestamp)?, raw.mood, table))
        }
        TelemetryKind::Food => {
            let raw: RawFoodRecord = decode(record)?;
            Ok(TelemetryEntry::food(
                timestamp_of(&raw.timestamp)?,
                raw.description,
                raw.nutrients,
            ))
        }
    }
}

fn decode<T: DeserializeOwned>(record: &Value) -> std::result::Result<T, String> {
    T::deserialize(record).map_err(|e| e.to_string())
}
