use nova_core::error::ValidationError;
use serde::{Deserialize, Serialize};

use crate::client::ApiClient;
use crate::error::{Result, SyncError};

const USERS_PATH: &str = "/users";

/// One entry of the backend's user directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dietary_preference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_conditions: Option<String>,
}

impl UserRecord {
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            format!("User {}", self.id)
        } else {
            parts.join(" ")
        }
    }
}

/// A positive integer, or `InvalidUserId`.
pub fn parse_user_id(raw: &str) -> std::result::Result<u64, ValidationError> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id >= 1)
        .ok_or_else(|| ValidationError::InvalidUserId { raw: raw.to_string() })
}

pub async fn fetch_users(client: &ApiClient) -> Result<Vec<UserRecord>> {
    let body = client.get_json(USERS_PATH, &[]).await?;
    serde_json::from_value(body).map_err(|e| SyncError::MalformedResponse {
        endpoint: USERS_PATH.to_string(),
        message: e.to_string(),
    })
}

/// Parses `raw` and confirms the id is in the directory.
pub async fn resolve_user(client: &ApiClient, raw: &str) -> Result<UserRecord> {
    let id = parse_user_id(raw)?;
    let users = fetch_users(client).await?;
    let user = users
        .into_iter()
        .find(|user| user.id == id)
        .ok_or(SyncError::UnknownUser(id))?;
    tracing::debug!(user_id = id, "user resolved");
    Ok(user)
}
