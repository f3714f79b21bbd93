use nova_core::agents::AgentKind;
use nova_core::error::ValidationError;
use nova_core::mealplan::MealSuggestion;
use nova_core::nutrients::NutrientBreakdown;
use serde_json::{Value, json};

use crate::client::ApiClient;
use crate::error::{Result, SyncError};

/// User input for one agent, already parsed into the shape its payload needs.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentInput {
    Greeting,
    Mood(String),
    Cgm(f64),
    Food(String),
    Mealplan,
    Interrupt(String),
}

impl AgentInput {
    /// Parses raw UI input for `kind`. Text kinds reject blank input, `cgm`
    /// rejects anything that is not a finite number. Greeting and mealplan
    /// ignore the input.
    pub fn parse(kind: AgentKind, raw: &str) -> std::result::Result<Self, ValidationError> {
        let text = raw.trim();
        let require_text = |field: &'static str| {
            if text.is_empty() {
                Err(ValidationError::EmptyInput { field })
            } else {
                Ok(text.to_string())
            }
        };
        match kind {
            AgentKind::Greeting => Ok(AgentInput::Greeting),
            AgentKind::Mealplan => Ok(AgentInput::Mealplan),
            AgentKind::Mood => require_text("mood").map(AgentInput::Mood),
            AgentKind::Food => require_text("description").map(AgentInput::Food),
            AgentKind::Interrupt => require_text("query").map(AgentInput::Interrupt),
            AgentKind::Cgm => {
                let raw = require_text("reading")?;
                raw.parse::<f64>()
                    .ok()
                    .filter(|reading| reading.is_finite())
                    .map(AgentInput::Cgm)
                    .ok_or(ValidationError::NotNumeric { raw })
            }
        }
    }

    pub fn kind(&self) -> AgentKind {
        match self {
            AgentInput::Greeting => AgentKind::Greeting,
            AgentInput::Mood(_) => AgentKind::Mood,
            AgentInput::Cgm(_) => AgentKind::Cgm,
            AgentInput::Food(_) => AgentKind::Food,
            AgentInput::Mealplan => AgentKind::Mealplan,
            AgentInput::Interrupt(_) => AgentKind::Interrupt,
        }
    }
}

/// A fully built agent call. Every agent is a POST with a JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentRequest {
    pub kind: AgentKind,
    pub endpoint: &'static str,
    pub payload: Value,
}

/// The agent's answer, with the display message already resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentReply {
    pub kind: AgentKind,
    pub message: String,
    pub body: Value,
}

impl AgentReply {
    pub fn mood_score(&self) -> Option<i64> {
        self.body.get("mood_score").and_then(Value::as_i64)
    }

    /// Nutrients reported by the food agent; malformed blocks are ignored.
    pub fn nutrients(&self) -> Option<NutrientBreakdown> {
        let raw = self.body.get("nutrients").filter(|v| v.is_object())?;
        serde_json::from_value(raw.clone()).ok()
    }

    /// Meal suggestions; entries that do not decode are skipped.
    pub fn suggestions(&self) -> Vec<MealSuggestion> {
        self.body
            .get("suggestions")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| serde_json::from_value(item.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub fn endpoint(kind: AgentKind) -> &'static str {
    match kind {
        AgentKind::Greeting => "/chat/",
        AgentKind::Mood => "/mood",
        AgentKind::Cgm => "/cgm",
        AgentKind::Food => "/food",
        AgentKind::Mealplan => "/mealplan",
        AgentKind::Interrupt => "/interrupt",
    }
}

/// Resolves the display message of an agent reply.
///
/// Order: `personalized_message` (mealplan only), `message`, `prompt`, then
/// the kind default. Blank strings count as missing.
pub fn extract_message(kind: AgentKind, body: &Value) -> String {
    let preferred: &[&str] = match kind {
        AgentKind::Mealplan => &["personalized_message", "message", "prompt"],
        _ => &["message", "prompt"],
    };
    preferred
        .iter()
        .filter_map(|field| body.get(*field).and_then(Value::as_str))
        .map(str::trim)
        .find(|text| !text.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| kind.default_message().to_string())
}

/// Explicit `ok: false` or `success: false` in an otherwise 2xx answer.
fn is_rejection(body: &Value) -> bool {
    ["ok", "success"]
        .iter()
        .any(|field| body.get(*field).and_then(Value::as_bool) == Some(false))
}

/// Maps each agent kind to its endpoint, payload and reply parsing.
#[derive(Clone, Debug)]
pub struct AgentRouter {
    client: ApiClient,
}

impl AgentRouter {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Parses `raw` and builds the request. Invalid input never leaves this
    /// function.
    pub fn build(
        &self,
        kind: AgentKind,
        user_id: u64,
        raw: &str,
    ) -> std::result::Result<AgentRequest, ValidationError> {
        AgentInput::parse(kind, raw).map(|input| self.request_for(user_id, &input))
    }

    pub fn request_for(&self, user_id: u64, input: &AgentInput) -> AgentRequest {
        let payload = match input {
            AgentInput::Greeting => json!({"user_id": user_id, "message": ""}),
            AgentInput::Mood(mood) => json!({"user_id": user_id, "mood": mood}),
            AgentInput::Cgm(reading) => json!({"user_id": user_id, "reading": reading}),
            AgentInput::Food(description) => json!({"user_id": user_id, "description": description}),
            AgentInput::Mealplan => json!({"user_id": user_id}),
            AgentInput::Interrupt(query) => json!({"user_id": user_id, "query": query}),
        };
        AgentRequest {
            kind: input.kind(),
            endpoint: endpoint(input.kind()),
            payload,
        }
    }

    pub async fn dispatch(&self, request: &AgentRequest) -> Result<AgentReply> {
        let body = self.client.post_json(request.endpoint, &request.payload).await?;
        let message = extract_message(request.kind, &body);
        if is_rejection(&body) {
            return Err(SyncError::AgentRejected {
                kind: request.kind,
                message,
            });
        }
        Ok(AgentReply {
            kind: request.kind,
            message,
            body,
        })
    }
}
