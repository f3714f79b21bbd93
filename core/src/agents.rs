use std::fmt;

use serde::{Deserialize, Serialize};

use crate::telemetry::TelemetryKind;

/// The closed set of backend agents a dashboard action can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Greeting,
    Mood,
    Cgm,
    Food,
    Mealplan,
    Interrupt,
}

impl AgentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentKind::Greeting => "greeting",
            AgentKind::Mood => "mood",
            AgentKind::Cgm => "cgm",
            AgentKind::Food => "food",
            AgentKind::Mealplan => "mealplan",
            AgentKind::Interrupt => "interrupt",
        }
    }

    /// Shown when the reply has neither `message` nor `prompt`.
    pub fn default_message(&self) -> &'static str {
        match self {
            AgentKind::Greeting => "Welcome!",
            AgentKind::Mood => "Mood logged successfully",
            AgentKind::Cgm => "CGM reading logged",
            AgentKind::Food => "Food logged successfully",
            AgentKind::Mealplan => "Meal plan generated",
            AgentKind::Interrupt => "Query processed",
        }
    }

    /// Telemetry collection a successful write lands in, if any.
    pub fn telemetry_kind(&self) -> Option<TelemetryKind> {
        match self {
            AgentKind::Mood => Some(TelemetryKind::Mood),
            AgentKind::Cgm => Some(TelemetryKind::Cgm),
            AgentKind::Food => Some(TelemetryKind::Food),
            AgentKind::Greeting | AgentKind::Mealplan | AgentKind::Interrupt => None,
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_logging_kinds_produce_telemetry() {
        assert_eq!(AgentKind::Mood.telemetry_kind(), Some(TelemetryKind::Mood));
        assert_eq!(AgentKind::Cgm.telemetry_kind(), Some(TelemetryKind::Cgm));
        assert_eq!(AgentKind::Food.telemetry_kind(), Some(TelemetryKind::Food));
        assert!(AgentKind::Greeting.telemetry_kind().is_none());
        assert!(AgentKind::Mealplan.telemetry_kind().is_none());
        assert!(AgentKind::Interrupt.telemetry_kind().is_none());
    }
}
