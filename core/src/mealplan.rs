use serde::{Deserialize, Serialize};

/// Fewer suggestions than this and the backend answer is treated as degraded.
pub const MIN_SUGGESTIONS: usize = 3;

/// One meal proposed by the meal-planning agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSuggestion {
    /// "Breakfast" | "Lunch" | "Dinner" (exact, case-sensitive) when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<String>,
    #[serde(default, rename = "meal", alias = "text")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macros: Option<Macros>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<String>,
}

/// Macros of a single suggestion; any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Macros {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(default, alias = "carbs", skip_serializing_if = "Option::is_none")]
    pub carb: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroTotals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl MacroTotals {
    fn add(&mut self, macros: &Macros) {
        self.calories += macros.calories.unwrap_or(0.0);
        self.protein += macros.protein.unwrap_or(0.0);
        self.carbs += macros.carb.unwrap_or(0.0);
        self.fat += macros.fat.unwrap_or(0.0);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealPlan {
    pub breakfast: String,
    pub lunch: String,
    pub dinner: String,
    pub total_macros: MacroTotals,
    /// True when the static plan stood in for a degraded backend answer
    pub fallback: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<MealSuggestion>,
}

impl MealPlan {
    /// Shown when the agent returns fewer than three suggestions.
    pub fn fallback() -> Self {
        Self {
            breakfast: "Oatmeal with berries and nuts (350 cal)".to_string(),
            lunch: "Grilled chicken salad with quinoa (450 cal)".to_string(),
            dinner: "Salmon with steamed vegetables (400 cal)".to_string(),
            total_macros: MacroTotals {
                calories: 1200.0,
                protein: 85.0,
                carbs: 120.0,
                fat: 45.0,
            },
            fallback: true,
            suggestions: Vec::new(),
        }
    }
}

/// Reduces the agent's suggestions into breakfast/lunch/dinner slots and
/// macro totals summed over every suggestion.
pub fn assemble(suggestions: &[MealSuggestion]) -> MealPlan {
    if suggestions.len() < MIN_SUGGESTIONS {
        return MealPlan::fallback();
    }

    let mut total_macros = MacroTotals::default();
    for macros in suggestions.iter().filter_map(|s| s.macros.as_ref()) {
        total_macros.add(macros);
    }

    MealPlan {
        breakfast: slot_text(suggestions, "Breakfast", 0),
        lunch: slot_text(suggestions, "Lunch", 1),
        dinner: slot_text(suggestions, "Dinner", 2),
        total_macros,
        fallback: false,
        suggestions: suggestions.to_vec(),
    }
}

fn slot_text(suggestions: &[MealSuggestion], meal_type: &str, position: usize) -> String {
    let chosen = suggestions
        .iter()
        .find(|s| s.meal_type.as_deref() == Some(meal_type))
        .unwrap_or(&suggestions[position]);
    if chosen.text.trim().is_empty() {
        format!("{meal_type} meal")
    } else {
        chosen.text.clone()
    }
}
