use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*-\s*(\d+)").expect("valid range regex"));
static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)").expect("valid number regex"));

pub const DEFAULT_CARBS: f64 = 30.0;
pub const DEFAULT_PROTEIN: f64 = 20.0;
pub const DEFAULT_FAT: f64 = 15.0;
/// Midpoint of the "300-500" calorie estimate used when none is reported.
pub const DEFAULT_CALORIES: f64 = 400.0;

/// A nutrient quantity as the food agent reports it: a plain number, or
/// free text such as `"45g"` or `"30-60g"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NutrientValue {
    Number(f64),
    Text(String),
}

impl NutrientValue {
    /// Numeric amount: ranges collapse to their midpoint, text takes its
    /// first integer, anything else is 0.
    pub fn amount(&self) -> f64 {
        match self {
            NutrientValue::Number(n) if n.is_finite() => *n,
            NutrientValue::Number(_) => 0.0,
            NutrientValue::Text(text) => parse_amount(text),
        }
    }
}

fn parse_amount(text: &str) -> f64 {
    if let Some(caps) = RANGE_RE.captures(text) {
        let lo: f64 = caps[1].parse().unwrap_or(0.0);
        let hi: f64 = caps[2].parse().unwrap_or(0.0);
        return (lo + hi) / 2.0;
    }
    NUMBER_RE
        .captures(text)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0.0)
}

/// Structured nutrient breakdown attached to a food log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientBreakdown {
    #[serde(default, alias = "carbohydrates", skip_serializing_if = "Option::is_none")]
    pub carbs: Option<NutrientValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<NutrientValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<NutrientValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calories: Option<NutrientValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benefits: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concerns: Option<String>,
}

impl NutrientBreakdown {
    pub fn carbs_amount(&self) -> f64 {
        amount_or(&self.carbs, DEFAULT_CARBS)
    }

    pub fn protein_amount(&self) -> f64 {
        amount_or(&self.protein, DEFAULT_PROTEIN)
    }

    pub fn fat_amount(&self) -> f64 {
        amount_or(&self.fat, DEFAULT_FAT)
    }

    pub fn calories_amount(&self) -> f64 {
        amount_or(&self.calories, DEFAULT_CALORIES)
    }
}

/// Calories of a food log, falling back to [`DEFAULT_CALORIES`] when the log
/// has no breakdown or the breakdown has no calories.
pub fn calories_or_default(nutrients: Option<&NutrientBreakdown>) -> f64 {
    nutrients.map_or(DEFAULT_CALORIES, NutrientBreakdown::calories_amount)
}

fn amount_or(value: &Option<NutrientValue>, default: f64) -> f64 {
    value.as_ref().map(NutrientValue::amount).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_ranges_collapse_to_midpoint() {
        assert_eq!(NutrientValue::Text("30-60g".into()).amount(), 45.0);
        assert_eq!(NutrientValue::Text("300 - 500 kcal".into()).amount(), 400.0);
    }

    #[test]
    fn single_text_values_take_first_integer() {
        assert_eq!(NutrientValue::Text("45g".into()).amount(), 45.0);
        assert_eq!(NutrientValue::Text("about 12 grams".into()).amount(), 12.0);
        assert_eq!(NutrientValue::Text("unknown".into()).amount(), 0.0);
    }

    #[test]
    fn breakdown_accepts_numbers_strings_and_aliases() {
        let breakdown: NutrientBreakdown = serde_json::from_value(json!({
            "carbohydrates": "30-60g",
            "protein": 22,
            "calories": "350",
            "benefits": "fiber"
        }))
        .unwrap();
        assert_eq!(breakdown.carbs_amount(), 45.0);
        assert_eq!(breakdown.protein_amount(), 22.0);
        assert_eq!(breakdown.fat_amount(), DEFAULT_FAT);
        assert_eq!(breakdown.calories_amount(), 350.0);
        assert_eq!(breakdown.benefits.as_deref(), Some("fiber"));
    }

    #[test]
    fn calories_use_one_default_whether_breakdown_or_field_is_missing() {
        assert_eq!(calories_or_default(None), DEFAULT_CALORIES);
        assert_eq!(calories_or_default(Some(&NutrientBreakdown::default())), DEFAULT_CALORIES);
        let reported = NutrientBreakdown {
            calories: Some(NutrientValue::Number(250.0)),
            ..NutrientBreakdown::default()
        };
        assert_eq!(calories_or_default(Some(&reported)), 250.0);
    }
}
