//! The one mood scale used everywhere: labels score 1 (poor) to 4 (great),
//! and every emoji/band lookup goes through the same ladder.

use serde::Serialize;

pub const NEUTRAL_MOOD_SCORE: u8 = 3;

/// Normalized label -> score, as scored by the mood agent.
const CANONICAL_ENTRIES: &[(&str, u8)] = &[
    ("happy", 4),
    ("great", 4),
    ("excellent", 4),
    ("amazing", 4),
    ("fantastic", 4),
    ("good", 3),
    ("ok", 3),
    ("okay", 3),
    ("fine", 3),
    ("neutral", 3),
    ("alright", 3),
    ("sad", 2),
    ("down", 2),
    ("low", 2),
    ("disappointed", 2),
    ("upset", 2),
    ("awful", 1),
    ("terrible", 1),
    ("depressed", 1),
    ("angry", 1),
    ("frustrated", 1),
];

static CANONICAL: MoodScoreTable = MoodScoreTable {
    entries: CANONICAL_ENTRIES,
    neutral: NEUTRAL_MOOD_SCORE,
};

#[derive(Debug)]
pub struct MoodScoreTable {
    entries: &'static [(&'static str, u8)],
    neutral: u8,
}

impl MoodScoreTable {
    pub fn canonical() -> &'static MoodScoreTable {
        &CANONICAL
    }

    /// Score a free-text mood label.
    ///
    /// An exact match on the trimmed, lowercased label wins. Otherwise the
    /// longest table key contained in the label decides, ties going to the
    /// lower score. Labels with no match score neutral.
    pub fn score(&self, label: &str) -> u8 {
        let normalized = label.trim().to_lowercase();
        if let Some((_, score)) = self.entries.iter().find(|(key, _)| *key == normalized) {
            return *score;
        }
        self.entries
            .iter()
            .filter(|(key, _)| contains_word(&normalized, key))
            .max_by(|(a_key, a_score), (b_key, b_score)| {
                a_key.len().cmp(&b_key.len()).then(b_score.cmp(a_score))
            })
            .map(|(_, score)| *score)
            .unwrap_or(self.neutral)
    }
}

/// Whole-word containment, so "ok" does not match inside "broken".
fn contains_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|c: char| !c.is_alphanumeric())
        .any(|token| token == word)
}

/// Discrete band on the canonical scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoodBand {
    Great,
    Okay,
    Low,
    Poor,
}

impl MoodBand {
    pub fn for_score(score: f64) -> Self {
        if score >= 4.0 {
            MoodBand::Great
        } else if score >= 3.0 {
            MoodBand::Okay
        } else if score >= 2.0 {
            MoodBand::Low
        } else {
            MoodBand::Poor
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            MoodBand::Great => "😊",
            MoodBand::Okay => "😐",
            MoodBand::Low => "😔",
            MoodBand::Poor => "😢",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MoodBand::Great => "great",
            MoodBand::Okay => "okay",
            MoodBand::Low => "low",
            MoodBand::Poor => "poor",
        }
    }
}

/// Emoji for a score on the canonical scale. Accepts fractional scores
/// (rolling averages).
pub fn emoji_for(score: f64) -> &'static str {
    MoodBand::for_score(score).emoji()
}
