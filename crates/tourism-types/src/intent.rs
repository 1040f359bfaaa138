//! Query intents and reflection verdicts.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TourismError;

/// The closed set of categories a query is routed under.
///
/// Exactly one intent is assigned per query. There is no confidence score:
/// classification is binary keyword presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Factual lookup answered with grounded QA and reflection.
    /// Examples: "What is the history of Lalibela?"
    AskFact,

    /// Multi-day itinerary generation.
    /// Examples: "Plan a 3 day trip to Harar"
    PlanTrip,

    /// Side-by-side hotel comparison.
    /// Examples: "Compare hotels in Axum and Gondar"
    CompareHotels,

    /// Overview of a destination.
    /// Examples: "Explore the Simien mountains"
    ExplorePlace,

    /// Nothing matched; answered with the fallback.
    Unsupported,
}

impl Intent {
    /// All intents, in routing-table order.
    pub const ALL: [Intent; 5] = [
        Intent::AskFact,
        Intent::PlanTrip,
        Intent::CompareHotels,
        Intent::ExplorePlace,
        Intent::Unsupported,
    ];

    /// Wire name of the intent.
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::AskFact => "ask_fact",
            Intent::PlanTrip => "plan_trip",
            Intent::CompareHotels => "compare_hotels",
            Intent::ExplorePlace => "explore_place",
            Intent::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = TourismError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .into_iter()
            .find(|intent| intent.as_str() == s)
            .ok_or_else(|| TourismError::UnknownIntent(s.to_string()))
    }
}

/// Outcome of reflecting on a generated answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Keep the answer unchanged
    Good,
    /// Regenerate the answer once
    Retry,
    /// Discard the answer in favor of the fallback
    Unknown,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Good => "good",
            Verdict::Retry => "retry",
            Verdict::Unknown => "unknown",
        }
    }

    /// Normalize raw evaluator output: surrounding whitespace stripped,
    /// lower-cased.
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    /// Exact match of an already-normalized token.
    pub fn from_normalized(token: &str) -> Option<Verdict> {
        match token {
            "good" => Some(Verdict::Good),
            "retry" => Some(Verdict::Retry),
            "unknown" => Some(Verdict::Unknown),
            _ => None,
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = TourismError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verdict::from_normalized(&Verdict::normalize(s))
            .ok_or_else(|| TourismError::UnknownVerdict(s.to_string()))
    }
}
