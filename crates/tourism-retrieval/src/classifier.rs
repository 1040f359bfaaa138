//! Intent classification for queries.
//!
//! This module implements the `IntentClassifier`, which maps a raw query to
//! one of the tourism intents using keyword presence. Matching is a
//! case-insensitive substring check against the whole query. Rules are
//! evaluated in their declared order and the first rule with any hit wins,
//! so the order of [`ClassifierConfig::rules`] is the priority between
//! overlapping keyword sets.

use serde::{Deserialize, Serialize};
use tracing::debug;

use tourism_types::Intent;

/// Keywords that route a query to one intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentRule {
    pub intent: Intent,
    pub keywords: Vec<String>,
}

impl IntentRule {
    pub fn new(intent: Intent, keywords: &[&str]) -> Self {
        Self {
            intent,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Configuration for intent classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Rules in priority order
    pub rules: Vec<IntentRule>,

    /// Intent returned when no rule matches
    pub default_intent: Intent,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            rules: vec![
                IntentRule::new(
                    Intent::AskFact,
                    &[
                        "who",
                        "what",
                        "when",
                        "where",
                        "how",
                        "fact",
                        "information",
                        "tell me",
                        "question",
                        "history",
                        "details",
                        "background",
                    ],
                ),
                IntentRule::new(
                    Intent::PlanTrip,
                    &[
                        "plan",
                        "trip",
                        "itinerary",
                        "travel",
                        "schedule",
                        "days",
                        "visit",
                        "route",
                        "journey",
                        "vacation",
                        "holiday",
                    ],
                ),
                IntentRule::new(
                    Intent::CompareHotels,
                    &[
                        "compare",
                        "hotel",
                        "hotels",
                        "accommodation",
                        "stay",
                        "price",
                        "rating",
                        "location",
                        "amenities",
                    ],
                ),
                IntentRule::new(
                    Intent::ExplorePlace,
                    &[
                        "explore",
                        "location",
                        "place",
                        "overview",
                        "learn about",
                        "discover",
                        "attractions",
                        "things to do",
                        "sights",
                    ],
                ),
            ],
            default_intent: Intent::Unsupported,
        }
    }
}

/// Result of tracing a classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// The classified intent
    pub intent: Intent,

    /// Keyword that decided the match, if any
    pub matched_keyword: Option<String>,

    /// Explanation of why this intent was chosen
    pub reason: String,
}

/// Intent classifier using ordered keyword rules.
///
/// Pure and deterministic: no external calls, total over all strings.
pub struct IntentClassifier {
    config: ClassifierConfig,
}

impl IntentClassifier {
    /// Create a new classifier with default configuration.
    pub fn new() -> Self {
        Self::with_config(ClassifierConfig::default())
    }

    /// Create a classifier with custom configuration.
    ///
    /// Keywords are lower-cased; empty keywords are dropped since they would
    /// match every query.
    pub fn with_config(mut config: ClassifierConfig) -> Self {
        for rule in &mut config.rules {
            rule.keywords = rule
                .keywords
                .iter()
                .map(|k| k.to_lowercase())
                .filter(|k| !k.is_empty())
                .collect();
        }
        Self { config }
    }

    /// Intents in the order they are tried.
    pub fn priority(&self) -> Vec<Intent> {
        self.config.rules.iter().map(|r| r.intent).collect()
    }

    /// Classify the intent of a query.
    pub fn classify(&self, query: &str) -> Intent {
        self.trace(query).intent
    }

    /// Classify and report which keyword decided the outcome.
    pub fn trace(&self, query: &str) -> ClassificationResult {
        let query_lower = query.to_lowercase();

        for rule in &self.config.rules {
            if let Some(keyword) = rule.keywords.iter().find(|k| query_lower.contains(k.as_str()))
            {
                debug!(intent = %rule.intent, keyword = %keyword, "Classified query intent");
                return ClassificationResult {
                    intent: rule.intent,
                    matched_keyword: Some(keyword.clone()),
                    reason: format!("{} intent: matched keyword '{}'", rule.intent, keyword),
                };
            }
        }

        debug!(intent = %self.config.default_intent, "No intent keyword matched");
        ClassificationResult {
            intent: self.config.default_intent,
            matched_keyword: None,
            reason: format!(
                "No intent keyword matched; defaulting to {}",
                self.config.default_intent
            ),
        }
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}
