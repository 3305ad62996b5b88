//! Classification strategies.
//!
//! A strategy turns the tokens of one raw definition into a category plus
//! the evidence behind it. The keyword heuristic is the default; any
//! `Fn(&Tokens) -> Assignment` can stand in for it.

use crate::profile::{Keyword, KeywordProfile};
use crate::table::ConfidenceSource;
use crate::tokenize::Tokens;
use dpp_model::PartCategory;
use std::collections::BTreeSet;

/// Category chosen for one definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub category: PartCategory,
    pub confidence_source: ConfidenceSource,
    /// Matched keyword phrases.
    pub evidence: BTreeSet<String>,
}

impl Assignment {
    pub fn heuristic(category: PartCategory, evidence: BTreeSet<String>) -> Self {
        Self {
            category,
            confidence_source: ConfidenceSource::Heuristic,
            evidence,
        }
    }

    pub fn low_confidence(category: PartCategory, evidence: BTreeSet<String>) -> Self {
        Self {
            category,
            confidence_source: ConfidenceSource::LowConfidence,
            evidence,
        }
    }
}

pub trait ClassificationStrategy: Send + Sync {
    fn assign(&self, tokens: &Tokens) -> Assignment;
}

impl<F> ClassificationStrategy for F
where
    F: Fn(&Tokens) -> Assignment + Send + Sync,
{
    fn assign(&self, tokens: &Tokens) -> Assignment {
        self(tokens)
    }
}

/// Score categories by distinct keyword matches.
///
/// Ties on score go to the category whose longest matched phrase spans the
/// most tokens. A tie that survives that, a best score below `min_score`, or
/// no match at all yields the fallback category at low confidence.
#[derive(Debug, Clone)]
pub struct KeywordStrategy {
    profile: KeywordProfile,
    fallback: PartCategory,
    min_score: usize,
}

pub const DEFAULT_FALLBACK: PartCategory = PartCategory::Structural;
pub const DEFAULT_MIN_SCORE: usize = 1;

impl KeywordStrategy {
    pub fn new(profile: KeywordProfile) -> Self {
        Self {
            profile,
            fallback: DEFAULT_FALLBACK,
            min_score: DEFAULT_MIN_SCORE,
        }
    }

    pub fn with_fallback(mut self, fallback: PartCategory) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn with_min_score(mut self, min_score: usize) -> Self {
        self.min_score = min_score.max(1);
        self
    }

    pub fn profile(&self) -> &KeywordProfile {
        &self.profile
    }

    pub fn fallback(&self) -> PartCategory {
        self.fallback
    }

    fn score(&self, tokens: &Tokens) -> Vec<CategoryScore> {
        self.profile
            .categories()
            .filter_map(|(category, keywords)| {
                let matched: Vec<&Keyword> = keywords
                    .iter()
                    .filter(|keyword| tokens.contains_phrase(&keyword.tokens))
                    .collect();
                if matched.is_empty() {
                    return None;
                }
                Some(CategoryScore {
                    category,
                    score: matched.len(),
                    longest_run: matched.iter().map(|k| k.tokens.len()).max().unwrap_or(0),
                    evidence: matched.iter().map(|k| k.phrase.clone()).collect(),
                })
            })
            .collect()
    }
}

impl Default for KeywordStrategy {
    fn default() -> Self {
        Self::new(KeywordProfile::builtin())
    }
}

#[derive(Debug)]
struct CategoryScore {
    category: PartCategory,
    score: usize,
    longest_run: usize,
    evidence: BTreeSet<String>,
}

impl ClassificationStrategy for KeywordStrategy {
    fn assign(&self, tokens: &Tokens) -> Assignment {
        let scores = self.score(tokens);
        let Some(best_score) = scores.iter().map(|s| s.score).max() else {
            return Assignment::low_confidence(self.fallback, BTreeSet::new());
        };

        let top: Vec<&CategoryScore> = scores.iter().filter(|s| s.score == best_score).collect();
        let longest = top.iter().map(|s| s.longest_run).max().unwrap_or(0);
        let finalists: Vec<&CategoryScore> =
            top.into_iter().filter(|s| s.longest_run == longest).collect();

        match finalists.as_slice() {
            [winner] if best_score >= self.min_score => {
                Assignment::heuristic(winner.category, winner.evidence.clone())
            }
            _ => {
                let evidence = finalists
                    .iter()
                    .flat_map(|s| s.evidence.iter().cloned())
                    .collect();
                Assignment::low_confidence(self.fallback, evidence)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(name: &str, doc: &str) -> Tokens {
        Tokens::from_texts([name, doc])
    }

    fn evidence(phrases: &[&str]) -> BTreeSet<String> {
        phrases.iter().map(|p| p.to_string()).collect()
    }

    #[test]
    fn temperature_sensor_is_a_sensor() {
        let assignment = KeywordStrategy::default()
            .assign(&tokens("Temperature Sensor", "measures ambient temperature"));
        assert_eq!(assignment.category, PartCategory::Sensor);
        assert_eq!(assignment.confidence_source, ConfidenceSource::Heuristic);
        assert!(assignment.evidence.contains("sensor"));
        assert!(assignment.evidence.contains("temperature"));
    }

    #[test]
    fn no_match_falls_back_with_empty_evidence() {
        let assignment = KeywordStrategy::default().assign(&tokens("Widget", "a generic thing"));
        assert_eq!(
            assignment,
            Assignment::low_confidence(PartCategory::Structural, BTreeSet::new())
        );
    }

    #[test]
    fn equal_scores_prefer_the_longer_phrase() {
        let mut profile = KeywordProfile::new();
        profile.extend(PartCategory::Fluidics, ["valve"]);
        profile.extend(PartCategory::Actuator, ["valve actuator"]);
        let assignment = KeywordStrategy::new(profile).assign(&tokens("Valve actuator", ""));
        assert_eq!(assignment.category, PartCategory::Actuator);
        assert_eq!(assignment.confidence_source, ConfidenceSource::Heuristic);
        assert_eq!(assignment.evidence, evidence(&["valve actuator"]));
    }

    #[test]
    fn unresolved_tie_goes_to_fallback_at_low_confidence() {
        let mut profile = KeywordProfile::new();
        profile.extend(PartCategory::Fluidics, ["pump"]);
        profile.extend(PartCategory::Thermal, ["fan"]);
        let assignment = KeywordStrategy::new(profile)
            .with_fallback(PartCategory::Consumable)
            .assign(&tokens("Pump with fan", ""));
        assert_eq!(
            assignment,
            Assignment::low_confidence(PartCategory::Consumable, evidence(&["fan", "pump"]))
        );
    }

    #[test]
    fn score_below_minimum_is_low_confidence() {
        let assignment = KeywordStrategy::default()
            .with_min_score(2)
            .assign(&tokens("Fuse", ""));
        assert_eq!(assignment.category, PartCategory::Structural);
        assert_eq!(assignment.confidence_source, ConfidenceSource::LowConfidence);
        assert_eq!(assignment.evidence, evidence(&["fuse"]));
    }

    #[test]
    fn closures_are_strategies() {
        let always_fastener =
            |_: &Tokens| Assignment::heuristic(PartCategory::Fastener, BTreeSet::new());
        let strategy: &dyn ClassificationStrategy = &always_fastener;
        assert_eq!(
            strategy.assign(&Tokens::default()).category,
            PartCategory::Fastener
        );
    }
}
