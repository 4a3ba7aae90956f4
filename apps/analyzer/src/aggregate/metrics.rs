//! Corpus-wide skill statistics: frequency, occurrence rate, and the
//! weighted composite rank that orders every downstream artifact.
//!
//! Everything here is recomputed in full per run — there is no persisted
//! incremental state between runs.

use std::collections::HashMap;

use crate::models::artifact::AggregatedSkillStat;
use crate::models::posting::{skill_scores, PostingAnalysis};

/// Composite rank weights: occurrence rate dominates, average importance
/// spreads ties apart. Fixed weights, shared by every consumer of the rank.
pub const RATE_WEIGHT: f64 = 0.6;
pub const SCORE_WEIGHT: f64 = 0.4;

/// Per-skill score multisets collected across a corpus, kept in the order
/// skills were first observed so ranking ties stay stable.
#[derive(Debug, Default)]
pub struct SkillObservations {
    order: Vec<String>,
    scores: HashMap<String, Vec<f64>>,
}

impl SkillObservations {
    pub fn record(&mut self, skill: &str, score: f64) {
        if !self.scores.contains_key(skill) {
            self.order.push(skill.to_string());
        }
        self.scores.entry(skill.to_string()).or_default().push(score);
    }

    /// Iterates skills in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.order
            .iter()
            .map(|skill| (skill.as_str(), self.scores[skill].as_slice()))
    }
}

/// Collects hard- and soft-skill observations across a corpus. Failure
/// stubs contribute nothing (their maps are empty) but still count toward
/// corpus size at the call site.
pub fn collect_observations(
    records: &[PostingAnalysis],
) -> (SkillObservations, SkillObservations) {
    let mut hard = SkillObservations::default();
    let mut soft = SkillObservations::default();
    for record in records {
        for (skill, score) in skill_scores(&record.hard_skills) {
            hard.record(&skill, score);
        }
        for (skill, score) in skill_scores(&record.soft_skills) {
            soft.record(&skill, score);
        }
    }
    (hard, soft)
}

/// Computes per-skill statistics over a corpus of `corpus_size` records.
pub fn aggregate(
    observations: &SkillObservations,
    corpus_size: usize,
) -> Vec<AggregatedSkillStat> {
    observations
        .iter()
        .map(|(skill, scores)| {
            let frequency = scores.len();
            let avg_score = scores.iter().sum::<f64>() / frequency as f64;
            let occurrence_rate = if corpus_size == 0 {
                0.0
            } else {
                frequency as f64 / corpus_size as f64 * 100.0
            };
            AggregatedSkillStat {
                skill: skill.to_string(),
                frequency,
                occurrence_rate,
                avg_score,
            }
        })
        .collect()
}

/// The weighted blend used for every ranking decision downstream.
pub fn composite_key(stat: &AggregatedSkillStat) -> f64 {
    stat.occurrence_rate * RATE_WEIGHT + stat.avg_score * SCORE_WEIGHT
}

/// Sorts stats descending by composite key. The sort is stable, so ties
/// keep their first-seen order.
pub fn rank(mut stats: Vec<AggregatedSkillStat>) -> Vec<AggregatedSkillStat> {
    stats.sort_by(|a, b| {
        composite_key(b)
            .partial_cmp(&composite_key(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::posting::PostingAnalysis;
    use serde_json::json;

    fn record(hard: serde_json::Value, soft: serde_json::Value) -> PostingAnalysis {
        PostingAnalysis {
            hard_skills: hard.as_object().unwrap().clone(),
            soft_skills: soft.as_object().unwrap().clone(),
            ..PostingAnalysis::default()
        }
    }

    fn synthetic_corpus() -> Vec<PostingAnalysis> {
        vec![
            record(json!({"Rust": 90, "SQL": 60}), json!({"Communication": 50})),
            record(json!({"Rust": 70}), json!({"Communication": 70, "Teamwork": 40})),
            record(json!({"SQL": 80, "Docker": 40}), json!({})),
            record(json!({}), json!({"Teamwork": 60})),
        ]
    }

    #[test]
    fn test_occurrence_rate_is_exact() {
        let corpus = synthetic_corpus();
        let (hard, _) = collect_observations(&corpus);
        let stats = aggregate(&hard, corpus.len());

        let rust = stats.iter().find(|s| s.skill == "Rust").unwrap();
        assert_eq!(rust.frequency, 2);
        assert_eq!(rust.occurrence_rate, 2.0 / 4.0 * 100.0);

        let docker = stats.iter().find(|s| s.skill == "Docker").unwrap();
        assert_eq!(docker.frequency, 1);
        assert_eq!(docker.occurrence_rate, 25.0);
    }

    #[test]
    fn test_avg_score_is_arithmetic_mean() {
        let corpus = synthetic_corpus();
        let (hard, _) = collect_observations(&corpus);
        let stats = aggregate(&hard, corpus.len());

        let rust = stats.iter().find(|s| s.skill == "Rust").unwrap();
        assert_eq!(rust.avg_score, 80.0);
        let sql = stats.iter().find(|s| s.skill == "SQL").unwrap();
        assert_eq!(sql.avg_score, 70.0);
    }

    #[test]
    fn test_contributed_scores_stay_within_bounds() {
        let corpus = synthetic_corpus();
        let (hard, soft) = collect_observations(&corpus);
        for observations in [&hard, &soft] {
            for (_, scores) in observations.iter() {
                for &score in scores {
                    assert!((10.0..=100.0).contains(&score));
                }
            }
        }
    }

    #[test]
    fn test_first_seen_order_is_preserved() {
        let corpus = synthetic_corpus();
        let (hard, _) = collect_observations(&corpus);
        let skills: Vec<&str> = hard.iter().map(|(skill, _)| skill).collect();
        assert_eq!(skills, ["Rust", "SQL", "Docker"]);
    }

    #[test]
    fn test_composite_key_weights() {
        let stat = AggregatedSkillStat {
            skill: "Rust".to_string(),
            frequency: 2,
            occurrence_rate: 50.0,
            avg_score: 80.0,
        };
        assert_eq!(composite_key(&stat), 50.0 * 0.6 + 80.0 * 0.4);
    }

    #[test]
    fn test_lowering_the_composite_key_moves_a_skill_strictly_later() {
        let high = AggregatedSkillStat {
            skill: "high".to_string(),
            frequency: 3,
            occurrence_rate: 75.0,
            avg_score: 90.0,
        };
        let mut low = high.clone();
        low.skill = "low".to_string();
        low.occurrence_rate = 25.0;
        low.avg_score = 40.0;
        assert!(composite_key(&low) < composite_key(&high));

        let ranked = rank(vec![low.clone(), high.clone()]);
        assert_eq!(ranked[0].skill, "high");
        assert_eq!(ranked[1].skill, "low");
    }

    #[test]
    fn test_rank_is_stable_on_ties() {
        let make = |skill: &str| AggregatedSkillStat {
            skill: skill.to_string(),
            frequency: 1,
            occurrence_rate: 50.0,
            avg_score: 50.0,
        };
        let ranked = rank(vec![make("first"), make("second"), make("third")]);
        let order: Vec<&str> = ranked.iter().map(|s| s.skill.as_str()).collect();
        assert_eq!(order, ["first", "second", "third"]);
    }

    #[test]
    fn test_empty_corpus_yields_no_stats() {
        let (hard, soft) = collect_observations(&[]);
        assert!(aggregate(&hard, 0).is_empty());
        assert!(aggregate(&soft, 0).is_empty());
    }

    #[test]
    fn test_failure_stubs_contribute_no_observations() {
        let corpus = vec![PostingAnalysis::failure_stub(
            &crate::models::posting::Posting::default(),
            "backend",
        )];
        let (hard, soft) = collect_observations(&corpus);
        assert_eq!(hard.iter().count(), 0);
        assert_eq!(soft.iter().count(), 0);
    }
}
