use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::posting::SkillMap;

/// Experience bracket an aggregation job runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    NewGrad,
    Experienced,
}

impl ExperienceLevel {
    pub const ALL: [ExperienceLevel; 2] = [ExperienceLevel::NewGrad, ExperienceLevel::Experienced];

    /// File-name suffix used for partitioned corpora and artifacts.
    pub fn suffix(self) -> &'static str {
        match self {
            ExperienceLevel::NewGrad => "new",
            ExperienceLevel::Experienced => "experienced",
        }
    }

    /// Human-facing label used in logs and prompts.
    pub fn display(self) -> &'static str {
        match self {
            ExperienceLevel::NewGrad => "new-grad",
            ExperienceLevel::Experienced => "experienced",
        }
    }
}

/// Corpus-wide statistics for one skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedSkillStat {
    pub skill: String,
    /// Number of postings that contributed a score for this skill.
    pub frequency: usize,
    /// frequency / corpus_size × 100, recomputed in full every run.
    pub occurrence_rate: f64,
    /// Arithmetic mean of contributed scores.
    pub avg_score: f64,
}

/// Final artifact for one role × experience bucket, consumed by downstream
/// systems. This core writes it out and holds no further state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCorpusArtifact {
    pub role: String,
    pub experience: ExperienceLevel,
    pub corpus_size: usize,
    pub generated_at: DateTime<Utc>,
    pub hard_skills: SkillMap,
    pub soft_skills: SkillMap,
    /// Category-partitioned view of `hard_skills`.
    pub hard_skills_by_category: SkillMap,
}
