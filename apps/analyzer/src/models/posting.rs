use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker written into the summary of a stub record when every retry for a
/// posting is exhausted. Downstream counting relies on stubs being emitted
/// rather than records being dropped, so the marker is the only way to tell
/// a failed unit apart.
pub const ANALYSIS_FAILED_MARKER: &str = "[ANALYSIS_FAILED]";

/// One job posting as consumed from the input corpus. All fields are free
/// text; absent fields default to empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Posting {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    /// Free-text experience requirement ("3+ years", "new grads welcome").
    /// Postings scraped from some boards omit it entirely.
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub responsibilities: String,
    #[serde(default)]
    pub requirements: String,
    #[serde(default)]
    pub preferred: String,
    #[serde(default)]
    pub tech_stack: String,
}

/// Ordered skill → importance-score map. Key order is meaningful (first-seen
/// order and rank order survive serialization), hence the order-preserving
/// map type.
pub type SkillMap = serde_json::Map<String, Value>;

/// Numeric (skill, score) pairs from a skill map; non-numeric values are
/// skipped rather than failing the record.
pub fn skill_scores(map: &SkillMap) -> Vec<(String, f64)> {
    map.iter()
        .filter_map(|(skill, value)| value.as_f64().map(|score| (skill.clone(), score)))
        .collect()
}

/// A claimed skill together with the generator's justification for it.
/// Evidence strings are policed by the specificity validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillHighlight {
    pub skill: String,
    pub evidence: String,
}

/// Structured analysis of a single posting, recovered from completion
/// output. Skill scores are integers in [10, 100]; anything at or below 10
/// is excluded upstream by the generator's own instructions and is not
/// re-validated here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostingAnalysis {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub hard_skills: SkillMap,
    #[serde(default)]
    pub soft_skills: SkillMap,
    #[serde(default)]
    pub highlights: Vec<SkillHighlight>,
    #[serde(default)]
    pub insight: String,
}

impl PostingAnalysis {
    /// The stub emitted when all retries for a unit are exhausted:
    /// identifying fields survive, skill maps stay empty, the summary
    /// carries the failure marker.
    pub fn failure_stub(posting: &Posting, role: &str) -> Self {
        Self {
            title: posting.title.clone(),
            company: posting.company.clone(),
            role: role.to_string(),
            experience: posting.experience.clone(),
            summary: ANALYSIS_FAILED_MARKER.to_string(),
            insight: "all analysis attempts exhausted".to_string(),
            ..Self::default()
        }
    }

    pub fn is_failure_stub(&self) -> bool {
        self.summary == ANALYSIS_FAILED_MARKER
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_posting_deserializes_with_missing_fields() {
        let posting: Posting = serde_json::from_value(json!({
            "title": "Backend Engineer",
            "requirements": "Rust, PostgreSQL"
        }))
        .unwrap();
        assert_eq!(posting.title, "Backend Engineer");
        assert!(posting.experience.is_none());
        assert!(posting.tech_stack.is_empty());
    }

    #[test]
    fn test_failure_stub_keeps_identity_and_empties_skills() {
        let posting = Posting {
            title: "Platform Engineer".to_string(),
            company: "Initech".to_string(),
            experience: Some("5+ years".to_string()),
            ..Posting::default()
        };
        let stub = PostingAnalysis::failure_stub(&posting, "backend");

        assert_eq!(stub.title, "Platform Engineer");
        assert_eq!(stub.company, "Initech");
        assert_eq!(stub.role, "backend");
        assert_eq!(stub.experience.as_deref(), Some("5+ years"));
        assert!(stub.hard_skills.is_empty());
        assert!(stub.soft_skills.is_empty());
        assert!(stub.is_failure_stub());
    }

    #[test]
    fn test_regular_analysis_is_not_a_stub() {
        let analysis = PostingAnalysis {
            summary: "Owns the payments platform".to_string(),
            ..PostingAnalysis::default()
        };
        assert!(!analysis.is_failure_stub());
    }

    #[test]
    fn test_skill_scores_skips_non_numeric_values() {
        let map = json!({"Rust": 90, "Go": "high", "SQL": 72.5})
            .as_object()
            .unwrap()
            .clone();
        let scores = skill_scores(&map);
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0], ("Rust".to_string(), 90.0));
        assert_eq!(scores[1], ("SQL".to_string(), 72.5));
    }

    #[test]
    fn test_skill_map_preserves_insertion_order() {
        let map = json!({"z-skill": 80, "a-skill": 70, "m-skill": 60})
            .as_object()
            .unwrap()
            .clone();
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, ["z-skill", "a-skill", "m-skill"]);
    }
}
