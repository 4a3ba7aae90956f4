//! Per-posting analysis pipeline.
//!
//! Flow: format posting → build prompts → completion call → structured
//! recovery → highlight validation → `PostingAnalysis`. Batch driving wraps
//! every posting in the retry orchestrator, so the output always carries
//! exactly one record per input posting.

pub mod orchestrator;
pub mod prompts;
pub mod recovery;
pub mod validator;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analysis::orchestrator::RetryOrchestrator;
use crate::analysis::prompts::{build_analysis_system, build_analysis_user, ANALYSIS_ANCHOR_KEYS};
use crate::analysis::recovery::{recover_object, scrape_string_field, Recovered, Strategy};
use crate::completion::{ChatRequest, CompletionBackend, CompletionError};
use crate::models::posting::{Posting, PostingAnalysis, SkillHighlight};

/// Postings longer than this are clipped before prompting.
pub const MAX_POSTING_CHARS: usize = 4000;
const ELISION_NOTE: &str = "\n\n(posting truncated)";
const ANALYSIS_MAX_TOKENS: u32 = 2048;

/// Failure taxonomy for a single analysis attempt. Every variant is
/// retryable; the orchestrator owns the retry decision.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Completion(#[from] CompletionError),

    #[error("no recoverable structure in completion output")]
    Unrecoverable,
}

/// Formats a posting into the labelled text block the prompt embeds.
pub fn format_posting_text(posting: &Posting) -> String {
    format!(
        "Title: {}\nCompany: {}\nExperience: {}\n\nResponsibilities:\n{}\n\nRequirements:\n{}\n\nPreferred qualifications:\n{}\n\nTech stack: {}\n",
        posting.title,
        posting.company,
        posting.experience.as_deref().unwrap_or("not stated"),
        posting.responsibilities,
        posting.requirements,
        posting.preferred,
        posting.tech_stack,
    )
}

/// Clips over-long posting text at the prompt budget.
fn clip_posting_text(text: &str) -> String {
    if text.chars().count() <= MAX_POSTING_CHARS {
        return text.to_string();
    }
    let clipped: String = text.chars().take(MAX_POSTING_CHARS).collect();
    format!("{clipped}{ELISION_NOTE}")
}

/// One analysis attempt for one posting. Errors on transport failure or
/// unrecoverable output; never panics.
pub async fn analyze_posting(
    backend: &dyn CompletionBackend,
    posting: &Posting,
    role: &str,
) -> Result<PostingAnalysis, AnalysisError> {
    let posting_text = clip_posting_text(&format_posting_text(posting));
    let request = ChatRequest::new(
        &build_analysis_system(role),
        &build_analysis_user(role, &posting_text),
        ANALYSIS_MAX_TOKENS,
    );

    let raw = backend.complete(&request).await?;

    let recovered = recover_posting(&raw).ok_or(AnalysisError::Unrecoverable)?;
    debug!(strategy = ?recovered.strategy, "posting analysis recovered");

    let mut analysis = to_analysis(recovered.value, posting, role);
    let substituted = validator::repair_highlights(&mut analysis.highlights);
    if substituted > 0 {
        info!(substituted, title = %analysis.title, "substituted exemplar evidence");
    }
    Ok(analysis)
}

/// Full recovery cascade for posting output: the generic strategies first,
/// then the field-scrape fallback that salvages a minimal record from
/// labelled title/company values. `None` means unrecoverable.
pub fn recover_posting(raw: &str) -> Option<Recovered> {
    if let Some(found) = recover_object(raw, ANALYSIS_ANCHOR_KEYS) {
        return Some(found);
    }
    let title = scrape_string_field(raw, "title")?;
    let company = scrape_string_field(raw, "company")?;
    let value = serde_json::json!({
        "title": title,
        "company": company,
        "summary": "partial recovery",
    });
    Some(Recovered {
        value,
        strategy: Strategy::FieldScrape,
    })
}

/// Deserializes a recovered object into `PostingAnalysis`. The input
/// posting is authoritative for identity fields — the generator routinely
/// drops or rewrites them.
fn to_analysis(value: Value, posting: &Posting, role: &str) -> PostingAnalysis {
    let mut analysis = match serde_json::from_value::<PostingAnalysis>(value.clone()) {
        Ok(analysis) => analysis,
        Err(error) => {
            warn!(%error, "recovered object does not fully match the analysis schema; salvaging fields");
            salvage_analysis(&value)
        }
    };

    if analysis.title.is_empty() {
        analysis.title = posting.title.clone();
    }
    if analysis.company.is_empty() {
        analysis.company = posting.company.clone();
    }
    analysis.role = role.to_string();
    analysis.experience = posting.experience.clone();
    analysis
}

/// Field-by-field salvage for objects that are JSON but not quite the
/// analysis schema (e.g. a highlight rendered as a bare string).
fn salvage_analysis(value: &Value) -> PostingAnalysis {
    let mut analysis = PostingAnalysis::default();
    let Some(object) = value.as_object() else {
        return analysis;
    };

    let text = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };
    analysis.title = text("title");
    analysis.company = text("company");
    analysis.summary = text("summary");
    analysis.insight = text("insight");

    if let Some(map) = object.get("hard_skills").and_then(Value::as_object) {
        analysis.hard_skills = map.clone();
    }
    if let Some(map) = object.get("soft_skills").and_then(Value::as_object) {
        analysis.soft_skills = map.clone();
    }
    if let Some(items) = object.get("highlights").and_then(Value::as_array) {
        analysis.highlights = items
            .iter()
            .filter_map(|item| {
                Some(SkillHighlight {
                    skill: item.get("skill")?.as_str()?.to_string(),
                    evidence: item.get("evidence")?.as_str()?.to_string(),
                })
            })
            .collect();
    }
    analysis
}

/// Analyzes a whole corpus, strictly sequentially. Exactly one record per
/// posting comes back: exhausted units degrade to failure stubs.
pub async fn analyze_batch(
    backend: &dyn CompletionBackend,
    orchestrator: &RetryOrchestrator,
    postings: &[Posting],
    role: &str,
) -> Vec<PostingAnalysis> {
    let mut results = Vec::with_capacity(postings.len());

    for (index, posting) in postings.iter().enumerate() {
        info!(
            index = index + 1,
            total = postings.len(),
            title = %posting.title,
            "analyzing posting"
        );
        let label = if posting.title.is_empty() {
            format!("posting {}", index + 1)
        } else {
            posting.title.clone()
        };
        let analysis = orchestrator
            .run(
                &label,
                |_attempt| analyze_posting(backend, posting, role),
                || PostingAnalysis::failure_stub(posting, role),
            )
            .await;
        results.push(analysis);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::analysis::orchestrator::FixedBackoff;
    use crate::models::posting::ANALYSIS_FAILED_MARKER;

    /// Completion fake that replays a scripted sequence of transcripts.
    struct ScriptedBackend {
        responses: Mutex<VecDeque<Result<String, CompletionError>>>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Result<String, CompletionError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl CompletionBackend for ScriptedBackend {
        async fn complete(&self, _request: &ChatRequest) -> Result<String, CompletionError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(CompletionError::Empty))
        }
    }

    fn fast_orchestrator() -> RetryOrchestrator {
        RetryOrchestrator::new(
            3,
            Box::new(FixedBackoff(Duration::from_millis(10))),
            Duration::from_millis(1),
        )
    }

    fn sample_posting() -> Posting {
        Posting {
            title: "Senior Backend Engineer".to_string(),
            company: "Initech".to_string(),
            experience: Some("5+ years required".to_string()),
            responsibilities: "Own the billing services".to_string(),
            requirements: "Rust, PostgreSQL, Kubernetes".to_string(),
            preferred: "Kafka".to_string(),
            tech_stack: "Rust, PostgreSQL".to_string(),
        }
    }

    fn valid_transcript() -> String {
        json!({
            "title": "Senior Backend Engineer",
            "company": "Initech",
            "role": "backend engineer",
            "summary": "Billing platform ownership",
            "hard_skills": {"Rust": 95, "PostgreSQL": 80},
            "soft_skills": {"Communication": 60},
            "highlights": [
                {"skill": "Rust", "evidence": "Requirements list Rust first and the billing pipeline built in Rust serves 10k requests daily"}
            ],
            "insight": "Wants an owner for the billing domain"
        })
        .to_string()
    }

    #[test]
    fn test_format_posting_text_labels_all_sections() {
        let text = format_posting_text(&sample_posting());
        assert!(text.contains("Title: Senior Backend Engineer"));
        assert!(text.contains("Company: Initech"));
        assert!(text.contains("Experience: 5+ years required"));
        assert!(text.contains("Requirements:\nRust, PostgreSQL, Kubernetes"));
        assert!(text.contains("Tech stack: Rust, PostgreSQL"));
    }

    #[test]
    fn test_format_posting_text_handles_missing_experience() {
        let posting = Posting::default();
        assert!(format_posting_text(&posting).contains("Experience: not stated"));
    }

    #[test]
    fn test_clip_posting_text_respects_budget() {
        let long = "x".repeat(MAX_POSTING_CHARS + 500);
        let clipped = clip_posting_text(&long);
        assert!(clipped.ends_with(ELISION_NOTE));
        assert_eq!(
            clipped.chars().count(),
            MAX_POSTING_CHARS + ELISION_NOTE.chars().count()
        );

        let short = "short posting";
        assert_eq!(clip_posting_text(short), short);
    }

    #[test]
    fn test_recover_posting_scrape_fallback() {
        let raw = r#"I could not produce JSON, but "title": "Backend Engineer" at "company": "Initech" is the role."#;
        let recovered = recover_posting(raw).unwrap();
        assert_eq!(recovered.strategy, Strategy::FieldScrape);
        assert_eq!(recovered.value["title"], "Backend Engineer");
        assert_eq!(recovered.value["company"], "Initech");
        assert_eq!(recovered.value["summary"], "partial recovery");
    }

    #[test]
    fn test_recover_posting_unrecoverable_without_both_fields() {
        assert!(recover_posting("nothing structured here").is_none());
        assert!(recover_posting(r#"only a "title": "Engineer" label"#).is_none());
    }

    #[test]
    fn test_to_analysis_carries_posting_identity() {
        let posting = sample_posting();
        let analysis = to_analysis(json!({"summary": "s"}), &posting, "backend");
        assert_eq!(analysis.title, "Senior Backend Engineer");
        assert_eq!(analysis.company, "Initech");
        assert_eq!(analysis.role, "backend");
        assert_eq!(analysis.experience.as_deref(), Some("5+ years required"));
    }

    #[test]
    fn test_salvage_keeps_skills_when_highlights_are_malformed() {
        let posting = sample_posting();
        let value = json!({
            "title": "Engineer",
            "hard_skills": {"Rust": 90},
            "soft_skills": {"Teamwork": 40},
            "highlights": ["not an object"]
        });
        let analysis = to_analysis(value, &posting, "backend");
        assert_eq!(analysis.hard_skills["Rust"], 90);
        assert_eq!(analysis.soft_skills["Teamwork"], 40);
        assert!(analysis.highlights.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_posting_happy_path() {
        let backend = ScriptedBackend::new(vec![Ok(valid_transcript())]);
        let posting = sample_posting();

        let analysis = analyze_posting(&backend, &posting, "backend").await.unwrap();

        assert_eq!(analysis.title, "Senior Backend Engineer");
        assert_eq!(analysis.role, "backend");
        assert_eq!(analysis.hard_skills["Rust"], 95);
        assert_eq!(analysis.highlights.len(), 1);
        assert!(!analysis.is_failure_stub());
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_posting_garbled_output_is_unrecoverable() {
        let backend = ScriptedBackend::new(vec![Ok("utter nonsense with no labels".to_string())]);
        let posting = sample_posting();

        let result = analyze_posting(&backend, &posting, "backend").await;
        assert!(matches!(result, Err(AnalysisError::Unrecoverable)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_batch_keeps_record_count_parity() {
        // First posting: three garbled attempts → stub. Second: succeeds.
        let backend = ScriptedBackend::new(vec![
            Ok("garbage".to_string()),
            Err(CompletionError::Empty),
            Ok("more garbage".to_string()),
            Ok(valid_transcript()),
        ]);
        let postings = vec![
            Posting {
                title: "Doomed Posting".to_string(),
                company: "Acme".to_string(),
                ..Posting::default()
            },
            sample_posting(),
        ];

        let results =
            analyze_batch(&backend, &fast_orchestrator(), &postings, "backend").await;

        assert_eq!(results.len(), postings.len(), "one record per input posting");
        assert!(results[0].is_failure_stub());
        assert_eq!(results[0].title, "Doomed Posting");
        assert_eq!(results[0].summary, ANALYSIS_FAILED_MARKER);
        assert!(results[0].hard_skills.is_empty());
        assert!(!results[1].is_failure_stub());
        assert_eq!(results[1].hard_skills["Rust"], 95);
    }

    #[tokio::test(start_paused = true)]
    async fn test_analyze_posting_repairs_weak_highlights() {
        let transcript = json!({
            "title": "Engineer",
            "company": "Acme",
            "hard_skills": {"Rust": 90},
            "soft_skills": {},
            "highlights": [{"skill": "Teamwork", "evidence": "Good teamwork"}],
            "insight": ""
        })
        .to_string();
        let backend = ScriptedBackend::new(vec![Ok(transcript)]);

        let analysis = analyze_posting(&backend, &sample_posting(), "backend")
            .await
            .unwrap();

        assert_eq!(analysis.highlights[0].skill, "Teamwork");
        assert_eq!(
            analysis.highlights[0].evidence,
            validator::EXEMPLAR_EVIDENCE[0],
            "weak evidence replaced by the positional exemplar"
        );
    }
}
