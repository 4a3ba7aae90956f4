//! Specificity validation for generated skill justifications.
//!
//! Judges whether an explanation is concretely grounded or generic filler
//! using three independent signals: a named entity, a problem/context cue,
//! and a resolution cue. The rule is permissive on purpose: two of three
//! signals suffice, accepting some filler rather than rejecting terse but
//! true answers. Rejected slots are repaired in place with pre-authored
//! exemplars; the record itself is never discarded.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::{debug, warn};

use crate::models::posting::SkillHighlight;

/// Explanations shorter than this are rejected regardless of content.
pub const MIN_EVIDENCE_CHARS: usize = 30;
/// How many of the three signals may be absent before rejection.
pub const MAX_MISSING_SIGNALS: usize = 1;

/// Organizations and technologies recognized as named entities even when
/// they appear lowercased mid-sentence.
const KNOWN_ENTITIES: &[&str] = &[
    "AWS",
    "GCP",
    "Azure",
    "Kubernetes",
    "Docker",
    "Terraform",
    "React",
    "Vue",
    "Angular",
    "Spring",
    "Django",
    "Rails",
    "PostgreSQL",
    "MySQL",
    "MongoDB",
    "Redis",
    "Kafka",
    "Elasticsearch",
    "Spark",
    "Airflow",
    "TensorFlow",
    "PyTorch",
    "GitHub",
    "GitLab",
    "Jenkins",
    "Figma",
    "Jira",
    "Tableau",
    "Salesforce",
];

/// Domain-problem vocabulary for the problem/context signal.
const PROBLEM_VOCAB: &[&str] = &[
    "performance",
    "latency",
    "defect",
    "bug",
    "outage",
    "incident",
    "scale",
    "scalability",
    "throughput",
    "bottleneck",
    "downtime",
    "regression",
    "churn",
];

/// Action verbs for the problem/context signal.
const ACTION_VERBS: &[&str] = &[
    "built",
    "designed",
    "implemented",
    "migrated",
    "refactored",
    "automated",
    "debugged",
    "deployed",
    "integrated",
    "profiled",
    "maintained",
    "led",
];

/// Connector phrases for the resolution signal.
const CONNECTOR_PHRASES: &[&str] = &["through", "using", "by means of", "via"];

/// Outcome verbs for the resolution signal.
const OUTCOME_VERBS: &[&str] = &[
    "optimized",
    "reduced",
    "achieved",
    "launched",
    "improved",
    "increased",
    "eliminated",
    "accelerated",
    "shipped",
    "delivered",
    "cut",
    "stabilized",
];

/// Tool/technique nouns for the resolution signal.
const TOOL_NOUNS: &[&str] = &[
    "cache",
    "caching",
    "pipeline",
    "index",
    "queue",
    "algorithm",
    "framework",
    "monitoring",
    "automation",
    "benchmark",
    "profiler",
    "test suite",
];

/// Pre-authored exemplar explanations substituted when a justification
/// fails validation. Selected by slot position; the claimed skill label is
/// kept.
pub const EXEMPLAR_EVIDENCE: &[&str] = &[
    "Reduced recovery time for a production incident from hours to minutes by tracing a connection leak with heap profiling",
    "Reduced API p95 latency by 40% by introducing a Redis cache in front of the reporting queries",
    "Led the migration of a legacy batch pipeline to an event-driven architecture processing 2M records daily",
    "Partnered with three product teams and delivered a shared component library adopted across 5 internal dashboards",
];

// Two or more adjacent capitalized words ("Acme Corp", "At Acme Corp").
static MULTIWORD_PROPER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z][A-Za-z0-9]*(?:\s+[A-Z][A-Za-z0-9]+)+\b").unwrap());
// A quoted phrase of meaningful length.
static QUOTED_PHRASE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#""[^"]{3,}""#).unwrap());
// Generic filler that forces rejection when no named entity backs it up.
// "experience"/"skill"/"project" only count as bare standalone words.
static GENERIC_FILLER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(various|several|numerous|experience|skills?|projects?)\b").unwrap()
});

/// The three independent grounding signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    NamedEntity,
    ProblemContext,
    Resolution,
}

/// Outcome of evaluating one explanation. Reasons are always reported —
/// a rejection is never silent.
#[derive(Debug, Clone, Serialize)]
pub struct Verdict {
    pub passed: bool,
    pub missing: Vec<Signal>,
    pub reasons: Vec<String>,
}

impl Verdict {
    fn pass(missing: Vec<Signal>) -> Self {
        Self {
            passed: true,
            missing,
            reasons: Vec::new(),
        }
    }

    fn reject(missing: Vec<Signal>, reasons: Vec<String>) -> Self {
        Self {
            passed: false,
            missing,
            reasons,
        }
    }
}

/// Evaluates one explanation against the specificity heuristic.
pub fn evaluate_evidence(text: &str) -> Verdict {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_EVIDENCE_CHARS {
        return Verdict::reject(
            vec![Signal::NamedEntity, Signal::ProblemContext, Signal::Resolution],
            vec![format!(
                "evidence is shorter than {MIN_EVIDENCE_CHARS} characters"
            )],
        );
    }

    let lower = trimmed.to_lowercase();
    let named_entity = has_named_entity(trimmed, &lower);
    let problem_context = has_problem_context(trimmed, &lower);
    let resolution = has_resolution(&lower);

    let mut missing = Vec::new();
    if !named_entity {
        missing.push(Signal::NamedEntity);
    }
    if !problem_context {
        missing.push(Signal::ProblemContext);
    }
    if !resolution {
        missing.push(Signal::Resolution);
    }

    if missing.len() > MAX_MISSING_SIGNALS {
        let reasons = missing
            .iter()
            .map(|signal| format!("missing {signal:?} signal"))
            .collect();
        return Verdict::reject(missing, reasons);
    }

    if !named_entity {
        if let Some(captures) = GENERIC_FILLER_RE.captures(trimmed) {
            let filler = captures[1].to_lowercase();
            return Verdict::reject(
                missing,
                vec![format!(
                    "generic filler '{filler}' without a named entity to ground it"
                )],
            );
        }
    }

    Verdict::pass(missing)
}

/// Named-entity signal: a capitalized multi-word run, a quoted phrase, or a
/// curated organization/technology name.
fn has_named_entity(text: &str, lower: &str) -> bool {
    if MULTIWORD_PROPER_RE.is_match(text) || QUOTED_PHRASE_RE.is_match(text) {
        return true;
    }
    KNOWN_ENTITIES
        .iter()
        .any(|entity| matches_term(lower, &entity.to_lowercase()))
}

/// Problem/context signal: a quantified change (any digit qualifies — "40%",
/// "2 hours", "3 services"), domain-problem vocabulary, or an action verb.
fn has_problem_context(text: &str, lower: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
        || PROBLEM_VOCAB.iter().any(|term| matches_term(lower, term))
        || ACTION_VERBS.iter().any(|term| matches_term(lower, term))
}

/// Resolution signal: a connector phrase, an outcome verb, or a
/// tool/technique noun.
fn has_resolution(lower: &str) -> bool {
    CONNECTOR_PHRASES.iter().any(|term| matches_term(lower, term))
        || OUTCOME_VERBS.iter().any(|term| matches_term(lower, term))
        || TOOL_NOUNS.iter().any(|term| matches_term(lower, term))
}

/// Multi-word phrases match as substrings; single words require their own
/// token so "cut" does not fire inside "execute".
fn matches_term(lower: &str, term: &str) -> bool {
    if term.contains(' ') {
        lower.contains(term)
    } else {
        lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| word == term)
    }
}

/// Validates every highlight in place. Failed slots get the positional
/// exemplar while the claimed skill label is kept; the record is never
/// discarded for weak evidence. Returns how many slots were substituted.
pub fn repair_highlights(highlights: &mut [SkillHighlight]) -> usize {
    let mut substituted = 0;
    for (slot, highlight) in highlights.iter_mut().enumerate() {
        let verdict = evaluate_evidence(&highlight.evidence);
        if verdict.passed {
            debug!(skill = %highlight.skill, missing = ?verdict.missing, "highlight evidence accepted");
            continue;
        }
        warn!(
            skill = %highlight.skill,
            reasons = ?verdict.reasons,
            "highlight evidence rejected; substituting exemplar"
        );
        highlight.evidence = EXEMPLAR_EVIDENCE[slot % EXEMPLAR_EVIDENCE.len()].to_string();
        substituted += 1;
    }
    substituted
}
