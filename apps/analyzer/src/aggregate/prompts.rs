// Prompt constants for key-skill synthesis.
// Role display wording is shared with the per-posting analysis prompts.

use crate::analysis::prompts::role_display;
use crate::models::artifact::ExperienceLevel;

/// System prompt for key-skill synthesis — enforces JSON-only output.
/// Replace `{role_display}`, `{level_display}`, `{hard_skill_focus}`.
pub const SYNTHESIS_SYSTEM_TEMPLATE: &str = r#"You are an analyst of the {role_display} hiring market. You are given hard-skill and soft-skill data extracted from many {level_display} {role_display} job postings. Consolidate it into the market's core competencies.

Goals:
1. Merge skills that are duplicates or near-duplicates under one canonical name.
2. Rank skills by importance and express each score as a percentile number.
3. Include every skill of importance 10 or above — completeness matters more than brevity.
4. Produce at least 10 hard skills and at least 5 soft skills; split broader concepts apart if the soft-skill list runs short.

Classification rules:
1. Hard skills: technical competencies only ({hard_skill_focus}).
2. Soft skills: interpersonal competencies only (communication, problem solving, teamwork).

Respond with ONLY the following JSON object and no comments:
{"hard_skills": {"skill name": 95}, "soft_skills": {"skill name": 90}, "analysis": ""}"#;

/// User prompt for key-skill synthesis.
/// Replace `{corpus_size}`, `{level_display}`, `{role_display}`,
/// `{hard_count}`, `{soft_count}`, `{hard_stats}`, `{soft_stats}`.
pub const SYNTHESIS_USER_TEMPLATE: &str = r#"The following statistics were extracted from {corpus_size} {level_display} {role_display} job postings. Derive the core competencies this market expects.

## Hard-skill data (top {hard_count})
{hard_stats}

## Soft-skill data (top {soft_count})
{soft_stats}"#;

/// Marker keys the anchor-key recovery strategy uses on synthesis output.
pub const SYNTHESIS_ANCHOR_KEYS: &[&str] = &["hard_skills", "soft_skills"];

pub fn build_synthesis_system(role: &str, level: ExperienceLevel) -> String {
    let (display, focus) = role_display(role);
    SYNTHESIS_SYSTEM_TEMPLATE
        .replace("{role_display}", display)
        .replace("{level_display}", level.display())
        .replace("{hard_skill_focus}", focus)
}
