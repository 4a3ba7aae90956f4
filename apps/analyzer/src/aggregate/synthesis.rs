//! Key-skill synthesis — the second completion call, consolidating ranked
//! corpus statistics into the final skill maps. Degrades to a rank-derived
//! map when the model output is unusable, so the aggregation job always
//! produces an artifact.

use serde_json::Value;
use tracing::{info, warn};

use crate::analysis::recovery::recover_object;
use crate::completion::{ChatRequest, CompletionBackend};
use crate::models::artifact::{AggregatedSkillStat, ExperienceLevel};
use crate::models::posting::SkillMap;

use crate::aggregate::prompts::{
    build_synthesis_system, SYNTHESIS_ANCHOR_KEYS, SYNTHESIS_USER_TEMPLATE,
};
use crate::analysis::prompts::role_display;

/// Prompt budget; above it the stats tables shrink.
pub const MAX_STATS_PROMPT_CHARS: usize = 8000;
const FULL_HARD_COUNT: usize = 50;
const FULL_SOFT_COUNT: usize = 40;
const REDUCED_HARD_COUNT: usize = 30;
const REDUCED_SOFT_COUNT: usize = 20;
const SYNTHESIS_MAX_TOKENS: u32 = 4000;

/// Fallback sizing when the model output is unusable.
const FALLBACK_HARD_COUNT: usize = 15;
const FALLBACK_SOFT_COUNT: usize = 10;

/// Synthesized skill maps, sorted descending by score.
#[derive(Debug)]
pub struct SynthesizedSkills {
    pub hard_skills: SkillMap,
    pub soft_skills: SkillMap,
    /// True when the maps were derived from ranked stats instead of the
    /// model output.
    pub degraded: bool,
}

/// Consolidates ranked stats into final skill maps via the completion
/// service. Never fails: an unusable response degrades to the rank-derived
/// fallback.
pub async fn synthesize_key_skills(
    backend: &dyn CompletionBackend,
    role: &str,
    level: ExperienceLevel,
    corpus_size: usize,
    hard_stats: &[AggregatedSkillStat],
    soft_stats: &[AggregatedSkillStat],
) -> SynthesizedSkills {
    let system = build_synthesis_system(role, level);
    let mut user = build_synthesis_user(
        role,
        level,
        corpus_size,
        hard_stats,
        soft_stats,
        FULL_HARD_COUNT,
        FULL_SOFT_COUNT,
    );
    if user.chars().count() > MAX_STATS_PROMPT_CHARS {
        info!(
            chars = user.chars().count(),
            "synthesis prompt over budget; rebuilding with reduced stats tables"
        );
        user = build_synthesis_user(
            role,
            level,
            corpus_size,
            hard_stats,
            soft_stats,
            REDUCED_HARD_COUNT,
            REDUCED_SOFT_COUNT,
        );
    }

    let request = ChatRequest::new(&system, &user, SYNTHESIS_MAX_TOKENS);

    let recovered = match backend.complete(&request).await {
        Ok(raw) => recover_object(&raw, SYNTHESIS_ANCHOR_KEYS),
        Err(error) => {
            warn!(%error, role, "synthesis call failed");
            None
        }
    };

    match recovered {
        Some(found) => {
            let hard_skills = extract_sorted_skills(&found.value, "hard_skills");
            let soft_skills = extract_sorted_skills(&found.value, "soft_skills");
            if hard_skills.is_empty() && soft_skills.is_empty() {
                warn!(role, "synthesis output carried no skill maps; deriving fallback");
                fallback_skill_maps(hard_stats, soft_stats)
            } else {
                SynthesizedSkills {
                    hard_skills,
                    soft_skills,
                    degraded: false,
                }
            }
        }
        None => {
            warn!(role, "synthesis output unrecoverable; deriving fallback");
            fallback_skill_maps(hard_stats, soft_stats)
        }
    }
}

/// Builds the user prompt with the top `hard_count`/`soft_count` stats
/// embedded as JSON tables.
fn build_synthesis_user(
    role: &str,
    level: ExperienceLevel,
    corpus_size: usize,
    hard_stats: &[AggregatedSkillStat],
    soft_stats: &[AggregatedSkillStat],
    hard_count: usize,
    soft_count: usize,
) -> String {
    let (display, _) = role_display(role);
    let hard_top = &hard_stats[..hard_stats.len().min(hard_count)];
    let soft_top = &soft_stats[..soft_stats.len().min(soft_count)];

    SYNTHESIS_USER_TEMPLATE
        .replace("{corpus_size}", &corpus_size.to_string())
        .replace("{level_display}", level.display())
        .replace("{role_display}", display)
        .replace("{hard_count}", &hard_top.len().to_string())
        .replace("{soft_count}", &soft_top.len().to_string())
        .replace(
            "{hard_stats}",
            &serde_json::to_string_pretty(hard_top).unwrap_or_default(),
        )
        .replace(
            "{soft_stats}",
            &serde_json::to_string_pretty(soft_top).unwrap_or_default(),
        )
}

/// Pulls one skill map out of the recovered object and sorts it descending
/// by score. Non-numeric entries are dropped.
fn extract_sorted_skills(value: &Value, key: &str) -> SkillMap {
    let mut entries: Vec<(String, Value)> = value
        .get(key)
        .and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .filter(|(_, v)| v.is_number())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect()
        })
        .unwrap_or_default();
    entries.sort_by(|a, b| {
        b.1.as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&a.1.as_f64().unwrap_or(0.0))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    entries.into_iter().collect()
}

/// Rank-derived fallback: the top stats re-scored by position, so the
/// downstream artifact still carries a usable map.
pub fn fallback_skill_maps(
    hard_stats: &[AggregatedSkillStat],
    soft_stats: &[AggregatedSkillStat],
) -> SynthesizedSkills {
    let mut hard_skills = SkillMap::new();
    for (position, stat) in hard_stats.iter().take(FALLBACK_HARD_COUNT).enumerate() {
        hard_skills.insert(stat.skill.clone(), Value::from(100 - position as i64 * 3));
    }
    let mut soft_skills = SkillMap::new();
    for (position, stat) in soft_stats.iter().take(FALLBACK_SOFT_COUNT).enumerate() {
        soft_skills.insert(stat.skill.clone(), Value::from(95 - position as i64 * 5));
    }
    SynthesizedSkills {
        hard_skills,
        soft_skills,
        degraded: true,
    }
}
