//! Corpus jobs: the experience split and the per role × level aggregation.
//!
//! Job isolation rule: a missing corpus file is fatal for that job only —
//! it is logged and the sibling jobs continue. Only a missing jobs root
//! aborts the whole run.

pub mod categorize;
pub mod metrics;
pub mod partition;
pub mod prompts;
pub mod synthesis;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{info, warn};

use crate::aggregate::categorize::{buckets_to_json, categorize_skills};
use crate::aggregate::metrics::{aggregate, collect_observations, rank};
use crate::aggregate::partition::partition_by_experience;
use crate::aggregate::synthesis::synthesize_key_skills;
use crate::completion::CompletionBackend;
use crate::errors::AppError;
use crate::models::artifact::{ExperienceLevel, SkillCorpusArtifact};
use crate::models::posting::PostingAnalysis;

/// Analyzed-corpus file name inside each role directory.
pub const ANALYSIS_FILE: &str = "analysis.json";

fn partition_file(level: ExperienceLevel) -> String {
    format!("analysis_{}.json", level.suffix())
}

fn artifact_file(level: ExperienceLevel) -> String {
    format!("key_skills_{}.json", level.suffix())
}

/// Reads an analyzed corpus from disk.
pub fn load_records(path: &Path) -> Result<Vec<PostingAnalysis>, AppError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Role directories under the jobs root, sorted for deterministic runs.
fn role_directories(jobs_dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    if !jobs_dir.is_dir() {
        return Err(AppError::Job(format!(
            "jobs directory not found: {}",
            jobs_dir.display()
        )));
    }
    let mut directories: Vec<PathBuf> = fs::read_dir(jobs_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    directories.sort();
    Ok(directories)
}

/// Splits every role directory's corpus into per-experience files. Roles
/// without an analyzed corpus are skipped with a log line.
pub fn run_split_job(jobs_dir: &Path) -> Result<(), AppError> {
    for role_dir in role_directories(jobs_dir)? {
        let source = role_dir.join(ANALYSIS_FILE);
        if !source.exists() {
            warn!(dir = %role_dir.display(), "no {ANALYSIS_FILE}; skipping role");
            continue;
        }
        match split_role_corpus(&role_dir, &source) {
            Ok((new_grad, experienced, skipped)) => info!(
                dir = %role_dir.display(),
                new_grad,
                experienced,
                skipped,
                "partitioned corpus"
            ),
            Err(error) => {
                warn!(dir = %role_dir.display(), %error, "split failed; continuing with next role");
            }
        }
    }
    Ok(())
}

fn split_role_corpus(role_dir: &Path, source: &Path) -> Result<(usize, usize, usize), AppError> {
    let records = load_records(source)?;
    let partitioned = partition_by_experience(&records);
    write_json(
        &role_dir.join(partition_file(ExperienceLevel::NewGrad)),
        &partitioned.new_grad,
    )?;
    write_json(
        &role_dir.join(partition_file(ExperienceLevel::Experienced)),
        &partitioned.experienced,
    )?;
    Ok((
        partitioned.new_grad.len(),
        partitioned.experienced.len(),
        partitioned.skipped,
    ))
}

/// Runs the aggregation job for every role directory and both experience
/// levels. Per-job failures are logged and skipped; siblings continue.
pub async fn run_aggregation_jobs(
    backend: &dyn CompletionBackend,
    jobs_dir: &Path,
    roles: Option<&[String]>,
) -> Result<(), AppError> {
    for role_dir in role_directories(jobs_dir)? {
        let role = role_dir
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        if let Some(filter) = roles {
            if !filter.iter().any(|wanted| wanted == &role) {
                continue;
            }
        }
        for level in ExperienceLevel::ALL {
            match run_role_job(backend, &role_dir, &role, level).await {
                Ok(path) => info!(
                    %role,
                    level = level.display(),
                    path = %path.display(),
                    "aggregation job complete"
                ),
                Err(error) => warn!(
                    %role,
                    level = level.display(),
                    %error,
                    "aggregation job failed; continuing with siblings"
                ),
            }
        }
    }
    Ok(())
}

/// One aggregation job: load the partitioned corpus, aggregate and rank
/// its skills, synthesize the final maps, categorize the hard skills, and
/// write the artifact.
pub async fn run_role_job(
    backend: &dyn CompletionBackend,
    role_dir: &Path,
    role: &str,
    level: ExperienceLevel,
) -> Result<PathBuf, AppError> {
    let source = role_dir.join(partition_file(level));
    if !source.exists() {
        return Err(AppError::Job(format!(
            "missing corpus file {}",
            source.display()
        )));
    }

    let records = load_records(&source)?;
    let corpus_size = records.len();
    let stubs = records.iter().filter(|r| r.is_failure_stub()).count();
    if stubs > 0 {
        warn!(role, stubs, corpus_size, "corpus contains failure stubs");
    }

    let (hard_observations, soft_observations) = collect_observations(&records);
    let hard_stats = rank(aggregate(&hard_observations, corpus_size));
    let soft_stats = rank(aggregate(&soft_observations, corpus_size));
    info!(
        role,
        level = level.display(),
        corpus_size,
        hard = hard_stats.len(),
        soft = soft_stats.len(),
        "aggregated skill statistics"
    );

    let synthesized =
        synthesize_key_skills(backend, role, level, corpus_size, &hard_stats, &soft_stats).await;
    if synthesized.degraded {
        warn!(role, level = level.display(), "artifact built from fallback skill maps");
    }

    let buckets = categorize_skills(&synthesized.hard_skills, role);
    let artifact = SkillCorpusArtifact {
        role: role.to_string(),
        experience: level,
        corpus_size,
        generated_at: Utc::now(),
        hard_skills: synthesized.hard_skills,
        soft_skills: synthesized.soft_skills,
        hard_skills_by_category: buckets_to_json(&buckets),
    };

    let target = role_dir.join(artifact_file(level));
    write_json(&target, &artifact)?;
    Ok(target)
}
