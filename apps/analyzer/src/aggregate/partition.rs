//! Splits an analyzed corpus into new-grad and experienced buckets from
//! the free-text experience field. The two checks are independent, so
//! ambiguous phrasing ("3+ years, new grads welcome") legitimately lands a
//! record in both buckets — it is not deduplicated.

use tracing::warn;

use crate::models::posting::PostingAnalysis;

/// Substrings that mark a posting as open to new grads.
pub const ENTRY_LEVEL_MARKERS: &[&str] = &[
    "new grad",
    "new graduate",
    "entry level",
    "entry-level",
    "no experience",
    "junior",
    "0 years",
];

/// Substrings that mark a posting as requiring prior experience.
pub const EXPERIENCED_MARKERS: &[&str] = &[
    "years of experience",
    "prior experience",
    "experienced",
    "senior",
    "career hire",
];

#[derive(Debug, Default)]
pub struct PartitionedCorpus {
    pub new_grad: Vec<PostingAnalysis>,
    pub experienced: Vec<PostingAnalysis>,
    /// Records skipped because the experience field was absent.
    pub skipped: usize,
}

/// Partitions records by experience markers. A record missing the field is
/// skipped from both buckets with a warning.
pub fn partition_by_experience(records: &[PostingAnalysis]) -> PartitionedCorpus {
    let mut partitioned = PartitionedCorpus::default();

    for record in records {
        let Some(experience) = record.experience.as_deref() else {
            warn!(title = %record.title, "record has no experience field; skipping from both buckets");
            partitioned.skipped += 1;
            continue;
        };
        let lower = experience.to_lowercase();

        if ENTRY_LEVEL_MARKERS.iter().any(|m| lower.contains(m)) {
            partitioned.new_grad.push(record.clone());
        }
        if EXPERIENCED_MARKERS.iter().any(|m| lower.contains(m)) {
            partitioned.experienced.push(record.clone());
        }
    }

    partitioned
}
