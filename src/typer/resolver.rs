//! Best-hit selection per locus or gene family.
//!
//! Candidates are ranked by identity, coverage and alignment length (all
//! descending), then by reference id (ascending). The ranking is a total order,
//! so the call does not depend on the order the aligner reported hits in.

use crate::typer::hits::HitRecord;
use itertools::Itertools;
use serde::Serialize;
use std::{cmp::Ordering, collections::BTreeMap};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCall {
    pub locus_id: String,
    pub chosen_reference_id: String,
    pub percent_identity: f64,
    pub percent_coverage: f64,
    /// Set when distinct reference entries share the top score.
    pub ambiguous: bool,
    /// Every reference entry sharing the top score, chosen entry first.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tied_reference_ids: Vec<String>,
}

fn rank(a: &HitRecord, b: &HitRecord) -> Ordering {
    score_order(a, b).then_with(|| a.reference_id.cmp(&b.reference_id))
}

fn score_order(a: &HitRecord, b: &HitRecord) -> Ordering {
    b.percent_identity
        .total_cmp(&a.percent_identity)
        .then_with(|| b.percent_coverage.total_cmp(&a.percent_coverage))
        .then_with(|| b.alignment_length.cmp(&a.alignment_length))
}

/// Picks the winning candidate for one locus; `None` means no call.
pub fn resolve_locus(locus_id: &str, candidates: &[&HitRecord]) -> Option<ResolvedCall> {
    let sorted = candidates.iter().copied().sorted_by(|a, b| rank(a, b)).collect_vec();
    let best = *sorted.first()?;

    let tied = sorted
        .iter()
        .take_while(|hit| score_order(hit, best) == Ordering::Equal)
        .map(|hit| hit.reference_id.clone())
        .dedup()
        .collect_vec();
    let ambiguous = tied.len() > 1;
    if ambiguous {
        log::debug!(
            "{}: {} reference entries tie at {:.2}% identity / {:.2}% coverage: {}",
            locus_id,
            tied.len(),
            best.percent_identity,
            best.percent_coverage,
            tied.join(",")
        );
    }

    Some(ResolvedCall {
        locus_id: locus_id.to_string(),
        chosen_reference_id: best.reference_id.clone(),
        percent_identity: best.percent_identity,
        percent_coverage: best.percent_coverage,
        ambiguous,
        tied_reference_ids: if ambiguous { tied } else { Vec::new() },
    })
}

/// Groups hits by the key `key_of` assigns them and resolves every group.
///
/// Hits without a key are ignored. Groups without candidates never appear
/// in the result, which downstream callers treat as missing data.
pub fn resolve_by<F>(hits: &[HitRecord], key_of: F) -> BTreeMap<String, ResolvedCall>
where
    F: Fn(&HitRecord) -> Option<String>,
{
    hits.iter()
        .filter_map(|hit| key_of(hit).map(|key| (key, hit)))
        .into_group_map()
        .into_iter()
        .filter_map(|(key, candidates)| {
            resolve_locus(&key, &candidates).map(|call| (key, call))
        })
        .collect()
}
