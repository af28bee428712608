use super::HitRecord;
use crate::utils::Result;
use serde::Serialize;

/// Minimum identity and coverage, both in percent, a hit needs to count as evidence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    pub min_identity: f64,
    pub min_coverage: f64,
}

impl Thresholds {
    pub fn new(min_identity: f64, min_coverage: f64) -> Result<Self> {
        for (name, value) in [("identity", min_identity), ("coverage", min_coverage)] {
            if !(0.0..=100.0).contains(&value) {
                return Err(format!(
                    "Minimum {} must be within [0, 100], got {}",
                    name, value
                ));
            }
        }
        Ok(Self {
            min_identity,
            min_coverage,
        })
    }

    pub fn passes(&self, hit: &HitRecord) -> bool {
        hit.percent_identity >= self.min_identity && hit.percent_coverage >= self.min_coverage
    }
}

/// Keeps the hits that meet both bounds, in their original order.
pub fn filter_hits(hits: Vec<HitRecord>, thresholds: &Thresholds) -> Vec<HitRecord> {
    hits.into_iter().filter(|hit| thresholds.passes(hit)).collect()
}
