//! Seams to the external tools: the sequence aligner and the phylogroup classifier.

mod blastn;
mod ezclermont;
mod precomputed;

pub use blastn::BlastnAligner;
pub use ezclermont::EzClermont;
pub use precomputed::PrecomputedHits;

use crate::typer::{calls::RawPhylotype, hits::HitRecord, reference::ReferenceSet};
use crate::utils::Result;
use std::path::Path;

pub trait Aligner: Send + Sync {
    /// Aligns the sample genome against one reference set.
    fn align(&self, sample: &Path, set: ReferenceSet) -> Result<Vec<HitRecord>>;

    fn name(&self) -> &str;

    fn version(&self) -> Option<String>;
}

pub trait PhylogroupClassifier: Send + Sync {
    fn classify(&self, sample: &Path) -> Result<RawPhylotype>;

    fn name(&self) -> &str;

    fn version(&self) -> Option<String>;
}
