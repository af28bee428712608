use super::{Aligner, PhylogroupClassifier};
use crate::typer::{
    calls::{parse_classifier_output, RawPhylotype},
    hits::{read_hits, HitRecord},
    reference::ReferenceSet,
};
use crate::utils::{open_text_reader, sample_name, Result};
use std::{
    io::Read,
    path::{Path, PathBuf},
};

/// Serves hits and classifier output computed ahead of time, one file per
/// sample and module: `<sample>.mlst.tsv`, `<sample>.serotype.tsv`,
/// `<sample>.phylogroup.tsv`.
pub struct PrecomputedHits {
    dir: PathBuf,
}

impl PrecomputedHits {
    pub fn new(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(format!("Hit directory does not exist: {}", dir.display()));
        }
        Ok(PrecomputedHits {
            dir: dir.to_path_buf(),
        })
    }

    fn file_for(&self, sample: &Path, module: &str) -> PathBuf {
        self.dir.join(format!("{}.{}.tsv", sample_name(sample), module))
    }
}

impl Aligner for PrecomputedHits {
    fn align(&self, sample: &Path, set: ReferenceSet) -> Result<Vec<HitRecord>> {
        let path = self.file_for(sample, set.module_name());
        let reader = open_text_reader(&path)?;
        read_hits(reader, HitRecord::from_table_line).map_err(|e| format!("{}: {}", path.display(), e))
    }

    fn name(&self) -> &str {
        "precomputed"
    }

    fn version(&self) -> Option<String> {
        Some(env!("CARGO_PKG_VERSION").to_string())
    }
}

impl PhylogroupClassifier for PrecomputedHits {
    fn classify(&self, sample: &Path) -> Result<RawPhylotype> {
        let path = self.file_for(sample, "phylogroup");
        let mut text = String::new();
        open_text_reader(&path)?
            .read_to_string(&mut text)
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        Ok(parse_classifier_output(&text))
    }

    fn name(&self) -> &str {
        "precomputed"
    }

    fn version(&self) -> Option<String> {
        Some(env!("CARGO_PKG_VERSION").to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_precomputed_hits_by_sample_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("EC958.mlst.tsv"),
            "contig_1\tadk_53\t100\t100\t536\t990\t+\n",
        )
        .unwrap();
        fs::write(dir.path().join("EC958.phylogroup.tsv"), "arpA: -\nEC958\tB2\n").unwrap();
        let source = PrecomputedHits::new(dir.path()).unwrap();
        let sample = Path::new("/genomes/EC958.fasta.gz");

        let hits = source.align(sample, ReferenceSet::MlstAlleles).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].reference_id, "adk_53");
        assert!(source.align(sample, ReferenceSet::Antigens).is_err());

        let raw = source.classify(sample).unwrap();
        assert_eq!(raw.label.as_deref(), Some("B2"));
    }

    #[test]
    fn test_missing_directory() {
        assert!(PrecomputedHits::new(Path::new("/nonexistent/hits")).is_err());
    }
}
