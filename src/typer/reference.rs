use crate::typer::calls::{AntigenCatalog, ProfileTable};
use crate::utils::Result;
use std::path::{Path, PathBuf};

/// Which reference sequence set an alignment runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceSet {
    MlstAlleles,
    Antigens,
}

impl ReferenceSet {
    pub fn module_name(&self) -> &'static str {
        match self {
            ReferenceSet::MlstAlleles => "mlst",
            ReferenceSet::Antigens => "serotype",
        }
    }
}

/// Locations of the reference files under the database directory.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencePaths {
    pub mlst_profiles: PathBuf,
    pub mlst_alleles: PathBuf,
    pub o_antigens: PathBuf,
    pub h_antigens: PathBuf,
}

impl ReferencePaths {
    pub fn new(db_dir: &Path, scheme: &str) -> Self {
        let mlst_dir = db_dir.join("mlst");
        let candidates = [
            format!("{}.txt", scheme),
            format!("{}.txt.gz", scheme),
            format!("{}.tsv", scheme),
            format!("{}.tsv.gz", scheme),
        ];
        let mlst_profiles = candidates
            .iter()
            .map(|name| mlst_dir.join(name))
            .find(|path| path.is_file())
            .unwrap_or_else(|| mlst_dir.join(&candidates[0]));
        let serotype_dir = db_dir.join("serotype");
        ReferencePaths {
            mlst_profiles,
            mlst_alleles: mlst_dir.join("alleles.fasta"),
            o_antigens: serotype_dir.join("O_type.fsa"),
            h_antigens: serotype_dir.join("H_type.fsa"),
        }
    }

    pub fn fasta_for(&self, set: ReferenceSet) -> Vec<&Path> {
        match set {
            ReferenceSet::MlstAlleles => vec![&self.mlst_alleles],
            ReferenceSet::Antigens => vec![&self.o_antigens, &self.h_antigens],
        }
    }

    /// Files the run needs; allele sequences only matter when an aligner is run.
    pub fn required(&self, needs_sequences: bool) -> Vec<(&'static str, &Path)> {
        let mut required = vec![
            ("MLST profiles", self.mlst_profiles.as_path()),
            ("O-antigen genes", self.o_antigens.as_path()),
            ("H-antigen genes", self.h_antigens.as_path()),
        ];
        if needs_sequences {
            required.push(("MLST alleles", self.mlst_alleles.as_path()));
        }
        required
    }

    pub fn missing(&self, needs_sequences: bool) -> Vec<(&'static str, &Path)> {
        self.required(needs_sequences)
            .into_iter()
            .filter(|(_, path)| !path.is_file())
            .collect()
    }
}

/// Reference data shared read-only by every worker for the whole run.
#[derive(Debug)]
pub struct ReferenceDb {
    pub paths: ReferencePaths,
    pub profiles: ProfileTable,
    pub antigens: AntigenCatalog,
}

impl ReferenceDb {
    pub fn load(paths: ReferencePaths, scheme: &str, needs_sequences: bool) -> Result<Self> {
        if let Some((what, path)) = paths.missing(needs_sequences).first() {
            return Err(format!("Reference database file missing ({}): {}", what, path.display()));
        }
        let profiles = ProfileTable::from_path(scheme, &paths.mlst_profiles)?;
        if profiles.is_empty() {
            return Err(format!(
                "MLST profile table has no profiles: {}",
                paths.mlst_profiles.display()
            ));
        }
        let antigens = AntigenCatalog::from_fasta(&paths.o_antigens, &paths.h_antigens)?;
        log::info!(
            "Loaded scheme {} ({} profiles) and {} antigen references",
            scheme,
            profiles.len(),
            antigens.len()
        );
        Ok(ReferenceDb {
            paths,
            profiles,
            antigens,
        })
    }
}
