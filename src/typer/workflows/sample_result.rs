use crate::typer::{
    calls::{AntigenType, MlstCall, PhylogroupCall, Phylogroup, SequenceType, SerotypeCall, SerotypeOutcome},
    hits::HitRecord,
    resolver::ResolvedCall,
};
use crate::utils::sample_name;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    path::PathBuf,
};

/// One input genome, numbered by its position in the expanded input list.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleJob {
    pub index: usize,
    pub sample_id: String,
    pub path: PathBuf,
}

impl SampleJob {
    /// Numbers inputs in order; a sample name already taken gets the lowest
    /// free `_<n>` suffix.
    pub fn from_inputs(paths: Vec<PathBuf>) -> Vec<SampleJob> {
        let mut assigned: HashSet<String> = HashSet::new();
        paths
            .into_iter()
            .enumerate()
            .map(|(index, path)| {
                let name = sample_name(&path);
                let sample_id = if !assigned.contains(&name) {
                    name
                } else {
                    let renamed = (2..)
                        .map(|n| format!("{}_{}", name, n))
                        .find(|candidate| !assigned.contains(candidate))
                        .unwrap_or_default();
                    log::warn!(
                        "Sample name {} is used more than once, reporting {} as {}",
                        name,
                        path.display(),
                        renamed
                    );
                    renamed
                };
                assigned.insert(sample_id.clone());
                SampleJob {
                    index,
                    sample_id,
                    path,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleStatus {
    Ok,
    Partial,
    Failed,
}

impl fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            SampleStatus::Ok => "ok",
            SampleStatus::Partial => "partial",
            SampleStatus::Failed => "failed",
        };
        write!(f, "{}", status)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleResult {
    pub sample_id: String,
    pub input_order_index: usize,
    pub input_path: PathBuf,
    pub mlst: MlstCall,
    pub serotype: SerotypeCall,
    pub serotype_families: BTreeMap<String, ResolvedCall>,
    /// Serotype hits that passed the thresholds.
    pub raw_serotype: Vec<HitRecord>,
    pub phylogroup: PhylogroupCall,
    pub status: SampleStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    pub typing_date: DateTime<Local>,
}

impl SampleResult {
    /// Combines the three calls and derives the status from what is left unresolved.
    ///
    /// `notes` carries problems found upstream of the calls, e.g. a classifier
    /// failure; any note makes the result partial.
    pub fn from_calls(
        job: &SampleJob,
        mlst: MlstCall,
        serotype: SerotypeOutcome,
        phylogroup: PhylogroupCall,
        notes: Vec<String>,
    ) -> Self {
        let mut problems = Vec::new();
        if mlst.sequence_type == SequenceType::Incomplete {
            problems.push(format!(
                "MLST profile incomplete ({})",
                mlst.profile.unresolved_loci().join(", ")
            ));
        }
        if serotype.call.o_type == AntigenType::Untypable {
            problems.push("O-antigen untypable".to_string());
        }
        if serotype.call.h_type == AntigenType::Untypable {
            problems.push("H-antigen untypable".to_string());
        }
        if phylogroup.phylogroup == Phylogroup::Unresolved && notes.is_empty() {
            problems.push("phylogroup unresolved".to_string());
        }
        problems.extend(notes);

        let (status, error_detail) = if problems.is_empty() {
            (SampleStatus::Ok, None)
        } else {
            (SampleStatus::Partial, Some(problems.join("; ")))
        };
        SampleResult {
            sample_id: job.sample_id.clone(),
            input_order_index: job.index,
            input_path: job.path.clone(),
            mlst,
            serotype: serotype.call,
            serotype_families: serotype.families,
            raw_serotype: serotype.hits,
            phylogroup,
            status,
            error_detail,
            typing_date: Local::now(),
        }
    }

    pub fn failed(job: &SampleJob, scheme: &str, detail: String) -> Self {
        SampleResult {
            sample_id: job.sample_id.clone(),
            input_order_index: job.index,
            input_path: job.path.clone(),
            mlst: MlstCall::unavailable(scheme),
            serotype: SerotypeCall::untypable(),
            serotype_families: BTreeMap::new(),
            raw_serotype: Vec::new(),
            phylogroup: PhylogroupCall::unresolved(),
            status: SampleStatus::Failed,
            error_detail: Some(detail),
            typing_date: Local::now(),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == SampleStatus::Failed
    }
}
