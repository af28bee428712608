use super::{SampleJob, SampleResult};
use crate::typer::{
    calls::{call_mlst, call_serotype, classify, PhylogroupCall},
    external::{Aligner, PhylogroupClassifier},
    hits::{HitRecord, Thresholds},
    reference::{ReferenceDb, ReferenceSet},
    scheduler::CancelToken,
};
use crate::utils::{validate_fasta, Result};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
pub struct Params {
    pub mlst_thresholds: Thresholds,
    pub serotype_thresholds: Thresholds,
}

/// External tools shared by every worker.
#[derive(Clone)]
pub struct Collaborators {
    pub aligner: Arc<dyn Aligner>,
    pub classifier: Arc<dyn PhylogroupClassifier>,
}

fn align(tools: &Collaborators, job: &SampleJob, set: ReferenceSet) -> Result<Vec<HitRecord>> {
    tools.aligner.align(&job.path, set).map_err(|e| {
        format!(
            "{} alignment with {} failed: {}",
            set.module_name(),
            tools.aligner.name(),
            e
        )
    })
}

/// Types one sample end to end.
///
/// Returns `None` when the run was cancelled while the sample was in flight;
/// such samples are not reported.
pub fn analyze_sample(
    job: &SampleJob,
    db: &ReferenceDb,
    params: &Params,
    tools: &Collaborators,
    cancel: &CancelToken,
) -> Option<SampleResult> {
    let scheme = db.profiles.scheme.as_str();
    let failed = |detail: String| {
        log::warn!("{}: typing failed: {}", job.sample_id, detail);
        Some(SampleResult::failed(job, scheme, detail))
    };

    match validate_fasta(&job.path) {
        Ok(num_records) => log::debug!("{}: {} contigs", job.sample_id, num_records),
        Err(e) => return failed(format!("{}: {}", job.path.display(), e)),
    }

    let mlst_hits = match align(tools, job, ReferenceSet::MlstAlleles) {
        Ok(hits) => hits,
        Err(e) => return failed(e),
    };
    if cancel.is_cancelled() {
        return None;
    }
    let serotype_hits = match align(tools, job, ReferenceSet::Antigens) {
        Ok(hits) => hits,
        Err(e) => return failed(e),
    };
    if cancel.is_cancelled() {
        return None;
    }
    if mlst_hits.is_empty() && serotype_hits.is_empty() {
        return failed("no alignment hits against any reference set".to_string());
    }

    let mut notes = Vec::new();
    let phylogroup = match tools.classifier.classify(&job.path) {
        Ok(raw) => classify(&raw, tools.classifier.name()),
        Err(e) => {
            log::warn!("{}: {}", job.sample_id, e);
            notes.push(format!("phylogroup classifier failed: {}", e));
            PhylogroupCall::unresolved()
        }
    };
    if cancel.is_cancelled() {
        return None;
    }

    let mlst = call_mlst(mlst_hits, &params.mlst_thresholds, &db.profiles);
    let serotype = call_serotype(serotype_hits, &params.serotype_thresholds, &db.antigens);
    log::debug!(
        "{}: ST {} [{}], serotype {}, phylogroup {} ({})",
        job.sample_id,
        mlst.sequence_type,
        mlst.profile.to_allele_string(),
        serotype.call.serotype(),
        phylogroup.phylogroup,
        phylogroup.method
    );

    Some(SampleResult::from_calls(job, mlst, serotype, phylogroup, notes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typer::{
        calls::{
            AntigenCatalog, AntigenFamily, AntigenType, Phylogroup, ProfileTable, RawPhylotype,
            SequenceType,
        },
        hits::Strand,
        reference::ReferencePaths,
        workflows::SampleStatus,
    };
    use std::{fs, path::Path};

    struct StaticAligner {
        mlst: Vec<HitRecord>,
        serotype: Vec<HitRecord>,
    }

    impl Aligner for StaticAligner {
        fn align(&self, _sample: &Path, set: ReferenceSet) -> Result<Vec<HitRecord>> {
            Ok(match set {
                ReferenceSet::MlstAlleles => self.mlst.clone(),
                ReferenceSet::Antigens => self.serotype.clone(),
            })
        }

        fn name(&self) -> &str {
            "static"
        }

        fn version(&self) -> Option<String> {
            None
        }
    }

    struct FailingClassifier;

    impl PhylogroupClassifier for FailingClassifier {
        fn classify(&self, _sample: &Path) -> Result<RawPhylotype> {
            Err("exit status 2".to_string())
        }

        fn name(&self) -> &str {
            "failing"
        }

        fn version(&self) -> Option<String> {
            None
        }
    }

    fn hit(reference_id: &str, identity: f64) -> HitRecord {
        HitRecord {
            query_id: "contig_3".to_string(),
            reference_id: reference_id.to_string(),
            percent_identity: identity,
            percent_coverage: 100.0,
            alignment_length: 500,
            bit_score: 900.0,
            strand: Strand::Reverse,
        }
    }

    fn db() -> ReferenceDb {
        let profiles = ProfileTable::from_reader(
            "ecoli_achtman_4",
            "ST\tadk\tfumC\tgyrB\ticd\tmdh\tpurA\trecA\n156\t6\t11\t4\t8\t8\t8\t2\n".as_bytes(),
        )
        .unwrap();
        let mut antigens = AntigenCatalog::new();
        antigens
            .insert(AntigenFamily::H, "fliC_1_AF228492_H28")
            .unwrap();
        ReferenceDb {
            paths: ReferencePaths::new(Path::new("db"), "ecoli_achtman_4"),
            profiles,
            antigens,
        }
    }

    fn params() -> Params {
        Params {
            mlst_thresholds: Thresholds::new(95.0, 95.0).unwrap(),
            serotype_thresholds: Thresholds::new(85.0, 60.0).unwrap(),
        }
    }

    fn job(dir: &Path, contents: &str) -> SampleJob {
        let path = dir.join("S1.fasta");
        fs::write(&path, contents).unwrap();
        SampleJob {
            index: 0,
            sample_id: "S1".to_string(),
            path,
        }
    }

    fn tools(mlst: Vec<HitRecord>, serotype: Vec<HitRecord>) -> Collaborators {
        Collaborators {
            aligner: Arc::new(StaticAligner { mlst, serotype }),
            classifier: Arc::new(FailingClassifier),
        }
    }

    #[test]
    fn test_sample_typed_despite_classifier_failure() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path(), ">contig_3\nACGTACGT\n");
        let mlst = ["adk_6", "fumC_11", "gyrB_4", "icd_8", "mdh_8", "purA_8", "recA_2"]
            .iter()
            .map(|id| hit(id, 100.0))
            .collect();
        let tools = tools(mlst, vec![hit("fliC_1_AF228492_H28", 99.0)]);
        let result = analyze_sample(&job, &db(), &params(), &tools, &CancelToken::new()).unwrap();

        assert_eq!(result.mlst.sequence_type, SequenceType::Known(156));
        assert_eq!(result.serotype.o_type, AntigenType::Untypable);
        assert_eq!(result.serotype.h_type, AntigenType::Typed("H28".to_string()));
        assert_eq!(result.phylogroup.phylogroup, Phylogroup::Unresolved);
        assert_eq!(result.status, SampleStatus::Partial);
        assert_eq!(result.raw_serotype.len(), 1);
    }

    #[test]
    fn test_no_hits_fails_sample() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path(), ">contig_3\nACGT\n");
        let result = analyze_sample(&job, &db(), &params(), &tools(vec![], vec![]), &CancelToken::new())
            .unwrap();
        assert_eq!(result.status, SampleStatus::Failed);
        assert_eq!(
            result.error_detail.as_deref(),
            Some("no alignment hits against any reference set")
        );
    }

    #[test]
    fn test_malformed_fasta_fails_sample() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path(), "not a fasta\n");
        let tools = tools(vec![hit("adk_6", 100.0)], vec![]);
        let result = analyze_sample(&job, &db(), &params(), &tools, &CancelToken::new()).unwrap();
        assert!(result.is_failed());
    }

    #[test]
    fn test_cancelled_sample_is_not_reported() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path(), ">contig_3\nACGT\n");
        let cancel = CancelToken::new();
        cancel.cancel();
        let tools = tools(vec![hit("adk_6", 100.0)], vec![]);
        assert!(analyze_sample(&job, &db(), &params(), &tools, &cancel).is_none());
    }
}
