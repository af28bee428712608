use crate::cli::{Cli, FULL_VERSION};
use crate::typer::{
    external::{Aligner, BlastnAligner, EzClermont, PhylogroupClassifier, PrecomputedHits},
    hits::Thresholds,
    reference::{ReferenceDb, ReferencePaths},
    scheduler::{CancelToken, RunOutcome, SampleScheduler},
    workflows::{analyze_sample, Collaborators, Params, SampleJob},
    writers::{write_run_metadata, write_sample_json, write_tables, RunConfiguration, RunMetadata},
};
use crate::utils::{ensure_dir, expand_inputs, Result};
use chrono::Local;
use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

/// Everything a typing run needs once arguments have been validated.
pub struct RunConfig {
    pub inputs: Vec<String>,
    pub outdir: PathBuf,
    pub num_threads: usize,
    pub db_dir: PathBuf,
    pub scheme: String,
    pub params: Params,
    pub hits_dir: Option<PathBuf>,
}

impl RunConfig {
    pub fn from_cli(args: &Cli) -> Result<Self> {
        Ok(RunConfig {
            inputs: args.inputs.clone(),
            outdir: args.outdir.clone(),
            num_threads: args.num_threads,
            db_dir: args.db_dir.clone(),
            scheme: args.scheme.clone(),
            params: Params {
                mlst_thresholds: Thresholds::new(args.mlst_min_identity, args.mlst_min_coverage)?,
                serotype_thresholds: Thresholds::new(args.sero_min_identity, args.sero_min_coverage)?,
            },
            hits_dir: args.hits_dir.clone(),
        })
    }

    fn configuration(&self) -> RunConfiguration {
        RunConfiguration {
            threads: self.num_threads,
            db: self.db_dir.clone(),
            scheme: self.scheme.clone(),
            mlst_thresholds: self.params.mlst_thresholds,
            serotype_thresholds: self.params.serotype_thresholds,
            hits_dir: self.hits_dir.clone(),
        }
    }
}

/// Picks the aligner and classifier: precomputed tables when a hit directory
/// is given, otherwise blastn and ezclermont from `PATH`.
pub fn build_collaborators(config: &RunConfig, paths: &ReferencePaths) -> Result<Collaborators> {
    match &config.hits_dir {
        Some(dir) => {
            let precomputed = Arc::new(PrecomputedHits::new(dir)?);
            Ok(Collaborators {
                aligner: precomputed.clone(),
                classifier: precomputed,
            })
        }
        None => Ok(Collaborators {
            aligner: Arc::new(BlastnAligner::new(paths.clone())?),
            classifier: Arc::new(EzClermont::new()?),
        }),
    }
}

fn tool_versions(tools: &Collaborators) -> BTreeMap<String, String> {
    let aligner: &dyn Aligner = tools.aligner.as_ref();
    let classifier: &dyn PhylogroupClassifier = tools.classifier.as_ref();
    [
        (aligner.name(), aligner.version()),
        (classifier.name(), classifier.version()),
    ]
    .into_iter()
    .map(|(name, version)| (name.to_string(), version.unwrap_or_else(|| "unknown".to_string())))
    .collect()
}

pub fn ecotyper(args: Cli) -> Result<()> {
    let config = RunConfig::from_cli(&args)?;
    let outcome = run(&config, CancelToken::new())?;
    let counts = outcome.status_counts();
    log::info!(
        "Typed {} samples: {}",
        outcome.results.len(),
        counts
            .iter()
            .map(|(status, count)| format!("{} {}", count, status))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(())
}

/// Runs the whole pipeline. Errors are startup-fatal; sample failures are
/// recorded in the outcome and the output files.
pub fn run(config: &RunConfig, cancel: CancelToken) -> Result<RunOutcome> {
    let start_time = Local::now();

    let paths = ReferencePaths::new(&config.db_dir, &config.scheme);
    let needs_sequences = config.hits_dir.is_none();
    let db = Arc::new(ReferenceDb::load(paths, &config.scheme, needs_sequences)?);
    let tools = build_collaborators(config, &db.paths)?;

    let inputs = expand_inputs(&config.inputs)?;
    if inputs.is_empty() {
        return Err("No input files found".into());
    }
    log::info!("Found {} input genomes", inputs.len());
    let outdir = ensure_dir(&config.outdir)?;
    let scheduler = SampleScheduler::new(config.num_threads)?.with_cancel_token(cancel);

    let jobs = SampleJob::from_inputs(inputs.clone());
    let outcome = scheduler.run(
        jobs,
        |job, cancel| analyze_sample(job, &db, &config.params, &tools, cancel),
        |result| {
            if let Err(e) = write_sample_json(&outdir, result) {
                log::error!("{}: {}", result.sample_id, e);
            }
        },
    )?;

    write_tables(&outdir, &outcome.results)?;
    let metadata = RunMetadata {
        version: FULL_VERSION.clone(),
        tool_versions: tool_versions(&tools),
        start_time,
        end_time: Local::now(),
        sample_count: inputs.len(),
        inputs,
        outdir: outdir.clone(),
        configuration: config.configuration(),
        cancelled: outcome.cancelled,
        status_counts: outcome.status_counts(),
    };
    write_run_metadata(&outdir, &metadata)?;
    Ok(outcome)
}
