use crate::typer::{hits::Thresholds, workflows::{SampleResult, SampleStatus}};
use crate::utils::{create_writer, Result};
use chrono::{DateTime, Local};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

pub const RUN_METADATA_FILE: &str = "ecotyper_run_meta.json";

#[derive(Debug, Clone, Serialize)]
pub struct RunConfiguration {
    pub threads: usize,
    pub db: PathBuf,
    pub scheme: String,
    pub mlst_thresholds: Thresholds,
    pub serotype_thresholds: Thresholds,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hits_dir: Option<PathBuf>,
}

/// Provenance record written next to the result tables.
#[derive(Debug, Serialize)]
pub struct RunMetadata {
    pub version: String,
    pub tool_versions: BTreeMap<String, String>,
    pub start_time: DateTime<Local>,
    pub end_time: DateTime<Local>,
    pub sample_count: usize,
    pub inputs: Vec<PathBuf>,
    pub outdir: PathBuf,
    pub configuration: RunConfiguration,
    pub cancelled: bool,
    pub status_counts: BTreeMap<SampleStatus, usize>,
}

fn write_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path).map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
    writeln!(writer)
        .and_then(|_| writer.flush())
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e))
}

/// Writes `<sample>.ecotyper.json` and returns its path.
pub fn write_sample_json(outdir: &Path, result: &SampleResult) -> Result<PathBuf> {
    let file_name = format!("{}.ecotyper.json", result.sample_id);
    create_writer(outdir, &file_name, |path| {
        write_pretty(path, result)?;
        Ok(path.to_path_buf())
    })
}

pub fn write_run_metadata(outdir: &Path, metadata: &RunMetadata) -> Result<PathBuf> {
    create_writer(outdir, RUN_METADATA_FILE, |path| {
        write_pretty(path, metadata)?;
        Ok(path.to_path_buf())
    })
}
