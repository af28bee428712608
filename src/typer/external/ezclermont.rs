use super::PhylogroupClassifier;
use crate::typer::calls::{parse_classifier_output, RawPhylotype};
use crate::utils::{find_executable, is_gzipped, open_text_reader, tool_version, Result};
use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    process::Command,
};
use tempfile::NamedTempFile;

pub struct EzClermont {
    program: PathBuf,
}

impl EzClermont {
    pub fn new() -> Result<Self> {
        Ok(EzClermont {
            program: find_executable("ezclermont")?,
        })
    }
}

/// Writes a decompressed copy of a gzipped genome; ezclermont only reads plain FASTA.
/// Returns `None` when the sample is already uncompressed.
fn plain_fasta(sample: &Path) -> Result<Option<NamedTempFile>> {
    if !is_gzipped(sample) {
        return Ok(None);
    }
    let mut reader = open_text_reader(sample)?;
    let mut temp = tempfile::Builder::new()
        .prefix("ecotyper_")
        .suffix(".fasta")
        .tempfile()
        .map_err(|e| format!("Failed to create temporary FASTA: {}", e))?;
    io::copy(&mut reader, &mut temp)
        .and_then(|_| temp.flush())
        .map_err(|e| format!("Failed to decompress {}: {}", sample.display(), e))?;
    Ok(Some(temp))
}

impl PhylogroupClassifier for EzClermont {
    fn classify(&self, sample: &Path) -> Result<RawPhylotype> {
        let decompressed = plain_fasta(sample)?;
        let fasta_path = decompressed.as_ref().map_or(sample, |temp| temp.path());
        let output = Command::new(&self.program)
            .arg(fasta_path)
            .output()
            .map_err(|e| format!("Failed to start {}: {}", self.program.display(), e))?;

        // ezclermont exits non-zero for non-coli genomes but still reports markers
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let raw = parse_classifier_output(&format!("{}\n{}", stderr, stdout));
        if raw.label.is_none() && raw.markers.is_empty() {
            return Err(format!(
                "ezclermont produced no usable output for {} ({})",
                sample.display(),
                output.status
            ));
        }
        Ok(raw)
    }

    fn name(&self) -> &str {
        "ezclermont"
    }

    fn version(&self) -> Option<String> {
        tool_version(&self.program, &["--version"])
    }
}
