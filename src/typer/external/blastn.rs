use super::Aligner;
use crate::typer::{
    hits::{read_hits, HitRecord, BLAST_OUTFMT},
    reference::{ReferencePaths, ReferenceSet},
};
use crate::utils::{find_executable, open_text_reader, tool_version, Result};
use std::{
    io::{self, Cursor},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    thread,
};

pub struct BlastnAligner {
    program: PathBuf,
    references: ReferencePaths,
}

impl BlastnAligner {
    pub fn new(references: ReferencePaths) -> Result<Self> {
        Ok(BlastnAligner {
            program: find_executable("blastn")?,
            references,
        })
    }

    fn run(&self, sample: &Path, subject: &Path) -> Result<Vec<HitRecord>> {
        // Gzipped genomes are decompressed straight into blastn's stdin
        let mut query = open_text_reader(sample)?;
        let mut child = Command::new(&self.program)
            .arg("-query")
            .arg("-")
            .arg("-subject")
            .arg(subject)
            .args(["-outfmt", BLAST_OUTFMT])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| format!("Failed to start {}: {}", self.program.display(), e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| "blastn stdin unavailable".to_string())?;
        let feeder = thread::spawn(move || io::copy(&mut query, &mut stdin).map(|_| ()));

        let output = child
            .wait_with_output()
            .map_err(|e| format!("blastn did not finish: {}", e))?;
        let streamed = feeder
            .join()
            .map_err(|_| "blastn input thread panicked".to_string())?;

        if !output.status.success() {
            return Err(format!(
                "blastn failed on {} ({}): {}",
                sample.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }
        streamed.map_err(|e| format!("Failed to stream {} to blastn: {}", sample.display(), e))?;
        read_hits(Cursor::new(output.stdout), HitRecord::from_blast_line)
    }
}

impl Aligner for BlastnAligner {
    fn align(&self, sample: &Path, set: ReferenceSet) -> Result<Vec<HitRecord>> {
        let mut hits = Vec::new();
        for subject in self.references.fasta_for(set) {
            hits.extend(self.run(sample, subject)?);
        }
        log::debug!(
            "{}: blastn reported {} {} hits",
            sample.display(),
            hits.len(),
            set.module_name()
        );
        Ok(hits)
    }

    fn name(&self) -> &str {
        "blastn"
    }

    fn version(&self) -> Option<String> {
        tool_version(&self.program, &["-version"])
    }
}
