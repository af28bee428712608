//! Tab-separated result tables, one row per reported sample in input order.

use crate::typer::workflows::SampleResult;
use crate::utils::{create_writer, Result};
use std::{fs::File, path::Path};

/// Sentinel for fields of samples that failed before any call was made.
const MISSING: &str = "NA";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Summary,
    Mlst,
    Serotype,
    Clermont,
}

impl Table {
    pub const ALL: [Table; 4] = [Table::Summary, Table::Mlst, Table::Serotype, Table::Clermont];

    pub fn file_name(&self) -> &'static str {
        match self {
            Table::Summary => "ecotyper_summary.tsv",
            Table::Mlst => "mlst_results.tsv",
            Table::Serotype => "serotype_results.tsv",
            Table::Clermont => "clermont_results.tsv",
        }
    }

    pub fn header(&self) -> &'static [&'static str] {
        match self {
            Table::Summary => &[
                "sample",
                "mlst_scheme",
                "mlst_ST",
                "O_type",
                "H_type",
                "clermont_phylotype",
                "clermont_method",
                "status",
            ],
            Table::Mlst => &["sample", "mlst_scheme", "mlst_ST", "alleles"],
            Table::Serotype => &["sample", "O_type", "H_type", "serotype"],
            Table::Clermont => &["sample", "clermont_phylotype", "clermont_method"],
        }
    }

    pub fn row(&self, result: &SampleResult) -> Vec<String> {
        let failed = result.is_failed();
        let field = |value: String| {
            if failed {
                MISSING.to_string()
            } else {
                value
            }
        };
        let sample = result.sample_id.clone();
        let scheme = result.mlst.scheme.clone();
        let st = || field(result.mlst.sequence_type.to_string());
        let o_type = || field(result.serotype.o_type.to_string());
        let h_type = || field(result.serotype.h_type.to_string());
        let phylogroup = || field(result.phylogroup.phylogroup.to_string());
        let method = || field(result.phylogroup.method.clone());

        match self {
            Table::Summary => vec![
                sample,
                scheme,
                st(),
                o_type(),
                h_type(),
                phylogroup(),
                method(),
                result.status.to_string(),
            ],
            Table::Mlst => vec![
                sample,
                scheme,
                st(),
                field(result.mlst.profile.to_allele_string()),
            ],
            Table::Serotype => vec![
                sample,
                o_type(),
                h_type(),
                field(result.serotype.serotype()),
            ],
            Table::Clermont => vec![sample, phylogroup(), method()],
        }
    }
}

pub struct TsvWriter {
    table: Table,
    writer: csv::Writer<File>,
}

impl TsvWriter {
    /// Creates the table file and writes its header line.
    pub fn new(path: &Path, table: Table) -> Result<TsvWriter> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)
            .map_err(|e| format!("Failed to create {}: {}", path.display(), e))?;
        writer
            .write_record(table.header())
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))?;
        Ok(TsvWriter { table, writer })
    }

    pub fn write(&mut self, result: &SampleResult) -> Result<()> {
        self.writer
            .write_record(self.table.row(result))
            .map_err(|e| format!("Failed to write {} row for {}: {}", self.table.file_name(), result.sample_id, e))
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| format!("Failed to flush {}: {}", self.table.file_name(), e))
    }
}

/// Writes every result table into `outdir`; `results` must already be in input order.
pub fn write_tables(outdir: &Path, results: &[SampleResult]) -> Result<()> {
    for table in Table::ALL {
        let mut writer = create_writer(outdir, table.file_name(), |path| TsvWriter::new(path, table))?;
        for result in results {
            writer.write(result)?;
        }
        writer.finish()?;
        log::debug!("Wrote {}", outdir.join(table.file_name()).display());
    }
    Ok(())
}
