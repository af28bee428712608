use crate::utils::Result;
use serde::Serialize;
use std::{fmt, io::BufRead, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Forward,
    #[serde(rename = "-")]
    Reverse,
}

impl FromStr for Strand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "+" | "plus" => Ok(Strand::Forward),
            "-" | "minus" => Ok(Strand::Reverse),
            _ => Err(format!("Invalid strand '{}'", s)),
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strand::Forward => write!(f, "+"),
            Strand::Reverse => write!(f, "-"),
        }
    }
}

/// One alignment of a sample sequence against a reference entry.
///
/// The reference id encodes what was hit: `<locus>_<allele>` for MLST alleles
/// and `<gene>_<n>_<accession>_<antigen>` for O/H antigen genes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HitRecord {
    pub query_id: String,
    pub reference_id: String,
    pub percent_identity: f64,
    pub percent_coverage: f64,
    pub alignment_length: usize,
    pub bit_score: f64,
    pub strand: Strand,
}

/// Output columns requested from blastn, in order.
pub const BLAST_OUTFMT: &str = "6 qseqid sseqid pident length slen bitscore sstart send";

fn parse_percent(value: &str, name: &str) -> Result<f64> {
    let percent: f64 = value
        .parse()
        .map_err(|_| format!("Invalid {} '{}'", name, value))?;
    if !(0.0..=100.0).contains(&percent) {
        return Err(format!("{} must be within [0, 100], got {}", name, percent));
    }
    Ok(percent)
}

fn parse_field<T: FromStr>(value: &str, name: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| format!("Invalid {} '{}'", name, value))
}

impl HitRecord {
    /// Parses a blastn tabular line laid out as [`BLAST_OUTFMT`].
    pub fn from_blast_line(line: &str) -> Result<Self> {
        const EXPECTED_FIELD_COUNT: usize = 8;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != EXPECTED_FIELD_COUNT {
            return Err(format!(
                "Expected {} fields in blast output, found {}: {}",
                EXPECTED_FIELD_COUNT,
                fields.len(),
                line
            ));
        }

        let alignment_length: usize = parse_field(fields[3], "alignment length")?;
        let subject_length: usize = parse_field(fields[4], "subject length")?;
        if subject_length == 0 {
            return Err(format!("Subject length is zero: {}", line));
        }
        let sstart: usize = parse_field(fields[6], "subject start")?;
        let send: usize = parse_field(fields[7], "subject end")?;
        let coverage = (alignment_length as f64 / subject_length as f64 * 100.0).min(100.0);

        Ok(HitRecord {
            query_id: fields[0].to_string(),
            reference_id: fields[1].to_string(),
            percent_identity: parse_percent(fields[2], "identity")?,
            percent_coverage: coverage,
            alignment_length,
            bit_score: parse_field(fields[5], "bit score")?,
            strand: if sstart > send {
                Strand::Reverse
            } else {
                Strand::Forward
            },
        })
    }

    /// Parses a normalized hit line:
    /// `query reference identity coverage length bitscore strand`.
    pub fn from_table_line(line: &str) -> Result<Self> {
        const EXPECTED_FIELD_COUNT: usize = 7;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() != EXPECTED_FIELD_COUNT {
            return Err(format!(
                "Expected {} fields in hit table, found {}: {}",
                EXPECTED_FIELD_COUNT,
                fields.len(),
                line
            ));
        }

        Ok(HitRecord {
            query_id: fields[0].to_string(),
            reference_id: fields[1].to_string(),
            percent_identity: parse_percent(fields[2], "identity")?,
            percent_coverage: parse_percent(fields[3], "coverage")?,
            alignment_length: parse_field(fields[4], "alignment length")?,
            bit_score: parse_field(fields[5], "bit score")?,
            strand: fields[6].parse()?,
        })
    }
}

/// Reads hits line by line, skipping blank lines and `#` comments.
pub fn read_hits<R, F>(reader: R, parse: F) -> Result<Vec<HitRecord>>
where
    R: BufRead,
    F: Fn(&str) -> Result<HitRecord>,
{
    let mut hits = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("Error reading hit line {}: {}", line_number + 1, e))?;
        let line = line.trim_end_matches(['\n', '\r']);
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let hit = parse(line).map_err(|e| format!("Error at hit line {}: {}", line_number + 1, e))?;
        hits.push(hit);
    }
    Ok(hits)
}
