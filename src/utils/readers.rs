use super::Result;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Read as ioRead};
use std::path::Path;

const VALID_NUCLEOTIDES: &[u8] = b"ACGTNacgtnRYSWKMBDHVryswkmbdhv-";

pub fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".gzip")
}

/// Opens a plain or gzip-compressed text file.
pub fn open_text_reader(path: &Path) -> Result<BufReader<Box<dyn ioRead + Send>>> {
    let file = File::open(path).map_err(|e| format!("{}: {}", path.display(), e))?;
    if is_gzipped(path) {
        let gz_decoder = MultiGzDecoder::new(file);
        if gz_decoder.header().is_some() {
            Ok(BufReader::new(Box::new(gz_decoder)))
        } else {
            Err(format!("Invalid gzip header: {}", path.to_string_lossy()))
        }
    } else {
        Ok(BufReader::new(Box::new(file)))
    }
}

/// Checks that `path` holds nucleotide FASTA and returns the number of records.
pub fn validate_fasta(path: &Path) -> Result<usize> {
    let reader = open_text_reader(path)?;
    validate_fasta_reader(reader).map_err(|e| format!("{}: {}", path.display(), e))
}

pub fn validate_fasta_reader<R: BufRead>(reader: R) -> Result<usize> {
    let mut num_records = 0;
    let mut seq_len = 0;
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("Error reading line {}: {}", line_number + 1, e))?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix('>') {
            if num_records > 0 && seq_len == 0 {
                return Err(format!("Empty sequence before line {}", line_number + 1));
            }
            if header.trim().is_empty() {
                return Err(format!("Missing record name at line {}", line_number + 1));
            }
            num_records += 1;
            seq_len = 0;
            continue;
        }
        if num_records == 0 {
            return Err("Invalid FASTA: first record must start with '>'".to_string());
        }
        if let Some(pos) = line.bytes().position(|b| !VALID_NUCLEOTIDES.contains(&b)) {
            return Err(format!(
                "Invalid nucleotide '{}' at line {}",
                line.as_bytes()[pos] as char,
                line_number + 1
            ));
        }
        seq_len += line.len();
    }
    match (num_records, seq_len) {
        (0, _) => Err("No FASTA records found".to_string()),
        (_, 0) => Err("Last FASTA record has an empty sequence".to_string()),
        _ => Ok(num_records),
    }
}

/// Reads the record names of a FASTA file (text after '>' up to the first whitespace).
pub fn read_fasta_names(path: &Path) -> Result<Vec<String>> {
    let reader = open_text_reader(path)?;
    let mut names = Vec::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| {
            format!("{}: error reading line {}: {}", path.display(), line_number + 1, e)
        })?;
        if let Some(header) = line.strip_prefix('>') {
            let name = header.split_whitespace().next().ok_or_else(|| {
                format!("{}: missing record name at line {}", path.display(), line_number + 1)
            })?;
            names.push(name.to_string());
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_validate_fasta_counts_records() {
        let data = ">contig_1 len=8\nACGTACGT\nNNAC\n\n>contig_2\nacgt\n";
        assert_eq!(validate_fasta_reader(Cursor::new(data)), Ok(2));
    }

    #[test]
    fn test_validate_fasta_rejects_missing_header() {
        let data = "ACGT\n>contig_1\nACGT\n";
        assert!(validate_fasta_reader(Cursor::new(data)).is_err());
    }

    #[test]
    fn test_validate_fasta_rejects_protein_characters() {
        let data = ">contig_1\nACGTQQ\n";
        assert_eq!(
            validate_fasta_reader(Cursor::new(data)),
            Err("Invalid nucleotide 'Q' at line 2".to_string())
        );
    }

    #[test]
    fn test_validate_fasta_rejects_empty_record() {
        let data = ">contig_1\n>contig_2\nACGT\n";
        assert!(validate_fasta_reader(Cursor::new(data)).is_err());
        let data = ">contig_1\nACGT\n>contig_2\n";
        assert!(validate_fasta_reader(Cursor::new(data)).is_err());
    }

    #[test]
    fn test_validate_fasta_empty_input() {
        assert!(validate_fasta_reader(Cursor::new("")).is_err());
    }
}
