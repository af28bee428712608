use super::Result;
use std::{
    collections::HashSet,
    env, fs,
    path::{Path, PathBuf},
};

const FASTA_EXTENSIONS: [&str; 7] = ["fasta", "fa", "fna", "fas", "fsa", "ffn", "contigs"];

fn expand_home(pattern: &str) -> String {
    match (pattern.strip_prefix("~/"), env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => pattern.to_string(),
    }
}

/// Expands input patterns into regular files, keeping first-seen order and dropping duplicates.
pub fn expand_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for pattern in patterns {
        let expanded = expand_home(pattern);
        let paths =
            glob::glob(&expanded).map_err(|e| format!("Invalid input pattern '{}': {}", pattern, e))?;
        let mut num_matched = 0;
        for entry in paths {
            let path = entry.map_err(|e| format!("Cannot read input '{}': {}", pattern, e))?;
            if !path.is_file() {
                log::debug!("Skipping non-file input {}", path.display());
                continue;
            }
            let canonical = fs::canonicalize(&path)
                .map_err(|e| format!("Cannot resolve input {}: {}", path.display(), e))?;
            num_matched += 1;
            if seen.insert(canonical.clone()) {
                files.push(canonical);
            }
        }
        if num_matched == 0 {
            log::warn!("Input pattern '{}' did not match any file", pattern);
        }
    }
    Ok(files)
}

/// Derives a sample name from an input path by stripping compression and FASTA extensions.
pub fn sample_name(path: &Path) -> String {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());
    for suffix in [".gz", ".gzip"] {
        if let Some(stripped) = name.strip_suffix(suffix) {
            name = stripped.to_string();
        }
    }
    if let Some((stem, ext)) = name.rsplit_once('.') {
        if !stem.is_empty() && FASTA_EXTENSIONS.contains(&ext.to_lowercase().as_str()) {
            name = stem.to_string();
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    #[test]
    fn test_sample_name_strips_extensions() {
        assert_eq!(sample_name(Path::new("/data/EC958.fasta")), "EC958");
        assert_eq!(sample_name(Path::new("EC958.fna.gz")), "EC958");
        assert_eq!(sample_name(Path::new("strain.v2.FA")), "strain.v2");
        assert_eq!(sample_name(Path::new("reads.txt")), "reads.txt");
        assert_eq!(sample_name(Path::new(".fasta")), ".fasta");
    }

    #[test]
    fn test_expand_inputs_glob_and_dedup() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.fasta", "a.fasta", "notes.txt"] {
            File::create(dir.path().join(name)).unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.fasta")).unwrap();
        let base = dir.path().to_string_lossy().to_string();
        let patterns = vec![
            format!("{}/*.fasta", base),
            format!("{}/a.fasta", base),
            format!("{}/missing_*.fa", base),
        ];
        let files = expand_inputs(&patterns).unwrap();
        let names: Vec<String> = files.iter().map(|p| sample_name(p)).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_expand_inputs_invalid_pattern() {
        assert!(expand_inputs(&["[".to_string()]).is_err());
    }
}
