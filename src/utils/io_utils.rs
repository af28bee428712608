use crate::utils::Result;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub fn create_writer<T, F>(outdir: &Path, file_name: &str, f: F) -> Result<T>
where
    F: FnOnce(&Path) -> Result<T>,
{
    let output_path = outdir.join(file_name);
    f(&output_path)
}

pub fn ensure_dir(path: &Path) -> Result<PathBuf> {
    fs::create_dir_all(path)
        .map_err(|e| format!("Cannot create output directory {}: {}", path.display(), e))?;
    Ok(path.to_path_buf())
}
