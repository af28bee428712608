use super::Result;
use std::{
    env,
    path::{Path, PathBuf},
    process::Command,
};

/// Resolves `name` to an executable path, searching `PATH` for bare names.
pub fn find_executable(name: &str) -> Result<PathBuf> {
    let path = Path::new(name);
    if path.components().count() > 1 {
        return if path.is_file() {
            Ok(path.to_path_buf())
        } else {
            Err(format!("{} not found", path.display()))
        };
    }

    if let Some(paths) = env::var_os("PATH") {
        for dir in env::split_paths(&paths) {
            let full_path = dir.join(name);
            if full_path.is_file() {
                return Ok(full_path);
            }
        }
    }

    Err(format!(
        "{} not found in PATH. Please install it or add it to your PATH.",
        name
    ))
}

/// Runs `program args` and returns the first non-empty output line, if any.
pub fn tool_version(program: &Path, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    stdout
        .lines()
        .chain(stderr.lines())
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}
