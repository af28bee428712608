use crate::cli::Cli;
use crate::typer::reference::ReferencePaths;
use crate::utils::{find_executable, tool_version, Result};

/// Reports the external tools and database files a run would need.
pub fn check(args: &Cli) -> Result<()> {
    let mut problems = Vec::new();

    if args.hits_dir.is_none() {
        for (tool, version_arg) in [("blastn", "-version"), ("ezclermont", "--version")] {
            match find_executable(tool) {
                Ok(path) => {
                    let version = tool_version(&path, &[version_arg])
                        .unwrap_or_else(|| "unknown version".to_string());
                    log::info!("{}: {} ({})", tool, path.display(), version);
                }
                Err(e) => problems.push(e),
            }
        }
    }

    let paths = ReferencePaths::new(&args.db_dir, &args.scheme);
    let needs_sequences = args.hits_dir.is_none();
    for (what, path) in paths.required(needs_sequences) {
        if path.is_file() {
            log::info!("{}: {}", what, path.display());
        } else {
            problems.push(format!(
                "Reference database file missing ({}): {}",
                what,
                path.display()
            ));
        }
    }

    if problems.is_empty() {
        log::info!("All dependencies found");
        Ok(())
    } else {
        for problem in &problems {
            log::error!("{}", problem);
        }
        Err(format!("{} dependency checks failed", problems.len()))
    }
}
