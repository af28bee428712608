mod executables;
mod inputs;
mod io_utils;
mod readers;
mod util;

pub use executables::{find_executable, tool_version};
pub use inputs::{expand_inputs, sample_name};
pub use io_utils::{create_writer, ensure_dir};
pub use readers::{is_gzipped, open_text_reader, read_fasta_names, validate_fasta, validate_fasta_reader};
pub use util::{handle_error_and_exit, Result};
