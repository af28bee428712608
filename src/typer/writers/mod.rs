mod write_json;
mod write_tsv;

pub use write_json::{
    write_run_metadata, write_sample_json, RunConfiguration, RunMetadata, RUN_METADATA_FILE,
};
pub use write_tsv::{write_tables, Table, TsvWriter};
