mod sample_result;
mod typing;

pub use sample_result::{SampleJob, SampleResult, SampleStatus};
pub use typing::{analyze_sample, Collaborators, Params};
