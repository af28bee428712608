pub mod mlst;
pub mod phylogroup;
pub mod serotype;

pub use mlst::{call_mlst, AllelicProfile, MlstCall, ProfileTable, SequenceType, ACHTMAN_LOCI, DEFAULT_SCHEME};
pub use phylogroup::{
    classify, parse_classifier_output, Phylogroup, PhylogroupCall, RawPhylotype, QUADRUPLEX_METHOD,
};
pub use serotype::{
    call_serotype, AntigenCatalog, AntigenFamily, AntigenType, SerotypeCall, SerotypeOutcome,
};
