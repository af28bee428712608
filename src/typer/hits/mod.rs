mod filter;
mod hit;

pub use filter::{filter_hits, Thresholds};
pub use hit::{read_hits, HitRecord, Strand, BLAST_OUTFMT};
