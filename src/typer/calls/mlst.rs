use crate::typer::{
    hits::{filter_hits, HitRecord, Thresholds},
    resolver::{resolve_by, ResolvedCall},
};
use crate::utils::{open_text_reader, Result};
use itertools::Itertools;
use serde::{Serialize, Serializer};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    io::BufRead,
    path::Path,
};

pub const NUM_MLST_LOCI: usize = 7;

/// Achtman scheme loci in profile order.
pub const ACHTMAN_LOCI: [&str; NUM_MLST_LOCI] = ["adk", "fumC", "gyrB", "icd", "mdh", "purA", "recA"];

pub const DEFAULT_SCHEME: &str = "ecoli_achtman_4";

pub type AlleleTuple = [u32; NUM_MLST_LOCI];

/// Splits an allele reference id such as `adk_13` or `purA-8` into locus and allele.
pub fn split_allele_id(reference_id: &str) -> Option<(&str, &str)> {
    let pos = reference_id.rfind(['_', '-'])?;
    let (locus, allele) = (&reference_id[..pos], &reference_id[pos + 1..]);
    if locus.is_empty() || allele.is_empty() {
        None
    } else {
        Some((locus, allele))
    }
}

fn mlst_locus_of(hit: &HitRecord) -> Option<String> {
    split_allele_id(&hit.reference_id)
        .map(|(locus, _)| locus)
        .filter(|locus| ACHTMAN_LOCI.contains(locus))
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceType {
    Known(u32),
    Novel,
    Incomplete,
}

impl fmt::Display for SequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceType::Known(st) => write!(f, "{}", st),
            SequenceType::Novel => write!(f, "novel"),
            SequenceType::Incomplete => write!(f, "incomplete"),
        }
    }
}

impl Serialize for SequenceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocusAllele {
    pub locus: String,
    pub allele: Option<u32>,
    pub ambiguous: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllelicProfile {
    pub alleles: Vec<LocusAllele>,
}

impl AllelicProfile {
    pub fn empty() -> Self {
        Self::assemble(&BTreeMap::new())
    }

    /// Builds the profile in scheme order from resolved calls keyed by locus.
    pub fn assemble(calls: &BTreeMap<String, ResolvedCall>) -> Self {
        let alleles = ACHTMAN_LOCI
            .iter()
            .map(|&locus| match calls.get(locus) {
                Some(call) => {
                    let allele = split_allele_id(&call.chosen_reference_id)
                        .and_then(|(_, allele)| allele.parse::<u32>().ok());
                    if allele.is_none() {
                        log::warn!(
                            "{}: allele id '{}' is not numeric",
                            locus,
                            call.chosen_reference_id
                        );
                    }
                    LocusAllele {
                        locus: locus.to_string(),
                        allele,
                        ambiguous: call.ambiguous,
                    }
                }
                None => LocusAllele {
                    locus: locus.to_string(),
                    allele: None,
                    ambiguous: false,
                },
            })
            .collect();
        AllelicProfile { alleles }
    }

    /// The allele tuple, present only when every locus has an unambiguous allele.
    pub fn complete_tuple(&self) -> Option<AlleleTuple> {
        let mut tuple = [0; NUM_MLST_LOCI];
        for (slot, locus) in tuple.iter_mut().zip(&self.alleles) {
            if locus.ambiguous {
                return None;
            }
            *slot = locus.allele?;
        }
        Some(tuple)
    }

    pub fn num_resolved(&self) -> usize {
        self.alleles
            .iter()
            .filter(|l| l.allele.is_some() && !l.ambiguous)
            .count()
    }

    /// Loci that keep the profile incomplete, with the reason.
    pub fn unresolved_loci(&self) -> Vec<String> {
        self.alleles
            .iter()
            .filter_map(|l| match (l.allele, l.ambiguous) {
                (_, true) => Some(format!("{} (ambiguous)", l.locus)),
                (None, false) => Some(l.locus.clone()),
                (Some(_), false) => None,
            })
            .collect()
    }

    /// Renders `adk(13) fumC(24) ...` with `-` for missing and `?` for ambiguous alleles.
    pub fn to_allele_string(&self) -> String {
        self.alleles
            .iter()
            .map(|l| {
                let allele = l.allele.map_or("-".to_string(), |a| a.to_string());
                let flag = if l.ambiguous { "?" } else { "" };
                format!("{}({}{})", l.locus, allele, flag)
            })
            .join(" ")
    }
}

/// Profile to sequence type lookup for one MLST scheme.
#[derive(Debug)]
pub struct ProfileTable {
    pub scheme: String,
    profiles: HashMap<AlleleTuple, u32>,
}

impl ProfileTable {
    pub fn from_path(scheme: &str, path: &Path) -> Result<Self> {
        let reader = open_text_reader(path)?;
        Self::from_reader(scheme, reader).map_err(|e| format!("{}: {}", path.display(), e))
    }

    /// Parses a PubMLST-style profile table: `ST` column, the seven locus
    /// columns in any order, and optional extra columns that are ignored.
    pub fn from_reader<R: BufRead>(scheme: &str, reader: R) -> Result<Self> {
        let mut lines = reader.lines().enumerate();
        let header = match lines.next() {
            Some((_, line)) => line.map_err(|e| format!("Error reading header: {}", e))?,
            None => return Err("Profile table is empty".to_string()),
        };
        let columns: Vec<&str> = header.trim_end().split('\t').collect();
        let column_of = |name: &str| {
            columns
                .iter()
                .position(|c| *c == name)
                .ok_or_else(|| format!("Profile table header lacks column '{}'", name))
        };
        let st_column = column_of("ST")?;
        let locus_columns = ACHTMAN_LOCI
            .iter()
            .map(|&locus| column_of(locus))
            .collect::<Result<Vec<_>>>()?;

        let mut profiles = HashMap::new();
        for (line_index, line) in lines {
            let line_number = line_index + 1;
            let line = line.map_err(|e| format!("Error reading line {}: {}", line_number, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.trim_end().split('\t').collect();
            let get_number = |column: usize| -> Result<u32> {
                let value = fields
                    .get(column)
                    .ok_or_else(|| format!("Missing column {} at line {}", column + 1, line_number))?;
                value.parse().map_err(|_| {
                    format!("Invalid number '{}' at line {}", value, line_number)
                })
            };

            let st = get_number(st_column)?;
            let mut tuple = [0; NUM_MLST_LOCI];
            for (slot, &column) in tuple.iter_mut().zip(&locus_columns) {
                *slot = get_number(column)?;
            }
            if let Some(existing) = profiles.insert(tuple, st) {
                return Err(format!(
                    "Duplicate profile at line {}: ST{} and ST{}",
                    line_number, existing, st
                ));
            }
        }

        log::debug!("Loaded {} profiles for scheme {}", profiles.len(), scheme);
        Ok(ProfileTable {
            scheme: scheme.to_string(),
            profiles,
        })
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn lookup(&self, profile: &AllelicProfile) -> SequenceType {
        match profile.complete_tuple() {
            None => SequenceType::Incomplete,
            Some(tuple) => match self.profiles.get(&tuple) {
                Some(&st) => SequenceType::Known(st),
                None => SequenceType::Novel,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MlstCall {
    pub scheme: String,
    pub profile: AllelicProfile,
    pub sequence_type: SequenceType,
    pub loci: BTreeMap<String, ResolvedCall>,
}

impl MlstCall {
    pub fn unavailable(scheme: &str) -> Self {
        MlstCall {
            scheme: scheme.to_string(),
            profile: AllelicProfile::empty(),
            sequence_type: SequenceType::Incomplete,
            loci: BTreeMap::new(),
        }
    }
}

pub fn call_mlst(hits: Vec<HitRecord>, thresholds: &Thresholds, table: &ProfileTable) -> MlstCall {
    let hits = filter_hits(hits, thresholds);
    let loci = resolve_by(&hits, mlst_locus_of);
    let profile = AllelicProfile::assemble(&loci);
    let sequence_type = table.lookup(&profile);
    MlstCall {
        scheme: table.scheme.clone(),
        profile,
        sequence_type,
        loci,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typer::hits::Strand;
    use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
    use std::io::Cursor;

    const PROFILES: &str = "\
ST\tadk\tfumC\tgyrB\ticd\tmdh\tpurA\trecA\tclonal_complex
10\t10\t11\t4\t8\t8\t8\t2\tST10 Cplx
131\t53\t40\t47\t13\t36\t28\t29\tST131 Cplx
156\t6\t11\t4\t8\t8\t8\t2\t
";

    fn table() -> ProfileTable {
        ProfileTable::from_reader(DEFAULT_SCHEME, Cursor::new(PROFILES)).unwrap()
    }

    fn hit(reference_id: &str, identity: f64) -> HitRecord {
        HitRecord {
            query_id: "contig_1".to_string(),
            reference_id: reference_id.to_string(),
            percent_identity: identity,
            percent_coverage: 100.0,
            alignment_length: 500,
            bit_score: 900.0,
            strand: Strand::Forward,
        }
    }

    fn profile_hits(alleles: [u32; NUM_MLST_LOCI]) -> Vec<HitRecord> {
        ACHTMAN_LOCI
            .iter()
            .zip(alleles)
            .map(|(locus, allele)| hit(&format!("{}_{}", locus, allele), 100.0))
            .collect()
    }

    fn thresholds() -> Thresholds {
        Thresholds::new(95.0, 95.0).unwrap()
    }

    #[test]
    fn test_split_allele_id() {
        assert_eq!(split_allele_id("adk_13"), Some(("adk", "13")));
        assert_eq!(split_allele_id("purA-8"), Some(("purA", "8")));
        assert_eq!(split_allele_id("my_locus_2"), Some(("my_locus", "2")));
        assert_eq!(split_allele_id("adk"), None);
        assert_eq!(split_allele_id("adk_"), None);
    }

    #[test]
    fn test_complete_profile_matches_known_st() {
        let call = call_mlst(profile_hits([6, 11, 4, 8, 8, 8, 2]), &thresholds(), &table());
        assert_eq!(call.sequence_type, SequenceType::Known(156));
        assert!(call.loci.values().all(|c| !c.ambiguous));
        assert_eq!(
            call.profile.to_allele_string(),
            "adk(6) fumC(11) gyrB(4) icd(8) mdh(8) purA(8) recA(2)"
        );
    }

    #[test]
    fn test_unknown_complete_profile_is_novel() {
        let call = call_mlst(profile_hits([6, 11, 4, 8, 8, 8, 3]), &thresholds(), &table());
        assert_eq!(call.sequence_type, SequenceType::Novel);
    }

    #[test]
    fn test_missing_locus_is_incomplete() {
        let mut hits = profile_hits([10, 11, 4, 8, 8, 8, 2]);
        hits[3].percent_identity = 80.0;
        let call = call_mlst(hits, &thresholds(), &table());
        assert_eq!(call.sequence_type, SequenceType::Incomplete);
        assert_eq!(call.profile.num_resolved(), 6);
        assert_eq!(call.profile.unresolved_loci(), vec!["icd"]);
        assert!(call.profile.to_allele_string().contains("icd(-)"));
    }

    #[test]
    fn test_ambiguous_locus_is_incomplete() {
        let mut hits = profile_hits([10, 11, 4, 8, 8, 8, 2]);
        hits.push(hit("recA_5", 100.0));
        let call = call_mlst(hits, &thresholds(), &table());
        assert_eq!(call.sequence_type, SequenceType::Incomplete);
        assert_eq!(call.profile.unresolved_loci(), vec!["recA (ambiguous)"]);
        assert!(call.profile.to_allele_string().ends_with("recA(2?)"));
    }

    #[test]
    fn test_call_is_independent_of_hit_order() {
        let table = table();
        let mut complete = profile_hits([6, 11, 4, 8, 8, 8, 2]);
        complete.push(hit("fumC_4", 99.5));
        complete.push(hit("icd_13", 96.0));
        complete.push(hit("mdh_36", 90.0));

        let mut tied = complete.clone();
        tied.push(hit("recA_5", 100.0));

        let mut rng = StdRng::seed_from_u64(11);
        for (hits, expected_st) in [
            (complete, SequenceType::Known(156)),
            (tied, SequenceType::Incomplete),
        ] {
            let expected = call_mlst(hits.clone(), &thresholds(), &table);
            assert_eq!(expected.sequence_type, expected_st);
            for _ in 0..50 {
                let mut shuffled = hits.clone();
                shuffled.shuffle(&mut rng);
                assert_eq!(call_mlst(shuffled, &thresholds(), &table), expected);
            }
        }
    }

    #[test]
    fn test_incomplete_iff_fewer_than_seven_unambiguous_loci() {
        let table = table();
        for dropped in 0..=NUM_MLST_LOCI {
            let hits = profile_hits([10, 11, 4, 8, 8, 8, 2])
                .into_iter()
                .skip(dropped)
                .collect_vec();
            let call = call_mlst(hits, &thresholds(), &table);
            let is_incomplete = call.sequence_type == SequenceType::Incomplete;
            assert_eq!(is_incomplete, call.profile.num_resolved() < NUM_MLST_LOCI);
        }
    }

    #[test]
    fn test_non_scheme_loci_are_ignored() {
        let mut hits = profile_hits([53, 40, 47, 13, 36, 28, 29]);
        hits.push(hit("uidA_1", 100.0));
        let call = call_mlst(hits, &thresholds(), &table());
        assert_eq!(call.sequence_type, SequenceType::Known(131));
        assert!(!call.loci.contains_key("uidA"));
    }

    #[test]
    fn test_profile_columns_matched_by_name() {
        let data = "recA\tpurA\tmdh\ticd\tgyrB\tfumC\tadk\tST\n2\t8\t8\t8\t4\t11\t6\t156\n";
        let table = ProfileTable::from_reader(DEFAULT_SCHEME, Cursor::new(data)).unwrap();
        let call = call_mlst(profile_hits([6, 11, 4, 8, 8, 8, 2]), &thresholds(), &table);
        assert_eq!(call.sequence_type, SequenceType::Known(156));
    }

    #[test]
    fn test_profile_table_errors() {
        let missing_locus = "ST\tadk\tfumC\n1\t1\t1\n";
        assert!(ProfileTable::from_reader("s", Cursor::new(missing_locus)).is_err());

        let bad_number = "ST\tadk\tfumC\tgyrB\ticd\tmdh\tpurA\trecA\n1\t1\t1\tx\t1\t1\t1\t1\n";
        assert!(ProfileTable::from_reader("s", Cursor::new(bad_number)).is_err());

        let duplicate = "ST\tadk\tfumC\tgyrB\ticd\tmdh\tpurA\trecA\n\
1\t1\t1\t1\t1\t1\t1\t1\n\
2\t1\t1\t1\t1\t1\t1\t1\n";
        let err = ProfileTable::from_reader("s", Cursor::new(duplicate)).unwrap_err();
        assert_eq!(err, "Duplicate profile at line 3: ST1 and ST2");

        assert!(ProfileTable::from_reader("s", Cursor::new("")).is_err());
    }

    #[test]
    fn test_sequence_type_rendering() {
        assert_eq!(SequenceType::Known(131).to_string(), "131");
        assert_eq!(SequenceType::Novel.to_string(), "novel");
        assert_eq!(
            serde_json::to_string(&SequenceType::Incomplete).unwrap(),
            "\"incomplete\""
        );
    }
}
