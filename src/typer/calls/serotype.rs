use crate::typer::{
    hits::{filter_hits, HitRecord, Thresholds},
    resolver::{resolve_by, ResolvedCall},
};
use crate::utils::{read_fasta_names, Result};
use serde::{Serialize, Serializer};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    path::Path,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AntigenFamily {
    O,
    H,
}

impl AntigenFamily {
    pub fn key(&self) -> &'static str {
        match self {
            AntigenFamily::O => "O",
            AntigenFamily::H => "H",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct AntigenEntry {
    family: AntigenFamily,
    antigen: String,
}

/// Maps antigen gene reference ids to their family and antigen type.
#[derive(Debug, Default)]
pub struct AntigenCatalog {
    entries: HashMap<String, AntigenEntry>,
}

/// Antigen type encoded as the last `_` field of ids like `wzx_1_AB811597_O157`.
pub fn antigen_type_of(reference_id: &str) -> Option<&str> {
    let (gene, antigen) = reference_id.rsplit_once('_')?;
    if gene.is_empty() || antigen.is_empty() {
        None
    } else {
        Some(antigen)
    }
}

impl AntigenCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, family: AntigenFamily, reference_id: &str) -> Result<()> {
        let antigen = antigen_type_of(reference_id)
            .ok_or_else(|| format!("Cannot derive antigen type from '{}'", reference_id))?
            .to_string();
        let entry = AntigenEntry { family, antigen };
        match self.entries.get(reference_id) {
            Some(existing) if existing.family != family => Err(format!(
                "Reference '{}' is listed as both {}- and {}-antigen",
                reference_id,
                existing.family.key(),
                family.key()
            )),
            _ => {
                self.entries.insert(reference_id.to_string(), entry);
                Ok(())
            }
        }
    }

    /// Builds the catalog from the record names of the O and H antigen FASTA files.
    pub fn from_fasta(o_path: &Path, h_path: &Path) -> Result<Self> {
        let mut catalog = Self::new();
        for (family, path) in [(AntigenFamily::O, o_path), (AntigenFamily::H, h_path)] {
            let names = read_fasta_names(path)?;
            if names.is_empty() {
                return Err(format!("No antigen sequences in {}", path.display()));
            }
            for name in names {
                catalog
                    .insert(family, &name)
                    .map_err(|e| format!("{}: {}", path.display(), e))?;
            }
        }
        log::debug!("Loaded {} antigen reference entries", catalog.len());
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn family_of(&self, reference_id: &str) -> Option<AntigenFamily> {
        self.entries.get(reference_id).map(|e| e.family)
    }

    pub fn antigen_of(&self, reference_id: &str) -> Option<&str> {
        self.entries.get(reference_id).map(|e| e.antigen.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AntigenType {
    Typed(String),
    Untypable,
}

impl AntigenType {
    pub fn is_typed(&self) -> bool {
        matches!(self, AntigenType::Typed(_))
    }
}

impl fmt::Display for AntigenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AntigenType::Typed(antigen) => write!(f, "{}", antigen),
            AntigenType::Untypable => write!(f, "untypable"),
        }
    }
}

impl Serialize for AntigenType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SerotypeCall {
    pub o_type: AntigenType,
    pub h_type: AntigenType,
}

impl SerotypeCall {
    pub fn untypable() -> Self {
        SerotypeCall {
            o_type: AntigenType::Untypable,
            h_type: AntigenType::Untypable,
        }
    }

    /// Combined serotype such as `O157:H7`, or the one typed side alone.
    pub fn serotype(&self) -> String {
        match (&self.o_type, &self.h_type) {
            (AntigenType::Typed(o), AntigenType::Typed(h)) => format!("{}:{}", o, h),
            (AntigenType::Typed(o), AntigenType::Untypable) => o.clone(),
            (AntigenType::Untypable, AntigenType::Typed(h)) => h.clone(),
            (AntigenType::Untypable, AntigenType::Untypable) => "untypable".to_string(),
        }
    }
}

/// Serotype call together with the evidence it was made from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SerotypeOutcome {
    pub call: SerotypeCall,
    pub families: BTreeMap<String, ResolvedCall>,
    pub hits: Vec<HitRecord>,
}

impl SerotypeOutcome {
    pub fn unavailable() -> Self {
        SerotypeOutcome {
            call: SerotypeCall::untypable(),
            families: BTreeMap::new(),
            hits: Vec::new(),
        }
    }
}

fn antigen_side(
    family: AntigenFamily,
    families: &BTreeMap<String, ResolvedCall>,
    catalog: &AntigenCatalog,
) -> AntigenType {
    match families.get(family.key()) {
        None => AntigenType::Untypable,
        Some(call) if call.ambiguous => {
            log::debug!(
                "{}-antigen left untypable, tied entries: {}",
                family.key(),
                call.tied_reference_ids.join(",")
            );
            AntigenType::Untypable
        }
        Some(call) => catalog
            .antigen_of(&call.chosen_reference_id)
            .map_or(AntigenType::Untypable, |antigen| {
                AntigenType::Typed(antigen.to_string())
            }),
    }
}

/// Resolves the O and H families independently; hits outside the catalog are ignored.
pub fn call_serotype(
    hits: Vec<HitRecord>,
    thresholds: &Thresholds,
    catalog: &AntigenCatalog,
) -> SerotypeOutcome {
    let hits = filter_hits(hits, thresholds);
    let families = resolve_by(&hits, |hit| {
        catalog
            .family_of(&hit.reference_id)
            .map(|family| family.key().to_string())
    });
    let call = SerotypeCall {
        o_type: antigen_side(AntigenFamily::O, &families, catalog),
        h_type: antigen_side(AntigenFamily::H, &families, catalog),
    };
    SerotypeOutcome {
        call,
        families,
        hits,
    }
}
