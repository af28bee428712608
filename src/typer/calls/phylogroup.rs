//! Phylogroup calls from the external marker-based classifier.
//!
//! The classifier's own label is used when it parses. Otherwise the marker
//! pattern is run through the Clermont quadruplex decision table.

use serde::{Serialize, Serializer};
use std::{collections::BTreeMap, fmt, str::FromStr};

pub const QUADRUPLEX_METHOD: &str = "quadruplex";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrypticClade {
    I,
    II,
    III,
    IV,
    V,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phylogroup {
    A,
    B1,
    B2,
    C,
    D,
    E,
    F,
    G,
    Cryptic(CrypticClade),
    EscherichiaUnknown,
    Unresolved,
}

impl fmt::Display for Phylogroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phylogroup::A => "A",
            Phylogroup::B1 => "B1",
            Phylogroup::B2 => "B2",
            Phylogroup::C => "C",
            Phylogroup::D => "D",
            Phylogroup::E => "E",
            Phylogroup::F => "F",
            Phylogroup::G => "G",
            Phylogroup::Cryptic(CrypticClade::I) => "cryptic-clade-I",
            Phylogroup::Cryptic(CrypticClade::II) => "cryptic-clade-II",
            Phylogroup::Cryptic(CrypticClade::III) => "cryptic-clade-III",
            Phylogroup::Cryptic(CrypticClade::IV) => "cryptic-clade-IV",
            Phylogroup::Cryptic(CrypticClade::V) => "cryptic-clade-V",
            Phylogroup::EscherichiaUnknown => "Escherichia-unknown",
            Phylogroup::Unresolved => "unresolved",
        };
        write!(f, "{}", label)
    }
}

impl Serialize for Phylogroup {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for Phylogroup {
    type Err = String;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let normalized = label.trim().replace(['_', '-'], " ");
        let clade = normalized
            .strip_prefix("cryptic clade ")
            .or_else(|| normalized.strip_prefix("clade "));
        if let Some(numeral) = clade {
            return match numeral.trim() {
                "I" => Ok(Phylogroup::Cryptic(CrypticClade::I)),
                "II" => Ok(Phylogroup::Cryptic(CrypticClade::II)),
                "III" => Ok(Phylogroup::Cryptic(CrypticClade::III)),
                "IV" => Ok(Phylogroup::Cryptic(CrypticClade::IV)),
                "V" => Ok(Phylogroup::Cryptic(CrypticClade::V)),
                _ => Err(format!("Unknown cryptic clade '{}'", label)),
            };
        }
        match normalized.as_str() {
            "A" => Ok(Phylogroup::A),
            "B1" => Ok(Phylogroup::B1),
            "B2" => Ok(Phylogroup::B2),
            "C" => Ok(Phylogroup::C),
            "D" => Ok(Phylogroup::D),
            "E" => Ok(Phylogroup::E),
            "F" => Ok(Phylogroup::F),
            "G" => Ok(Phylogroup::G),
            "cryptic" => Ok(Phylogroup::Cryptic(CrypticClade::I)),
            "U" | "unknown" | "U/cryptic" | "Escherichia unknown" => {
                Ok(Phylogroup::EscherichiaUnknown)
            }
            _ => Err(format!("Unknown phylogroup label '{}'", label)),
        }
    }
}

/// Raw output of the external classifier: its label and the marker pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RawPhylotype {
    pub label: Option<String>,
    pub markers: BTreeMap<String, bool>,
}

impl RawPhylotype {
    /// Marker presence by case-insensitive name, trying each alias in turn.
    fn marker(&self, aliases: &[&str]) -> Option<bool> {
        aliases.iter().find_map(|alias| {
            self.markers
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(alias))
                .map(|(_, &present)| present)
        })
    }
}

/// Parses classifier text output: a `<name>\t<label>` line carries the label,
/// `<marker>: +` / `<marker>: -` lines carry the marker pattern.
pub fn parse_classifier_output(text: &str) -> RawPhylotype {
    let mut raw = RawPhylotype::default();
    for line in text.lines().map(str::trim) {
        if let Some((name, sign)) = line.rsplit_once(':') {
            let present = match sign.trim() {
                "+" => Some(true),
                "-" => Some(false),
                _ => None,
            };
            if let Some(present) = present {
                raw.markers.insert(name.trim().to_string(), present);
                continue;
            }
        }
        if let Some((_, label)) = line.rsplit_once('\t') {
            if !label.trim().is_empty() {
                raw.label = Some(label.trim().to_string());
            }
        }
    }
    raw
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhylogroupCall {
    pub phylogroup: Phylogroup,
    pub method: String,
}

impl PhylogroupCall {
    pub fn unresolved() -> Self {
        PhylogroupCall {
            phylogroup: Phylogroup::Unresolved,
            method: "NA".to_string(),
        }
    }
}

/// Clermont 2013 quadruplex decision table.
pub fn quadruplex(raw: &RawPhylotype) -> Phylogroup {
    let quad = (
        raw.marker(&["arpA"]),
        raw.marker(&["chuA"]),
        raw.marker(&["yjaA"]),
        raw.marker(&["TspE4.C2", "TspE4"]),
    );
    let (arpa, chua, yjaa, tspe4) = match quad {
        (Some(a), Some(c), Some(y), Some(t)) => (a, c, y, t),
        _ => return Phylogroup::Unresolved,
    };
    let group_c = raw.marker(&["trpAgpC"]).unwrap_or(false);
    let group_e = raw.marker(&["arpAgpE"]).unwrap_or(false);

    match (arpa, chua, yjaa, tspe4) {
        (true, false, false, false) | (true, false, true, false) => {
            if group_c {
                Phylogroup::C
            } else {
                Phylogroup::A
            }
        }
        (true, false, false, true) => Phylogroup::B1,
        (false, true, false, false) => Phylogroup::F,
        (false, true, true, _) | (false, true, false, true) => Phylogroup::B2,
        (true, true, false, _) => {
            if group_e {
                Phylogroup::E
            } else {
                Phylogroup::D
            }
        }
        (true, true, true, false) => {
            if group_e {
                Phylogroup::E
            } else {
                Phylogroup::Cryptic(CrypticClade::I)
            }
        }
        (false, false, true, false) => Phylogroup::Cryptic(CrypticClade::I),
        (false, false, false, false) => Phylogroup::EscherichiaUnknown,
        _ => Phylogroup::Unresolved,
    }
}

/// Maps the classifier output to a call tagged with the method that made it.
pub fn classify(raw: &RawPhylotype, classifier_name: &str) -> PhylogroupCall {
    if let Some(label) = &raw.label {
        match label.parse::<Phylogroup>() {
            Ok(phylogroup) => {
                return PhylogroupCall {
                    phylogroup,
                    method: classifier_name.to_string(),
                }
            }
            Err(e) => log::debug!("{}: {}, falling back to marker table", classifier_name, e),
        }
    }
    match quadruplex(raw) {
        Phylogroup::Unresolved => PhylogroupCall::unresolved(),
        phylogroup => PhylogroupCall {
            phylogroup,
            method: QUADRUPLEX_METHOD.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers(pattern: &[(&str, bool)]) -> RawPhylotype {
        RawPhylotype {
            label: None,
            markers: pattern
                .iter()
                .map(|(name, present)| (name.to_string(), *present))
                .collect(),
        }
    }

    fn quad(arpa: bool, chua: bool, yjaa: bool, tspe4: bool) -> RawPhylotype {
        markers(&[
            ("arpA", arpa),
            ("chuA", chua),
            ("yjaA", yjaa),
            ("TspE4.C2", tspe4),
        ])
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!("B2".parse::<Phylogroup>(), Ok(Phylogroup::B2));
        assert_eq!(
            "cryptic_clade_IV".parse::<Phylogroup>(),
            Ok(Phylogroup::Cryptic(CrypticClade::IV))
        );
        assert_eq!(
            "clade V".parse::<Phylogroup>(),
            Ok(Phylogroup::Cryptic(CrypticClade::V))
        );
        assert_eq!("U".parse::<Phylogroup>(), Ok(Phylogroup::EscherichiaUnknown));
        assert!("EC_control_fail".parse::<Phylogroup>().is_err());
        assert!("clade VI".parse::<Phylogroup>().is_err());
    }

    #[test]
    fn test_parse_classifier_output() {
        let text = "trpA: +\ntrpBA_control: +\narpA: -\nchuA: +\nyjaA: +\nTspE4: -\nEC958\tB2\n";
        let raw = parse_classifier_output(text);
        assert_eq!(raw.label.as_deref(), Some("B2"));
        assert_eq!(raw.markers.len(), 6);
        assert!(raw.markers["chuA"]);
        assert!(!raw.markers["arpA"]);
    }

    #[test]
    fn test_classifier_label_takes_precedence() {
        let mut raw = quad(true, false, false, true);
        raw.label = Some("B2".to_string());
        let call = classify(&raw, "ezclermont");
        assert_eq!(call.phylogroup, Phylogroup::B2);
        assert_eq!(call.method, "ezclermont");
    }

    #[test]
    fn test_unparseable_label_falls_back_to_markers() {
        let mut raw = quad(true, false, false, true);
        raw.label = Some("EC_control_fail".to_string());
        let call = classify(&raw, "ezclermont");
        assert_eq!(call.phylogroup, Phylogroup::B1);
        assert_eq!(call.method, QUADRUPLEX_METHOD);
    }

    #[test]
    fn test_quadruplex_table() {
        assert_eq!(quadruplex(&quad(true, false, false, false)), Phylogroup::A);
        assert_eq!(quadruplex(&quad(true, false, true, false)), Phylogroup::A);
        assert_eq!(quadruplex(&quad(true, false, false, true)), Phylogroup::B1);
        assert_eq!(quadruplex(&quad(false, true, false, false)), Phylogroup::F);
        assert_eq!(quadruplex(&quad(false, true, true, false)), Phylogroup::B2);
        assert_eq!(quadruplex(&quad(false, true, true, true)), Phylogroup::B2);
        assert_eq!(quadruplex(&quad(false, true, false, true)), Phylogroup::B2);
        assert_eq!(quadruplex(&quad(true, true, false, false)), Phylogroup::D);
        assert_eq!(quadruplex(&quad(true, true, false, true)), Phylogroup::D);
        assert_eq!(
            quadruplex(&quad(true, true, true, false)),
            Phylogroup::Cryptic(CrypticClade::I)
        );
        assert_eq!(
            quadruplex(&quad(false, false, true, false)),
            Phylogroup::Cryptic(CrypticClade::I)
        );
        assert_eq!(
            quadruplex(&quad(false, false, false, false)),
            Phylogroup::EscherichiaUnknown
        );
        assert_eq!(quadruplex(&quad(true, true, true, true)), Phylogroup::Unresolved);
    }

    #[test]
    fn test_quadruplex_group_specific_markers() {
        let mut raw = quad(true, false, false, false);
        raw.markers.insert("trpAgpC".to_string(), true);
        assert_eq!(quadruplex(&raw), Phylogroup::C);

        let mut raw = quad(true, true, false, true);
        raw.markers.insert("arpAgpE".to_string(), true);
        assert_eq!(quadruplex(&raw), Phylogroup::E);

        let mut raw = quad(true, true, true, false);
        raw.markers.insert("ArpAgpE".to_string(), true);
        assert_eq!(quadruplex(&raw), Phylogroup::E);
    }

    #[test]
    fn test_missing_markers_are_unresolved() {
        let raw = markers(&[("arpA", true), ("chuA", false)]);
        assert_eq!(classify(&raw, "ezclermont"), PhylogroupCall::unresolved());
        assert_eq!(classify(&RawPhylotype::default(), "x").method, "NA");
    }

    #[test]
    fn test_tspe4_alias() {
        let raw = markers(&[
            ("arpA", true),
            ("chuA", false),
            ("yjaA", false),
            ("TspE4", true),
        ]);
        assert_eq!(quadruplex(&raw), Phylogroup::B1);
    }
}
