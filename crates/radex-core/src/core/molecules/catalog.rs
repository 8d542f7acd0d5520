use phf::{Map, phf_map};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Line catalog whose naming scheme is used to identify a molecule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Catalog {
    #[default]
    Jpl,
    Cologne,
}

#[derive(Debug, Error)]
#[error("Invalid catalog string (expected 'jpl' or 'cologne')")]
pub struct ParseCatalogError;

impl FromStr for Catalog {
    type Err = ParseCatalogError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jpl" => Ok(Self::Jpl),
            "cologne" | "cdms" => Ok(Self::Cologne),
            _ => Err(ParseCatalogError),
        }
    }
}

impl fmt::Display for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jpl => write!(f, "JPL"),
            Self::Cologne => write!(f, "COLOGNE"),
        }
    }
}

/// Index of a molecule in [`MOLECULES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MoleculeId(pub usize);

impl fmt::Display for MoleculeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hyperfine-resolved data set that replaces a molecule when only its lowest
/// rotational lines are requested.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HyperfineVariant {
    pub molecule: MoleculeId,
    /// Upper edge of the J=1-0 hyperfine group; the window must reach down to
    /// it for the hyperfine data to contribute any line.
    pub from_ghz: f64,
    /// Frequency of the first line the hyperfine data set does not resolve
    /// (J=2-1); substitution applies when `fmax` lies below it.
    pub below_ghz: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoleculeEntry {
    pub name: &'static str,
    pub data_file: &'static str,
    pub jpl: Option<&'static str>,
    pub cologne: Option<&'static str>,
    pub hyperfine_resolved: bool,
    pub hyperfine_variant: Option<HyperfineVariant>,
}

impl MoleculeEntry {
    pub fn catalog_name(&self, catalog: Catalog) -> Option<&'static str> {
        match catalog {
            Catalog::Jpl => self.jpl,
            Catalog::Cologne => self.cologne,
        }
    }
}

const fn entry(
    name: &'static str,
    data_file: &'static str,
    jpl: Option<&'static str>,
    cologne: Option<&'static str>,
) -> MoleculeEntry {
    MoleculeEntry {
        name,
        data_file,
        jpl,
        cologne,
        hyperfine_resolved: false,
        hyperfine_variant: None,
    }
}

const fn hyperfine_entry(
    name: &'static str,
    data_file: &'static str,
    cologne: Option<&'static str>,
) -> MoleculeEntry {
    MoleculeEntry {
        name,
        data_file,
        jpl: None,
        cologne,
        hyperfine_resolved: true,
        hyperfine_variant: None,
    }
}

const fn with_hyperfine(
    mut base: MoleculeEntry,
    target: usize,
    from_ghz: f64,
    below_ghz: f64,
) -> MoleculeEntry {
    base.hyperfine_variant = Some(HyperfineVariant {
        molecule: MoleculeId(target),
        from_ghz,
        below_ghz,
    });
    base
}

pub const HCN_ID: MoleculeId = MoleculeId(5);
pub const HCN_HFS_ID: MoleculeId = MoleculeId(6);
pub const N2H_PLUS_ID: MoleculeId = MoleculeId(8);
pub const N2H_PLUS_HFS_ID: MoleculeId = MoleculeId(9);

/// Supported molecules. A `None` catalog name marks a molecule that has no
/// entry in that catalog.
pub static MOLECULES: [MoleculeEntry; 26] = [
    entry("CO", "co.dat", Some("CO"), Some("CO, v=0")),
    entry("13CO", "13co.dat", Some("C-13-O"), Some("13CO, v=0")),
    entry("C18O", "c18o.dat", Some("CO-18"), Some("C18O, v=0")),
    entry("C17O", "c17o.dat", Some("CO-17"), Some("C17O, v=0")),
    entry("CS", "cs@lique.dat", Some("CS"), Some("CS, v=0-4")),
    with_hyperfine(
        entry("HCN", "hcn.dat", Some("HCN"), Some("HCN, v=0")),
        HCN_HFS_ID.0,
        88.6340,
        177.2612205,
    ),
    hyperfine_entry("HCN (hfs)", "hcn@hfs.dat", Some("HCN, v=0, hfs")),
    entry("HCO+", "hco+@xpol.dat", Some("HCO+"), Some("HCO+, v=0")),
    with_hyperfine(
        entry("N2H+", "n2h+@xpol.dat", Some("N2H+"), Some("N2H+, v=0")),
        N2H_PLUS_HFS_ID.0,
        93.1764,
        186.3446941,
    ),
    hyperfine_entry("N2H+ (hfs)", "n2h+@hfs.dat", Some("N2H+, v=0, hfs")),
    entry("HNC", "hnc.dat", Some("HNC"), Some("HNC, v=0")),
    entry("SiO", "sio.dat", Some("SiO"), Some("SiO, v=0-10")),
    entry("SO", "so@lique.dat", Some("SO"), Some("SO, v=0")),
    entry("SO2", "so2@lowT.dat", Some("SO2"), Some("SO2, v=0")),
    entry("OCS", "ocs@xpol.dat", Some("OCS"), Some("OCS, v=0")),
    entry("HC3N", "hc3n.dat", Some("HCCCN"), Some("HC3N, v=0")),
    entry("o-H2CO", "o-h2co.dat", None, Some("H2CO, ortho")),
    entry("p-H2CO", "p-h2co.dat", Some("H2CO"), Some("H2CO, para")),
    entry("o-NH3", "o-nh3.dat", None, Some("NH3, ortho")),
    entry("p-NH3", "p-nh3.dat", Some("NH3"), Some("NH3, para")),
    entry("A-CH3OH", "a-ch3oh.dat", Some("CH3OH"), Some("CH3OH, A")),
    entry("E-CH3OH", "e-ch3oh.dat", None, Some("CH3OH, E")),
    entry("OH", "oh.dat", Some("OH"), Some("OH, v=0")),
    entry("C", "catom.dat", Some("C-atom"), Some("C, 3P")),
    entry("C+", "c+.dat", Some("C+"), Some("C+, 2P")),
    entry("O", "oatom.dat", Some("O-atom"), None),
];

static JPL_NAMES: Map<&'static str, usize> = phf_map! {
    "CO" => 0,
    "C-13-O" => 1,
    "CO-18" => 2,
    "CO-17" => 3,
    "CS" => 4,
    "HCN" => 5,
    "HCO+" => 7,
    "N2H+" => 8,
    "HNC" => 10,
    "SiO" => 11,
    "SO" => 12,
    "SO2" => 13,
    "OCS" => 14,
    "HCCCN" => 15,
    "H2CO" => 17,
    "NH3" => 19,
    "CH3OH" => 20,
    "OH" => 22,
    "C-atom" => 23,
    "C+" => 24,
    "O-atom" => 25,
};

static COLOGNE_NAMES: Map<&'static str, usize> = phf_map! {
    "CO, v=0" => 0,
    "13CO, v=0" => 1,
    "C18O, v=0" => 2,
    "C17O, v=0" => 3,
    "CS, v=0-4" => 4,
    "HCN, v=0" => 5,
    "HCN, v=0, hfs" => 6,
    "HCO+, v=0" => 7,
    "N2H+, v=0" => 8,
    "N2H+, v=0, hfs" => 9,
    "HNC, v=0" => 10,
    "SiO, v=0-10" => 11,
    "SO, v=0" => 12,
    "SO2, v=0" => 13,
    "OCS, v=0" => 14,
    "HC3N, v=0" => 15,
    "H2CO, ortho" => 16,
    "H2CO, para" => 17,
    "NH3, ortho" => 18,
    "NH3, para" => 19,
    "CH3OH, A" => 20,
    "CH3OH, E" => 21,
    "OH, v=0" => 22,
    "C, 3P" => 23,
    "C+, 2P" => 24,
};

pub fn molecule(id: MoleculeId) -> Option<&'static MoleculeEntry> {
    MOLECULES.get(id.0)
}

/// Looks a molecule up by its name in the given catalog.
pub fn find_by_catalog_name(name: &str, catalog: Catalog) -> Option<MoleculeId> {
    let map = match catalog {
        Catalog::Jpl => &JPL_NAMES,
        Catalog::Cologne => &COLOGNE_NAMES,
    };
    map.get(name.trim()).copied().map(MoleculeId)
}

/// Looks a molecule up by its short display name or data file name.
pub fn find_by_name(name: &str) -> Option<MoleculeId> {
    let needle = name.trim();
    MOLECULES
        .iter()
        .position(|m| m.name.eq_ignore_ascii_case(needle) || m.data_file == needle)
        .map(MoleculeId)
}

/// Molecule to use for a request given the catalog and the frequency window.
/// Returns the hyperfine variant when the JPL catalog is used and the window
/// covers the J=1-0 group but stops short of J=2-1.
pub fn hyperfine_substitution(
    id: MoleculeId,
    catalog: Catalog,
    fmin_ghz: f64,
    fmax_ghz: f64,
) -> Option<HyperfineVariant> {
    if catalog != Catalog::Jpl {
        return None;
    }
    molecule(id)?
        .hyperfine_variant
        .filter(|variant| fmin_ghz <= variant.from_ghz && fmax_ghz < variant.below_ghz)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_maps_agree_with_molecule_table() {
        for (name, &index) in JPL_NAMES.entries() {
            assert_eq!(MOLECULES[index].jpl, Some(*name), "JPL entry {}", name);
        }
        for (name, &index) in COLOGNE_NAMES.entries() {
            assert_eq!(MOLECULES[index].cologne, Some(*name), "COLOGNE entry {}", name);
        }
        for (index, entry) in MOLECULES.iter().enumerate() {
            if let Some(name) = entry.jpl {
                assert_eq!(JPL_NAMES.get(name), Some(&index));
            }
            if let Some(name) = entry.cologne {
                assert_eq!(COLOGNE_NAMES.get(name), Some(&index));
            }
        }
    }

    #[test]
    fn hyperfine_ids_point_at_hyperfine_resolved_entries() {
        assert_eq!(MOLECULES[HCN_ID.0].name, "HCN");
        assert_eq!(MOLECULES[N2H_PLUS_ID.0].name, "N2H+");
        assert!(MOLECULES[HCN_HFS_ID.0].hyperfine_resolved);
        assert!(MOLECULES[N2H_PLUS_HFS_ID.0].hyperfine_resolved);
        for entry in MOLECULES.iter() {
            if let Some(variant) = entry.hyperfine_variant {
                assert!(MOLECULES[variant.molecule.0].hyperfine_resolved);
            }
        }
    }

    #[test]
    fn hyperfine_entries_have_no_jpl_name() {
        assert_eq!(MOLECULES[HCN_HFS_ID.0].catalog_name(Catalog::Jpl), None);
        assert_eq!(MOLECULES[N2H_PLUS_HFS_ID.0].catalog_name(Catalog::Jpl), None);
    }

    #[test]
    fn find_by_catalog_name_uses_the_requested_scheme() {
        assert_eq!(find_by_catalog_name("CO", Catalog::Jpl), Some(MoleculeId(0)));
        assert_eq!(find_by_catalog_name("CO", Catalog::Cologne), None);
        assert_eq!(
            find_by_catalog_name("CO, v=0", Catalog::Cologne),
            Some(MoleculeId(0))
        );
    }

    #[test]
    fn find_by_name_accepts_display_and_file_names() {
        assert_eq!(find_by_name("co"), Some(MoleculeId(0)));
        assert_eq!(find_by_name("n2h+@xpol.dat"), Some(N2H_PLUS_ID));
        assert_eq!(find_by_name("unobtainium"), None);
    }

    #[test]
    fn n2h_plus_substitutes_only_below_the_j2_1_line_with_jpl() {
        let low = hyperfine_substitution(N2H_PLUS_ID, Catalog::Jpl, 0.0, 99.0).unwrap();
        assert_eq!(low.molecule, N2H_PLUS_HFS_ID);
        assert!(hyperfine_substitution(N2H_PLUS_ID, Catalog::Jpl, 0.0, 200.0).is_none());
        assert!(hyperfine_substitution(N2H_PLUS_ID, Catalog::Cologne, 0.0, 99.0).is_none());
        assert!(hyperfine_substitution(MoleculeId(0), Catalog::Jpl, 0.0, 99.0).is_none());
    }

    #[test]
    fn window_above_the_j1_0_group_does_not_substitute() {
        assert!(hyperfine_substitution(N2H_PLUS_ID, Catalog::Jpl, 95.0, 99.0).is_none());
        assert!(hyperfine_substitution(HCN_ID, Catalog::Jpl, 90.0, 100.0).is_none());
        let exact = hyperfine_substitution(N2H_PLUS_ID, Catalog::Jpl, 93.1737, 93.1737).unwrap();
        assert_eq!(exact.molecule, N2H_PLUS_HFS_ID);
        let hcn = hyperfine_substitution(HCN_ID, Catalog::Jpl, 88.0, 89.0).unwrap();
        assert_eq!(hcn.molecule, HCN_HFS_ID);
    }

    #[test]
    fn catalog_parses_aliases() {
        assert_eq!("JPL".parse::<Catalog>().unwrap(), Catalog::Jpl);
        assert_eq!("cdms".parse::<Catalog>().unwrap(), Catalog::Cologne);
        assert!("nist".parse::<Catalog>().is_err());
    }
}
