use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum CollisionPartner {
    H2 = 1,
    ParaH2 = 2,
    OrthoH2 = 3,
    Electron = 4,
    H = 5,
    He = 6,
    HPlus = 7,
}

impl CollisionPartner {
    pub const ALL: [CollisionPartner; 7] = [
        Self::H2,
        Self::ParaH2,
        Self::OrthoH2,
        Self::Electron,
        Self::H,
        Self::He,
        Self::HPlus,
    ];

    /// Numeric partner code used in LAMDA collision headers.
    pub fn lamda_id(self) -> u8 {
        self as u8
    }

    pub fn from_lamda_id(id: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.lamda_id() == id)
    }

    /// Position of the partner in dense per-partner arrays.
    pub fn index(self) -> usize {
        self as usize - 1
    }
}

#[derive(Debug, Error)]
#[error("Invalid collision partner string")]
pub struct ParseCollisionPartnerError;

impl FromStr for CollisionPartner {
    type Err = ParseCollisionPartnerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "h2" => Ok(Self::H2),
            "p-h2" | "para-h2" | "ph2" => Ok(Self::ParaH2),
            "o-h2" | "ortho-h2" | "oh2" => Ok(Self::OrthoH2),
            "e" | "e-" | "electron" | "electrons" => Ok(Self::Electron),
            "h" => Ok(Self::H),
            "he" => Ok(Self::He),
            "h+" => Ok(Self::HPlus),
            _ => Err(ParseCollisionPartnerError),
        }
    }
}

impl fmt::Display for CollisionPartner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::H2 => "H2",
                Self::ParaH2 => "p-H2",
                Self::OrthoH2 => "o-H2",
                Self::Electron => "e",
                Self::H => "H",
                Self::He => "He",
                Self::HPlus => "H+",
            }
        )
    }
}

/// Number densities (cm⁻³) per collision partner, dense over [`CollisionPartner::ALL`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PartnerDensities([f64; 7]);

impl PartnerDensities {
    /// Builds the table from (partner, density) pairs; repeated partners add up.
    pub fn from_pairs(pairs: &[(CollisionPartner, f64)]) -> Self {
        let mut densities = Self::default();
        for &(partner, density) in pairs {
            densities.0[partner.index()] += density;
        }
        densities
    }

    pub fn get(&self, partner: CollisionPartner) -> f64 {
        self.0[partner.index()]
    }

    pub fn set(&mut self, partner: CollisionPartner, density: f64) {
        self.0[partner.index()] = density;
    }

    pub fn total(&self) -> f64 {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CollisionPartner, f64)> + '_ {
        CollisionPartner::ALL.iter().map(|&p| (p, self.0[p.index()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lamda_ids_round_trip_for_every_partner() {
        for partner in CollisionPartner::ALL {
            assert_eq!(
                CollisionPartner::from_lamda_id(partner.lamda_id()),
                Some(partner)
            );
        }
        assert_eq!(CollisionPartner::from_lamda_id(0), None);
        assert_eq!(CollisionPartner::from_lamda_id(8), None);
    }

    #[test]
    fn from_str_accepts_common_spellings_case_insensitively() {
        assert_eq!("H2".parse::<CollisionPartner>().unwrap(), CollisionPartner::H2);
        assert_eq!(
            "Para-H2".parse::<CollisionPartner>().unwrap(),
            CollisionPartner::ParaH2
        );
        assert_eq!(
            "o-h2".parse::<CollisionPartner>().unwrap(),
            CollisionPartner::OrthoH2
        );
        assert_eq!(
            "electrons".parse::<CollisionPartner>().unwrap(),
            CollisionPartner::Electron
        );
        assert!("xenon".parse::<CollisionPartner>().is_err());
    }

    #[test]
    fn display_matches_parseable_form() {
        for partner in CollisionPartner::ALL {
            let text = partner.to_string();
            assert_eq!(text.parse::<CollisionPartner>().unwrap(), partner);
        }
    }

    #[test]
    fn index_is_dense_and_zero_based() {
        let indices: Vec<usize> = CollisionPartner::ALL.iter().map(|p| p.index()).collect();
        assert_eq!(indices, (0..7).collect::<Vec<_>>());
    }

    #[test]
    fn partner_densities_sum_repeated_partners() {
        let densities = PartnerDensities::from_pairs(&[
            (CollisionPartner::H2, 1.0e4),
            (CollisionPartner::Electron, 10.0),
            (CollisionPartner::H2, 5.0e3),
        ]);
        assert_eq!(densities.get(CollisionPartner::H2), 1.5e4);
        assert_eq!(densities.get(CollisionPartner::He), 0.0);
        assert_eq!(densities.total(), 1.5e4 + 10.0);
    }
}
