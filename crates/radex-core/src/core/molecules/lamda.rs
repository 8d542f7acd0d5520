use super::partner::CollisionPartner;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use thiserror::Error;

pub const MAX_LEVELS: usize = 199;
pub const MAX_LINES: usize = 1999;
pub const MAX_COLLISION_TRANSITIONS: usize = 19999;
pub const MAX_TEMPERATURES: usize = 99;
pub const MAX_PARTNERS: usize = 9;

#[derive(Debug, Clone, PartialEq)]
pub struct RawLevel {
    pub energy: f64, // cm⁻¹
    pub weight: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawTransition {
    pub upper: usize, // zero-based level index
    pub lower: usize,
    pub einstein_a: f64,    // s⁻¹
    pub frequency_ghz: f64, // rest frequency
    pub upper_energy_k: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawCollisionRate {
    pub upper: usize,
    pub lower: usize,
    pub rates: Vec<f64>, // cm³ s⁻¹, one per tabulated temperature
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPartnerTable {
    pub partner: CollisionPartner,
    pub description: String,
    pub temperatures: Vec<f64>,
    pub rates: Vec<RawCollisionRate>,
}

/// Molecular data as stored in a LAMDA-format resource, before any
/// interpretation beyond syntax and index ranges.
#[derive(Debug, Clone, PartialEq)]
pub struct RawMoleculeRecord {
    pub name: String,
    pub molecular_weight: f64,
    pub levels: Vec<RawLevel>,
    pub transitions: Vec<RawTransition>,
    pub partners: Vec<RawPartnerTable>,
}

#[derive(Debug, Error)]
pub enum LamdaError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse {
        line: usize,
        kind: LamdaParseErrorKind,
    },
    #[error("Unexpected end of data while reading {0}")]
    UnexpectedEof(&'static str),
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
}

#[derive(Debug, Error)]
pub enum LamdaParseErrorKind {
    #[error("Invalid integer for {field} (value: '{value}')")]
    InvalidInt { field: &'static str, value: String },
    #[error("Invalid float for {field} (value: '{value}')")]
    InvalidFloat { field: &'static str, value: String },
    #[error("Required field {0} is missing")]
    MissingField(&'static str),
    #[error("Unknown collision partner id '{0}'")]
    UnknownPartner(String),
    #[error("{what} count {count} exceeds the supported maximum of {max}")]
    TooMany {
        what: &'static str,
        count: usize,
        max: usize,
    },
    #[error("{what} index {index} is outside 1..={max}")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        max: usize,
    },
}

/// Iterates over the data lines of a LAMDA file, skipping comments and blanks
/// while keeping track of the physical line number for error reporting.
struct DataLines<R: BufRead> {
    lines: io::Lines<R>,
    line_num: usize,
}

impl<R: BufRead> DataLines<R> {
    fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_num: 0,
        }
    }

    fn next_line(&mut self, context: &'static str) -> Result<(usize, String), LamdaError> {
        for line in self.lines.by_ref() {
            let line = line?;
            self.line_num += 1;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('!') {
                continue;
            }
            return Ok((self.line_num, trimmed.to_string()));
        }
        Err(LamdaError::UnexpectedEof(context))
    }

    fn next_count(&mut self, field: &'static str, max: usize) -> Result<usize, LamdaError> {
        let (line, content) = self.next_line(field)?;
        let mut fields = content.split_whitespace();
        let count = parse_usize(fields.next(), field, line)?;
        if count > max {
            return Err(LamdaError::Parse {
                line,
                kind: LamdaParseErrorKind::TooMany {
                    what: field,
                    count,
                    max,
                },
            });
        }
        Ok(count)
    }

    fn next_floats(&mut self, count: usize, field: &'static str) -> Result<Vec<f64>, LamdaError> {
        let mut values = Vec::with_capacity(count);
        while values.len() < count {
            let (line, content) = self.next_line(field)?;
            for token in content.split_whitespace() {
                if values.len() == count {
                    break;
                }
                values.push(parse_f64(Some(token), field, line)?);
            }
        }
        Ok(values)
    }
}

fn parse_usize(token: Option<&str>, field: &'static str, line: usize) -> Result<usize, LamdaError> {
    let value = token.ok_or(LamdaError::Parse {
        line,
        kind: LamdaParseErrorKind::MissingField(field),
    })?;
    value.parse().map_err(|_| LamdaError::Parse {
        line,
        kind: LamdaParseErrorKind::InvalidInt {
            field,
            value: value.into(),
        },
    })
}

fn parse_f64(token: Option<&str>, field: &'static str, line: usize) -> Result<f64, LamdaError> {
    let value = token.ok_or(LamdaError::Parse {
        line,
        kind: LamdaParseErrorKind::MissingField(field),
    })?;
    // Some older data files use Fortran exponent markers.
    value
        .replace(['D', 'd'], "e")
        .parse()
        .map_err(|_| LamdaError::Parse {
            line,
            kind: LamdaParseErrorKind::InvalidFloat {
                field,
                value: value.into(),
            },
        })
}

fn level_index(
    token: Option<&str>,
    field: &'static str,
    line: usize,
    nlev: usize,
) -> Result<usize, LamdaError> {
    let index = parse_usize(token, field, line)?;
    if index == 0 || index > nlev {
        return Err(LamdaError::Parse {
            line,
            kind: LamdaParseErrorKind::IndexOutOfRange {
                what: field,
                index,
                max: nlev,
            },
        });
    }
    Ok(index - 1)
}

pub struct LamdaFile;

impl LamdaFile {
    pub fn read_from(reader: &mut impl BufRead) -> Result<RawMoleculeRecord, LamdaError> {
        let mut data = DataLines::new(reader);

        let (_, name) = data.next_line("molecule name")?;
        let (line, weight_line) = data.next_line("molecular weight")?;
        let molecular_weight =
            parse_f64(weight_line.split_whitespace().next(), "molecular weight", line)?;

        let nlev = data.next_count("level", MAX_LEVELS)?;
        let mut levels = Vec::with_capacity(nlev);
        for _ in 0..nlev {
            let (line, content) = data.next_line("level")?;
            let mut fields = content.split_whitespace();
            let _index = parse_usize(fields.next(), "level index", line)?;
            let energy = parse_f64(fields.next(), "level energy", line)?;
            let weight = parse_f64(fields.next(), "statistical weight", line)?;
            let label = fields.collect::<Vec<_>>().join(" ");
            levels.push(RawLevel {
                energy,
                weight,
                label,
            });
        }

        let nline = data.next_count("radiative transition", MAX_LINES)?;
        let mut transitions = Vec::with_capacity(nline);
        for _ in 0..nline {
            let (line, content) = data.next_line("radiative transition")?;
            let mut fields = content.split_whitespace();
            let _index = parse_usize(fields.next(), "transition index", line)?;
            let upper = level_index(fields.next(), "upper level", line, nlev)?;
            let lower = level_index(fields.next(), "lower level", line, nlev)?;
            let einstein_a = parse_f64(fields.next(), "Einstein A", line)?;
            let frequency_ghz = parse_f64(fields.next(), "frequency", line)?;
            let upper_energy_k = parse_f64(fields.next(), "upper energy", line)?;
            transitions.push(RawTransition {
                upper,
                lower,
                einstein_a,
                frequency_ghz,
                upper_energy_k,
            });
        }

        let npart = data.next_count("collision partner", MAX_PARTNERS)?;
        let mut partners = Vec::with_capacity(npart);
        for _ in 0..npart {
            partners.push(Self::read_partner(&mut data, nlev)?);
        }

        Ok(RawMoleculeRecord {
            name,
            molecular_weight,
            levels,
            transitions,
            partners,
        })
    }

    fn read_partner<R: BufRead>(
        data: &mut DataLines<R>,
        nlev: usize,
    ) -> Result<RawPartnerTable, LamdaError> {
        let (line, header) = data.next_line("collision partner header")?;
        let mut fields = header.split_whitespace();
        let id_token = fields.next().ok_or(LamdaError::Parse {
            line,
            kind: LamdaParseErrorKind::MissingField("partner id"),
        })?;
        let partner = id_token
            .parse::<u8>()
            .ok()
            .and_then(CollisionPartner::from_lamda_id)
            .ok_or_else(|| LamdaError::Parse {
                line,
                kind: LamdaParseErrorKind::UnknownPartner(id_token.to_string()),
            })?;
        let description = fields.collect::<Vec<_>>().join(" ");

        let ncoll = data.next_count("collisional transition", MAX_COLLISION_TRANSITIONS)?;
        let ntemp = data.next_count("collision temperature", MAX_TEMPERATURES)?;
        if ntemp == 0 {
            return Err(LamdaError::Inconsistency(format!(
                "Partner {} lists no collision temperatures",
                partner
            )));
        }
        let temperatures = data.next_floats(ntemp, "collision temperatures")?;
        if temperatures.windows(2).any(|w| w[1] <= w[0]) {
            return Err(LamdaError::Inconsistency(format!(
                "Collision temperatures for partner {} are not strictly increasing",
                partner
            )));
        }

        let mut rates = Vec::with_capacity(ncoll);
        for _ in 0..ncoll {
            let (line, content) = data.next_line("collision rate")?;
            let mut fields = content.split_whitespace();
            let _index = parse_usize(fields.next(), "collision index", line)?;
            let upper = level_index(fields.next(), "collision upper level", line, nlev)?;
            let lower = level_index(fields.next(), "collision lower level", line, nlev)?;
            let values = (0..ntemp)
                .map(|_| parse_f64(fields.next(), "collision rate", line))
                .collect::<Result<Vec<_>, _>>()?;
            rates.push(RawCollisionRate {
                upper,
                lower,
                rates: values,
            });
        }

        Ok(RawPartnerTable {
            partner,
            description,
            temperatures,
            rates,
        })
    }

    pub fn read_from_path(path: &Path) -> Result<RawMoleculeRecord, LamdaError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader)
    }

    pub fn parse_str(content: &str) -> Result<RawMoleculeRecord, LamdaError> {
        let mut reader = io::Cursor::new(content.as_bytes());
        Self::read_from(&mut reader)
    }
}
