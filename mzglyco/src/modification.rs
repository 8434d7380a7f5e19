//! Modifications placed on a peptide sequence, with the textual `Name(<position><site>)` form.
use std::{fmt::Display, str::FromStr, sync::LazyLock};

use context_error::{BoxedError, Context, CreateError};
use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{GlycoError, GlycoErrorKind};

static MODIFICATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)\(([0-9]+)?([A-Z]|N-term|C-term)\)$").unwrap());

/// Where a modification is placed, serialised as the residue letter, `N-term`, or `C-term`
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(into = "String", try_from = "String")]
pub enum ModificationSite {
    /// On the N terminus
    NTerm,
    /// On a residue, with its one letter code
    Residue(char),
    /// On the C terminus
    CTerm,
}

impl From<ModificationSite> for String {
    fn from(value: ModificationSite) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for ModificationSite {
    type Error = GlycoError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl FromStr for ModificationSite {
    type Err = GlycoError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "N-term" => Ok(Self::NTerm),
            "C-term" => Ok(Self::CTerm),
            _ => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(aa), None) if aa.is_ascii_uppercase() => Ok(Self::Residue(aa)),
                    _ => Err(BoxedError::new(
                        GlycoErrorKind::InvalidModification,
                        "Invalid modification site",
                        "A site has to be a single residue letter, 'N-term', or 'C-term'",
                        Context::show(s.to_string()),
                    )),
                }
            }
        }
    }
}

impl Display for ModificationSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NTerm => write!(f, "N-term"),
            Self::Residue(aa) => write!(f, "{aa}"),
            Self::CTerm => write!(f, "C-term"),
        }
    }
}

/// A single modification on a peptide
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Modification {
    /// The name of the modification, as understood by the mass calculator
    pub name: String,
    /// The 1-based position in the sequence, `None` for terminal modifications
    pub position: Option<usize>,
    /// The site
    pub site: ModificationSite,
}

impl Modification {
    /// A modification on the residue at the given 1-based position
    pub fn residue(name: impl Into<String>, position: usize, aa: char) -> Self {
        Self {
            name: name.into(),
            position: Some(position),
            site: ModificationSite::Residue(aa),
        }
    }

    /// A modification on the N terminus
    pub fn n_term(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: None,
            site: ModificationSite::NTerm,
        }
    }

    /// A modification on the C terminus
    pub fn c_term(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: None,
            site: ModificationSite::CTerm,
        }
    }

    /// Check that this modification fits on the given sequence. Residue modifications need a
    /// position within the sequence that holds the named residue, terminal modifications are
    /// always valid.
    /// # Errors
    /// If the position is missing, out of range, or points at another residue.
    pub fn check(&self, sequence: &str) -> Result<(), GlycoError> {
        let ModificationSite::Residue(aa) = self.site else {
            return Ok(());
        };
        let Some(position) = self.position else {
            return Err(BoxedError::new(
                GlycoErrorKind::InvalidModification,
                "Invalid modification",
                "A residue modification needs a position",
                Context::show(self.to_string()),
            ));
        };
        match position
            .checked_sub(1)
            .and_then(|index| sequence.chars().nth(index))
        {
            Some(found) if found == aa => Ok(()),
            Some(found) => Err(BoxedError::new(
                GlycoErrorKind::InvalidModification,
                "Invalid modification",
                format!("The modification is placed on '{aa}' but the sequence has '{found}' at position {position}"),
                Context::show(sequence.to_string()),
            )),
            None => Err(BoxedError::new(
                GlycoErrorKind::InvalidModification,
                "Invalid modification",
                format!(
                    "Position {position} is outside of the sequence of length {}",
                    sequence.chars().count()
                ),
                Context::show(sequence.to_string()),
            )),
        }
    }
}

impl Display for Modification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.name)?;
        if let Some(position) = self.position {
            write!(f, "{position}")?;
        }
        write!(f, "{})", self.site)
    }
}

impl FromStr for Modification {
    type Err = GlycoError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = MODIFICATION_REGEX.captures(s).ok_or_else(|| {
            BoxedError::new(
                GlycoErrorKind::InvalidModification,
                "Invalid modification",
                "A modification has to be written as 'Name(<position><site>)' with site a residue, 'N-term', or 'C-term'",
                Context::show(s.to_string()),
            )
        })?;
        let position = captures
            .get(2)
            .map(|p| p.as_str().parse::<usize>())
            .transpose()
            .map_err(|err| {
                BoxedError::new(
                    GlycoErrorKind::InvalidModification,
                    "Invalid modification",
                    format!("The position is not a valid number: {err}"),
                    Context::show(s.to_string()),
                )
            })?;
        let site = captures[3].parse::<ModificationSite>()?;
        if position.is_none() && matches!(site, ModificationSite::Residue(_)) {
            return Err(BoxedError::new(
                GlycoErrorKind::InvalidModification,
                "Invalid modification",
                "A residue modification needs a position",
                Context::show(s.to_string()),
            ));
        }
        Ok(Self {
            name: captures[1].to_string(),
            position,
            site,
        })
    }
}

/// Write a list of modifications as `Oxidation(3M);Acetyl(N-term)`, `None` if there are no modifications
pub fn stringify_modifications(modifications: &[Modification]) -> Option<String> {
    if modifications.is_empty() {
        None
    } else {
        Some(modifications.iter().join(";"))
    }
}

/// Parse a `;` separated list of modifications, empty parts are skipped and `null`/`None` mean no modifications
/// # Errors
/// If any of the modifications is invalid.
pub fn parse_modifications(text: &str) -> Result<Vec<Modification>, GlycoError> {
    let text = text.trim();
    if text == "null" || text == "None" {
        return Ok(Vec::new());
    }
    text.split(';')
        .filter(|part| !part.is_empty())
        .map(str::parse)
        .collect()
}
