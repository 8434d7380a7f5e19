//! Parsing of glycan fragment names like `Y-H(1)N(2)`, `Y-H1N2`, `Y0`, or `Y$`.
use std::{
    collections::BTreeMap,
    fmt::Display,
    str::FromStr,
    sync::LazyLock,
};

use context_error::{BoxedError, Context, CreateError};
use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{GlycoError, GlycoErrorKind};

static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-((?:[A-Za-z]+\([0-9]+\))+)$").unwrap());
static BRACKETED_PART: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z]+)\(([0-9]+)\)").unwrap());
static COMPACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-((?:[A-Za-z]+[0-9]+)+)$").unwrap());
static COMPACT_PART: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([A-Za-z]+)([0-9]+)").unwrap());

/// A glycan composition, monosaccharide code with its count.
/// The display is the canonical bracketed form `H(1)N(2)`, in alphabetical code order.
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct GlycanComposition(pub BTreeMap<String, usize>);

impl GlycanComposition {
    /// The total number of monosaccharides
    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    /// The number of monosaccharides with this code, zero if the code does not occur
    pub fn count(&self, code: &str) -> usize {
        self.0.get(code).copied().unwrap_or_default()
    }

    /// Check if there are no monosaccharides at all
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

impl FromIterator<(String, usize)> for GlycanComposition {
    /// Repeated codes are summed.
    fn from_iter<T: IntoIterator<Item = (String, usize)>>(iter: T) -> Self {
        let mut map = BTreeMap::new();
        for (code, count) in iter {
            *map.entry(code).or_default() += count;
        }
        Self(map)
    }
}

impl Display for GlycanComposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (code, count) in &self.0 {
            write!(f, "{code}({count})")?;
        }
        Ok(())
    }
}

/// A parsed glycan fragment name
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct GlycanFragmentName {
    /// The glycan fragment type code, eg `Y`
    pub base_type: String,
    /// The composition of the remaining glycan, `None` for the bare peptide (`Y0`) and the intact glycan (`Y$`)
    pub composition: Option<GlycanComposition>,
    /// If this is the intact glycan (`Y$`) instead of the bare peptide (`Y0`), only meaningful without composition
    pub intact: bool,
}

impl GlycanFragmentName {
    /// The number of monosaccharides left on this fragment, bare and intact markers count as zero
    pub fn monosaccharides(&self) -> usize {
        self.composition.as_ref().map_or(0, GlycanComposition::total)
    }
}

impl Display for GlycanFragmentName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.composition {
            Some(composition) => write!(f, "{}-{composition}", self.base_type),
            None if self.intact => write!(f, "{}$", self.base_type),
            None => write!(f, "{}0", self.base_type),
        }
    }
}

/// Parse a glycan fragment name. Every known type code is tried in order, the first one that
/// results in a fully valid name is returned.
/// # Errors
/// If the name does not start with any known type code or the rest is not a valid composition.
pub fn parse_glycan_fragment(
    name: &str,
    known_type_codes: &[impl AsRef<str>],
) -> Result<GlycanFragmentName, GlycoError> {
    for code in known_type_codes.iter().map(AsRef::as_ref) {
        let Some(rest) = name.strip_prefix(code) else {
            continue;
        };
        if rest == "0" || rest == "$" {
            return Ok(GlycanFragmentName {
                base_type: code.to_string(),
                composition: None,
                intact: rest == "$",
            });
        }
        for (whole, part) in [(&*BRACKETED, &*BRACKETED_PART), (&*COMPACT, &*COMPACT_PART)] {
            if let Some(captures) = whole.captures(rest) {
                let composition = part
                    .captures_iter(&captures[1])
                    .map(|c| {
                        c[2].parse::<usize>()
                            .map(|count| (c[1].to_string(), count))
                            .map_err(|err| {
                                BoxedError::new(
                                    GlycoErrorKind::InvalidFragmentName,
                                    "Invalid glycan fragment name",
                                    format!("The monosaccharide count is not a valid number: {err}"),
                                    Context::show(name.to_string()),
                                )
                            })
                    })
                    .collect::<Result<GlycanComposition, _>>()?;
                return Ok(GlycanFragmentName {
                    base_type: code.to_string(),
                    composition: Some(composition),
                    intact: false,
                });
            }
        }
    }
    let codes = known_type_codes
        .iter()
        .map(|code| format!("'{}'", code.as_ref()))
        .join(", ");
    Err(BoxedError::new(
        GlycoErrorKind::InvalidFragmentName,
        "Invalid glycan fragment name",
        format!(
            "A glycan fragment name has to be a type ({codes}) followed by '0', '$', or '-' and a composition"
        ),
        Context::show(name.to_string()),
    ))
}

impl FromStr for GlycanComposition {
    type Err = GlycoError;
    /// Parse a bare composition in either the bracketed (`H(1)N(2)`) or the compact (`H1N2`) form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_glycan_fragment(&format!("-{s}"), &[""])?
            .composition
            .ok_or_else(|| {
                BoxedError::new(
                    GlycoErrorKind::InvalidFragmentName,
                    "Invalid glycan composition",
                    "A composition has to contain at least one monosaccharide",
                    Context::show(s.to_string()),
                )
            })
    }
}
