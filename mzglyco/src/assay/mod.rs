//! Assays: a (glyco)peptide at a given charge with its fragments
mod fragments;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use fragments::*;

use crate::{
    error::GlycoError,
    modification::{Modification, stringify_modifications},
};

/// Any additional information on an assay, like the protein, file, or scores
pub type Metadata = BTreeMap<String, Value>;

/// A theoretical or empirical spectral record of a modified, possibly glycosylated, peptide
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assay {
    /// The amino acid sequence
    pub peptide_sequence: String,
    /// The modifications, positions are 1-based
    #[serde(default)]
    pub modification: Vec<Modification>,
    /// The glycan structure in the encoding the mass calculator understands
    #[serde(default)]
    pub glycan_struct: Option<String>,
    /// The 1-based glycosylation position
    #[serde(default)]
    pub glycan_site: Option<usize>,
    /// The precursor charge
    #[serde(default)]
    pub precursor_charge: Option<u32>,
    /// The precursor m/z
    #[serde(default, rename = "precursorMZ")]
    pub precursor_mz: Option<f64>,
    /// The retention time
    #[serde(default)]
    pub rt: Option<f64>,
    /// The fragments
    #[serde(default)]
    pub fragments: Fragments,
    /// Additional information
    #[serde(default)]
    pub metadata: Metadata,
}

impl Assay {
    /// Create an assay for the given sequence with no fragments
    pub fn new(peptide_sequence: impl Into<String>) -> Self {
        Self {
            peptide_sequence: peptide_sequence.into(),
            ..Self::default()
        }
    }

    /// Set the modifications
    #[must_use]
    pub fn modification(self, modification: Vec<Modification>) -> Self {
        Self {
            modification,
            ..self
        }
    }

    /// Set the glycan structure and site
    #[must_use]
    pub fn glycan(self, glycan_struct: impl Into<String>, glycan_site: usize) -> Self {
        Self {
            glycan_struct: Some(glycan_struct.into()),
            glycan_site: Some(glycan_site),
            ..self
        }
    }

    /// Set the precursor charge
    #[must_use]
    pub fn precursor_charge(self, charge: u32) -> Self {
        Self {
            precursor_charge: Some(charge),
            ..self
        }
    }

    /// Set the fragments
    #[must_use]
    pub fn fragments(self, fragments: Fragments) -> Self {
        Self { fragments, ..self }
    }

    /// The number of residues
    pub fn len(&self) -> usize {
        self.peptide_sequence.chars().count()
    }

    /// Check if the sequence is empty
    pub fn is_empty(&self) -> bool {
        self.peptide_sequence.is_empty()
    }

    /// A copy of this assay with only the fragments at the given indices.
    /// # Panics
    /// If any index is out of bounds.
    #[must_use]
    pub fn select_fragments(&self, indices: &[usize]) -> Self {
        Self {
            fragments: self.fragments.select(indices),
            ..self.clone()
        }
    }

    /// The modifications in their textual form, `None` if unmodified
    pub fn modification_string(&self) -> Option<String> {
        stringify_modifications(&self.modification)
    }

    /// Check the modifications and fragments of this assay.
    /// # Errors
    /// If any modification does not fit the sequence or the fragment columns are inconsistent.
    pub fn validate(&self) -> Result<(), GlycoError> {
        for modification in &self.modification {
            modification.check(&self.peptide_sequence)?;
        }
        self.fragments.validate()
    }

    /// Check a boolean flag in the metadata, missing flags are false
    pub fn flag(&self, key: &str) -> bool {
        self.metadata
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or_default()
    }
}
