//! The contract for the external theoretical mass calculator.
//!
//! How masses are calculated is not part of this crate, any implementation that can give
//! fragment series for a (glyco)peptide can be plugged into the assay builders.

use context_error::{BoxedError, Context, CreateError};

use crate::{
    error::{GlycoError, GlycoErrorKind},
    modification::Modification,
};

/// The residue alphabet used when no other is given
pub const STANDARD_AMINO_ACIDS: &str = "ACDEFGHIKLMNPQRSTVWY";

/// A request for theoretical fragment series
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FragmentRequest<'a> {
    /// The peptide sequence
    pub sequence: &'a str,
    /// The modifications on the sequence
    pub modification: &'a [Modification],
    /// The glycan structure, if glycosylated
    pub glycan: Option<&'a str>,
    /// The 1-based glycosylation site
    pub glycan_site: Option<usize>,
    /// The requested fragment types
    pub fragment_types: &'a [String],
    /// The requested neutral losses, `noloss` for none
    pub losses: &'a [String],
    /// The requested charges
    pub charges: &'a [u32],
}

/// One series of theoretical fragments, all of the same type, charge, and loss
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FragmentSeries {
    /// The fragment type
    pub fragment_type: String,
    /// The charge
    pub charge: u32,
    /// The neutral loss, `noloss` for none
    pub loss: String,
    /// The m/z of each fragment
    pub fragment_mz: Vec<f64>,
    /// The name of each fragment, for glycan fragments this is the glycan fragment name
    pub fragment_name: Vec<String>,
    /// The ordinal of each fragment, `None` for glycan fragments
    pub fragment_number: Vec<Option<u32>>,
}

/// A theoretical mass calculator for (glyco)peptides
pub trait MassCalculator {
    /// Calculate the requested fragment series.
    /// # Errors
    /// If the calculator cannot handle the sequence, modification, glycan, or fragment types.
    fn fragment_mz(&self, request: &FragmentRequest<'_>) -> Result<Vec<FragmentSeries>, GlycoError>;

    /// Calculate the precursor m/z.
    /// # Errors
    /// If the calculator cannot handle the sequence, modification, or glycan.
    fn precursor_mz(
        &self,
        sequence: &str,
        modification: &[Modification],
        glycan: Option<&str>,
        charge: u32,
    ) -> Result<f64, GlycoError>;

    /// The molecular weight of a glycan.
    /// # Errors
    /// If the glycan structure is not understood.
    fn glycan_mw(&self, glycan_struct: &str) -> Result<f64, GlycoError>;

    /// The residue mass of an amino acid.
    /// # Errors
    /// If the amino acid is not known.
    fn aa_residue_mass(&self, code: char) -> Result<f64, GlycoError>;

    /// The mass of an element.
    /// # Errors
    /// If the element is not known.
    fn element_mass(&self, symbol: &str) -> Result<f64, GlycoError>;

    /// All amino acids this calculator knows
    fn amino_acid_codes(&self) -> Vec<char> {
        STANDARD_AMINO_ACIDS.chars().collect()
    }

    /// The diagnostic oxonium ions, name and m/z
    fn oxonium_ions(&self) -> Vec<(String, f64)> {
        Vec::new()
    }

    /// The summed residue mass of a sequence.
    /// # Errors
    /// If any amino acid is not known.
    fn residue_mass(&self, sequence: &str) -> Result<f64, GlycoError> {
        sequence.chars().map(|aa| self.aa_residue_mass(aa)).sum()
    }
}

impl<C: MassCalculator + ?Sized> MassCalculator for &C {
    fn fragment_mz(&self, request: &FragmentRequest<'_>) -> Result<Vec<FragmentSeries>, GlycoError> {
        (**self).fragment_mz(request)
    }
    fn precursor_mz(
        &self,
        sequence: &str,
        modification: &[Modification],
        glycan: Option<&str>,
        charge: u32,
    ) -> Result<f64, GlycoError> {
        (**self).precursor_mz(sequence, modification, glycan, charge)
    }
    fn glycan_mw(&self, glycan_struct: &str) -> Result<f64, GlycoError> {
        (**self).glycan_mw(glycan_struct)
    }
    fn aa_residue_mass(&self, code: char) -> Result<f64, GlycoError> {
        (**self).aa_residue_mass(code)
    }
    fn element_mass(&self, symbol: &str) -> Result<f64, GlycoError> {
        (**self).element_mass(symbol)
    }
    fn amino_acid_codes(&self) -> Vec<char> {
        (**self).amino_acid_codes()
    }
    fn oxonium_ions(&self) -> Vec<(String, f64)> {
        (**self).oxonium_ions()
    }
}

/// Create the error a calculator gives for an amino acid it does not know
pub fn unknown_amino_acid(code: char) -> GlycoError {
    BoxedError::new(
        GlycoErrorKind::MassCalculator,
        "Unknown amino acid",
        "This amino acid is not known to the mass calculator",
        Context::show(code.to_string()),
    )
}
