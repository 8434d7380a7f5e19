use std::collections::BTreeMap;

use context_error::{BoxedError, Context, CreateError};
use serde::{Deserialize, Serialize};

use mzglyco::{
    error::{GlycoError, GlycoErrorKind},
    parse_json::{ParseJson, use_serde},
};

/// The key in a per-code threshold that applies to the total number of monosaccharides
pub const ALL_MONOSACCHARIDES: &str = "all";

/// The minimal number of monosaccharides left on a glycan fragment
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MonosaccharideThreshold {
    /// The minimal total number of monosaccharides
    Total(usize),
    /// The minimal number per monosaccharide code, with [`ALL_MONOSACCHARIDES`] for the total
    PerCode(BTreeMap<String, usize>),
}

/// A pool of fragments that is preferred when selecting the top fragments
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct PriorPool {
    /// The number of fragments to take from this pool
    pub number: usize,
    /// Further restrictions on the fragments in this pool
    #[serde(default)]
    pub criteria: Option<Box<FilterCriteria>>,
}

impl PriorPool {
    /// A pool of the given size without further restrictions
    pub const fn new(number: usize) -> Self {
        Self {
            number,
            criteria: None,
        }
    }

    /// Set the restrictions on this pool
    #[must_use]
    pub fn criteria(self, criteria: FilterCriteria) -> Self {
        Self {
            criteria: Some(Box::new(criteria)),
            ..self
        }
    }
}

/// All criteria to select fragments from an assay, unset criteria are not applied.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterCriteria {
    /// Only keep these fragment types, if unset only the known peptide and glycan types are kept
    pub fragment_type: Option<Vec<String>>,
    /// The minimal ordinal of peptide fragments, glycan fragments are exempt
    pub min_fragment_amino_acid_number: Option<u32>,
    /// The minimal number of monosaccharides on glycan fragments, peptide fragments are exempt
    pub min_fragment_monosaccharide_number: Option<MonosaccharideThreshold>,
    /// Only keep these charges
    pub fragment_charge: Option<Vec<u32>>,
    /// Only keep these neutral losses
    pub fragment_loss_type: Option<Vec<String>>,
    /// The lowest m/z
    pub min_fragment_mz: Option<f64>,
    /// The highest m/z
    pub max_fragment_mz: Option<f64>,
    /// Keep at most this number of the most intense fragments
    pub max_fragment_number: Option<usize>,
    /// Remove fragments below this fraction of the most intense fragment
    pub min_relative_fragment_intensity: Option<f64>,
    /// Prefer this many peptide fragments
    pub prior_peptide_fragment: Option<PriorPool>,
    /// Prefer this many glycan fragments
    pub prior_glycan_fragment: Option<PriorPool>,
}

impl FilterCriteria {
    /// Set the fragment types
    #[must_use]
    pub fn fragment_type(self, fragment_type: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            fragment_type: Some(fragment_type.into_iter().map(Into::into).collect()),
            ..self
        }
    }

    /// Set the minimal amino acid number
    #[must_use]
    pub fn min_fragment_amino_acid_number(self, number: u32) -> Self {
        Self {
            min_fragment_amino_acid_number: Some(number),
            ..self
        }
    }

    /// Set the minimal monosaccharide number
    #[must_use]
    pub fn min_fragment_monosaccharide_number(self, threshold: MonosaccharideThreshold) -> Self {
        Self {
            min_fragment_monosaccharide_number: Some(threshold),
            ..self
        }
    }

    /// Set the charges
    #[must_use]
    pub fn fragment_charge(self, charges: Vec<u32>) -> Self {
        Self {
            fragment_charge: Some(charges),
            ..self
        }
    }

    /// Set the neutral losses
    #[must_use]
    pub fn fragment_loss_type(self, losses: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            fragment_loss_type: Some(losses.into_iter().map(Into::into).collect()),
            ..self
        }
    }

    /// Set the m/z range
    #[must_use]
    pub fn mz_range(self, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min_fragment_mz: min,
            max_fragment_mz: max,
            ..self
        }
    }

    /// Set the maximal number of fragments
    #[must_use]
    pub fn max_fragment_number(self, number: usize) -> Self {
        Self {
            max_fragment_number: Some(number),
            ..self
        }
    }

    /// Set the minimal relative intensity
    #[must_use]
    pub fn min_relative_fragment_intensity(self, fraction: f64) -> Self {
        Self {
            min_relative_fragment_intensity: Some(fraction),
            ..self
        }
    }

    /// Set the peptide fragment pool
    #[must_use]
    pub fn prior_peptide_fragment(self, pool: PriorPool) -> Self {
        Self {
            prior_peptide_fragment: Some(pool),
            ..self
        }
    }

    /// Set the glycan fragment pool
    #[must_use]
    pub fn prior_glycan_fragment(self, pool: PriorPool) -> Self {
        Self {
            prior_glycan_fragment: Some(pool),
            ..self
        }
    }

    /// Check if any prior pool is set
    pub const fn has_prior_pools(&self) -> bool {
        self.prior_peptide_fragment.is_some() || self.prior_glycan_fragment.is_some()
    }

    /// Check that these criteria, including all nested pool criteria, are sensible.
    /// # Errors
    /// If the m/z range is empty or negative, the relative intensity is outside of `0..=1`, or a
    /// charge of zero is requested.
    pub fn validate(&self) -> Result<(), GlycoError> {
        if let (Some(min), Some(max)) = (self.min_fragment_mz, self.max_fragment_mz)
            && min > max
        {
            return Err(invalid(
                "The minimal fragment m/z is higher than the maximal fragment m/z",
                format!("{min} > {max}"),
            ));
        }
        if let Some(value) = self
            .min_fragment_mz
            .iter()
            .chain(&self.max_fragment_mz)
            .find(|v| !v.is_finite() || **v < 0.0)
        {
            return Err(invalid(
                "A fragment m/z bound has to be a finite, non negative number",
                value.to_string(),
            ));
        }
        if let Some(fraction) = self.min_relative_fragment_intensity
            && !(0.0..=1.0).contains(&fraction)
        {
            return Err(invalid(
                "The minimal relative fragment intensity has to be between 0 and 1",
                fraction.to_string(),
            ));
        }
        if self
            .fragment_charge
            .as_ref()
            .is_some_and(|charges| charges.contains(&0))
        {
            return Err(invalid(
                "A fragment charge of zero is not possible",
                "0".to_string(),
            ));
        }
        for pool in self
            .prior_peptide_fragment
            .iter()
            .chain(&self.prior_glycan_fragment)
        {
            if let Some(criteria) = &pool.criteria {
                criteria.validate()?;
            }
        }
        Ok(())
    }
}

fn invalid(long: &'static str, context: String) -> GlycoError {
    BoxedError::new(
        GlycoErrorKind::InvalidConfiguration,
        "Invalid filter criteria",
        long,
        Context::show(context),
    )
}

impl ParseJson for FilterCriteria {
    fn from_json_value(value: serde_json::Value) -> Result<Self, GlycoError> {
        let criteria: Self = use_serde(value)?;
        criteria.validate()?;
        Ok(criteria)
    }
}
