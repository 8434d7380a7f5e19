use context_error::{BoxedError, Context, CreateError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use mzglyco::{
    FragmentKind,
    assay::Assay,
    error::{GlycoError, GlycoErrorKind},
    parse_json::{ParseJson, use_serde},
};

use crate::filter::{FilterCriteria, FragmentFilter, PriorPool};

/// The fragment column that marks the fragments used for quantification
pub const QUANTIFYING_TRANSITION: &str = "quantifyingTransition";

/// A precursor isolation window of a data independent acquisition, both bounds are exclusive
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SwathWindow {
    /// The lower m/z bound
    pub start: f64,
    /// The upper m/z bound
    pub end: f64,
}

impl SwathWindow {
    /// Create a new window
    pub const fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Check if the m/z is within this window
    pub fn contains(&self, mz: f64) -> bool {
        self.start < mz && mz < self.end
    }
}

/// Criteria for whole assays, an assay that does not fulfil them is rejected.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssayFilterCriteria {
    /// The lowest precursor m/z
    pub min_precursor_mz: Option<f64>,
    /// The highest precursor m/z
    pub max_precursor_mz: Option<f64>,
    /// The minimal number of fragments left after filtering the fragments
    pub min_fragment_number: Option<usize>,
    /// The minimal number of peptide fragments left after filtering the fragments
    pub min_peptide_fragment_number: Option<usize>,
    /// Only count the peptide fragments that fulfil these criteria
    pub min_peptide_fragment_criteria: Option<FilterCriteria>,
    /// The minimal number of glycan fragments left after filtering the fragments
    pub min_glycan_fragment_number: Option<usize>,
    /// Only count the glycan fragments that fulfil these criteria
    pub min_glycan_fragment_criteria: Option<FilterCriteria>,
    /// The criteria to filter the fragments with, if no prior pools are given here the minimal
    /// peptide and glycan fragment numbers are used as prior pools
    pub fragment: FilterCriteria,
    /// The isolation windows of the acquisition. An assay with a precursor outside all windows
    /// is rejected, the fragments within the window(s) of the precursor are removed.
    pub swath_windows: Option<Vec<SwathWindow>>,
    /// Mark the remaining fragments that fulfil these criteria in the [`QUANTIFYING_TRANSITION`] column
    pub quantifying_transition: Option<FilterCriteria>,
}

impl AssayFilterCriteria {
    /// Set the precursor m/z range
    #[must_use]
    pub fn precursor_mz_range(self, min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min_precursor_mz: min,
            max_precursor_mz: max,
            ..self
        }
    }

    /// Set the minimal number of fragments
    #[must_use]
    pub fn min_fragment_number(self, number: usize) -> Self {
        Self {
            min_fragment_number: Some(number),
            ..self
        }
    }

    /// Set the minimal number of peptide fragments, optionally only counting the fragments that fulfil the criteria
    #[must_use]
    pub fn min_peptide_fragment_number(self, number: usize, criteria: Option<FilterCriteria>) -> Self {
        Self {
            min_peptide_fragment_number: Some(number),
            min_peptide_fragment_criteria: criteria,
            ..self
        }
    }

    /// Set the minimal number of glycan fragments, optionally only counting the fragments that fulfil the criteria
    #[must_use]
    pub fn min_glycan_fragment_number(self, number: usize, criteria: Option<FilterCriteria>) -> Self {
        Self {
            min_glycan_fragment_number: Some(number),
            min_glycan_fragment_criteria: criteria,
            ..self
        }
    }

    /// Set the fragment criteria
    #[must_use]
    pub fn fragment(self, fragment: FilterCriteria) -> Self {
        Self { fragment, ..self }
    }

    /// Set the isolation windows
    #[must_use]
    pub fn swath_windows(self, windows: impl IntoIterator<Item = SwathWindow>) -> Self {
        Self {
            swath_windows: Some(windows.into_iter().collect()),
            ..self
        }
    }

    /// Set the criteria for the quantifying fragments
    #[must_use]
    pub fn quantifying_transition(self, criteria: FilterCriteria) -> Self {
        Self {
            quantifying_transition: Some(criteria),
            ..self
        }
    }

    /// The fragment criteria with the prior pools defaulted from the minimal fragment numbers
    pub fn effective_fragment_criteria(&self) -> FilterCriteria {
        let pool = |number: Option<usize>, criteria: &Option<FilterCriteria>| {
            number.map(|number| PriorPool {
                number,
                criteria: criteria.clone().map(Box::new),
            })
        };
        FilterCriteria {
            prior_peptide_fragment: self.fragment.prior_peptide_fragment.clone().or_else(|| {
                pool(
                    self.min_peptide_fragment_number,
                    &self.min_peptide_fragment_criteria,
                )
            }),
            prior_glycan_fragment: self.fragment.prior_glycan_fragment.clone().or_else(|| {
                pool(
                    self.min_glycan_fragment_number,
                    &self.min_glycan_fragment_criteria,
                )
            }),
            ..self.fragment.clone()
        }
    }

    /// Check these criteria and all nested criteria.
    /// # Errors
    /// If any of the nested fragment criteria or any isolation window is invalid.
    pub fn validate(&self) -> Result<(), GlycoError> {
        self.fragment.validate()?;
        for criteria in self
            .min_peptide_fragment_criteria
            .iter()
            .chain(&self.min_glycan_fragment_criteria)
            .chain(&self.quantifying_transition)
        {
            criteria.validate()?;
        }
        if let Some(window) = self
            .swath_windows
            .iter()
            .flatten()
            .find(|w| !(w.start.is_finite() && w.end.is_finite() && w.start < w.end))
        {
            return Err(BoxedError::new(
                GlycoErrorKind::InvalidConfiguration,
                "Invalid assay filter criteria",
                "An isolation window has to have a finite start below its end",
                Context::show(format!("{}..{}", window.start, window.end)),
            ));
        }
        Ok(())
    }
}

impl ParseJson for AssayFilterCriteria {
    fn from_json_value(value: serde_json::Value) -> Result<Self, GlycoError> {
        let criteria: Self = use_serde(value)?;
        criteria.validate()?;
        Ok(criteria)
    }
}

impl FragmentFilter<'_> {
    /// Filter the fragments of the assay and check that enough fragments are left. Returns
    /// `None` if the assay is rejected. An assay without precursor m/z is rejected if a
    /// precursor m/z range or isolation windows are set.
    /// # Errors
    /// If the criteria are invalid or a glycan fragment name cannot be parsed.
    pub fn filter_assay(
        &self,
        assay: &Assay,
        criteria: &AssayFilterCriteria,
    ) -> Result<Option<Assay>, GlycoError> {
        criteria.validate()?;
        if criteria.min_precursor_mz.is_some() || criteria.max_precursor_mz.is_some() {
            let Some(mz) = assay.precursor_mz else {
                return Ok(None);
            };
            if criteria.min_precursor_mz.is_some_and(|min| mz < min)
                || criteria.max_precursor_mz.is_some_and(|max| mz > max)
            {
                return Ok(None);
            }
        }

        let isolated;
        let assay = if let Some(windows) = &criteria.swath_windows {
            let Some(mz) = assay.precursor_mz else {
                return Ok(None);
            };
            let isolation = windows.iter().filter(|w| w.contains(mz)).collect::<Vec<_>>();
            if isolation.is_empty() {
                return Ok(None);
            }
            let outside = assay
                .fragments
                .mz()
                .iter()
                .enumerate()
                .filter(|(_, mz)| !isolation.iter().any(|w| w.contains(**mz)))
                .map(|(i, _)| i)
                .collect::<Vec<_>>();
            isolated = assay.select_fragments(&outside);
            &isolated
        } else {
            assay
        };

        let mut filtered = self.filter_fragments(assay, &criteria.effective_fragment_criteria())?;
        if criteria
            .min_fragment_number
            .is_some_and(|min| filtered.fragments.len() < min)
        {
            return Ok(None);
        }

        for (kind, min, extra) in [
            (
                FragmentKind::Peptide,
                criteria.min_peptide_fragment_number,
                &criteria.min_peptide_fragment_criteria,
            ),
            (
                FragmentKind::Glycan,
                criteria.min_glycan_fragment_number,
                &criteria.min_glycan_fragment_criteria,
            ),
        ] {
            let Some(min) = min else {
                continue;
            };
            let mut members = self.by_kind(&filtered, kind);
            if let Some(extra) = extra {
                let allowed = self.select(&filtered, extra)?;
                members.retain(|i| allowed.binary_search(i).is_ok());
            }
            if members.len() < min {
                return Ok(None);
            }
        }

        if let Some(quantifying) = &criteria.quantifying_transition {
            let selected = self.select(&filtered, quantifying)?;
            let column = (0..filtered.fragments.len())
                .map(|i| Value::Bool(selected.binary_search(&i).is_ok()))
                .collect();
            filtered.fragments.add_column(QUANTIFYING_TRANSITION, column)?;
        }
        Ok(Some(filtered))
    }
}
