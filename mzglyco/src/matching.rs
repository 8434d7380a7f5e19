//! Greedy matching of two peak lists within a tolerance window.
//!
//! Every query peak is considered in input order and claims at most one target peak, a target
//! peak that is claimed is never reconsidered. This makes the result order dependent, which is
//! the intended behaviour when the query list is a theoretical fragment list ordered by
//! importance.

use std::{fmt::Display, str::FromStr};

use context_error::{BoxedError, Context, CreateError};
use serde::{Deserialize, Serialize};

use crate::{
    error::{GlycoError, GlycoErrorKind},
    tolerance::Tolerance,
};

/// How to pick the winner if multiple target peaks fall within the window of a query peak
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum MatchCriteria {
    /// The target with the strictly highest intensity wins
    #[default]
    MostIntense,
    /// The target with the strictly smallest m/z difference wins
    Nearest,
}

impl FromStr for MatchCriteria {
    type Err = GlycoError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "mostintense" => Ok(Self::MostIntense),
            "nearest" => Ok(Self::Nearest),
            other => Err(BoxedError::new(
                GlycoErrorKind::InvalidConfiguration,
                "Invalid match criteria",
                "The criteria have to be 'mostintense' or 'nearest'",
                Context::show(other.to_string()),
            )),
        }
    }
}

impl Display for MatchCriteria {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::MostIntense => "mostintense",
                Self::Nearest => "nearest",
            }
        )
    }
}

/// Parameters for the matching, allowing control over when a match is allowed.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct MatchingParameters {
    /// The matching tolerance
    #[serde(default)]
    pub tolerance: Tolerance,
    /// The tie-breaking rule
    #[serde(default)]
    pub criteria: MatchCriteria,
}

impl MatchingParameters {
    /// Set the tolerance
    #[must_use]
    pub fn tolerance(self, tolerance: impl Into<Tolerance>) -> Self {
        Self {
            tolerance: tolerance.into(),
            ..self
        }
    }
    /// Set the criteria
    #[must_use]
    pub fn criteria(self, criteria: MatchCriteria) -> Self {
        Self { criteria, ..self }
    }
}

/// Anything that can be seen as a list of peaks
pub trait PeakList {
    /// The m/z values of all peaks
    fn peak_mz(&self) -> &[f64];
    /// The intensities of all peaks, if known
    fn peak_intensity(&self) -> Option<&[f64]> {
        None
    }
}

/// A bare list of peaks, used for spectra that do not come with any annotation
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Peaks {
    /// The m/z values
    pub mz: Vec<f64>,
    /// The intensities, if present this has the same length as `mz`
    pub intensity: Option<Vec<f64>>,
}

impl Peaks {
    /// Create a list of peaks without intensities
    pub const fn new(mz: Vec<f64>) -> Self {
        Self {
            mz,
            intensity: None,
        }
    }

    /// Create a list of peaks with intensities
    /// # Errors
    /// If the lengths of both lists differ.
    pub fn with_intensity(mz: Vec<f64>, intensity: Vec<f64>) -> Result<Self, GlycoError> {
        if mz.len() == intensity.len() {
            Ok(Self {
                mz,
                intensity: Some(intensity),
            })
        } else {
            Err(BoxedError::small(
                GlycoErrorKind::InconsistentFragments,
                "Invalid peak list",
                format!(
                    "The peak list has {} m/z values but {} intensities",
                    mz.len(),
                    intensity.len()
                ),
            ))
        }
    }
}

impl PeakList for Peaks {
    fn peak_mz(&self) -> &[f64] {
        &self.mz
    }
    fn peak_intensity(&self) -> Option<&[f64]> {
        self.intensity.as_deref()
    }
}

/// A single outcome of [`match_peaks`], indices refer to the lists passed in
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum PeakMatch {
    /// The query peak at the first index matched the target peak at the second index
    Matched(usize, usize),
    /// This query peak did not match anything
    UnmatchedQuery(usize),
    /// This target peak was not claimed by any query peak
    UnmatchedTarget(usize),
}

impl PeakMatch {
    /// The query index, if any
    pub const fn query(self) -> Option<usize> {
        match self {
            Self::Matched(i, _) | Self::UnmatchedQuery(i) => Some(i),
            Self::UnmatchedTarget(_) => None,
        }
    }
    /// The target index, if any
    pub const fn target(self) -> Option<usize> {
        match self {
            Self::Matched(_, j) | Self::UnmatchedTarget(j) => Some(j),
            Self::UnmatchedQuery(_) => None,
        }
    }
}

/// Match the query peaks against the target peaks.
///
/// The output first lists, in query order, every matched query peak (and if
/// `emit_unmatched_query` every unmatched one as well). If `emit_unmatched_target` is set all
/// target peaks that were not claimed follow in target order.
pub fn match_peaks(
    query: &(impl PeakList + ?Sized),
    target: &(impl PeakList + ?Sized),
    parameters: &MatchingParameters,
    emit_unmatched_query: bool,
    emit_unmatched_target: bool,
) -> Vec<PeakMatch> {
    let target_mz = target.peak_mz();
    let target_intensity = target.peak_intensity();
    let mut used = vec![false; target_mz.len()];
    let mut result = Vec::with_capacity(query.peak_mz().len());

    for (i, &mz) in query.peak_mz().iter().enumerate() {
        let window = parameters.tolerance.window(mz);
        let mut best: Option<usize> = None;
        for (j, candidate) in target_mz.iter().enumerate() {
            if used[j] || !window.contains(candidate) {
                continue;
            }
            best = match best {
                None => Some(j),
                Some(current) => {
                    let better = match parameters.criteria {
                        MatchCriteria::MostIntense => {
                            target_intensity.is_some_and(|int| {
                                matches!((int.get(j), int.get(current)), (Some(a), Some(b)) if a > b)
                            })
                        }
                        MatchCriteria::Nearest => {
                            (candidate - mz).abs() < (target_mz[current] - mz).abs()
                        }
                    };
                    Some(if better { j } else { current })
                }
            };
        }
        match best {
            Some(j) => {
                used[j] = true;
                result.push(PeakMatch::Matched(i, j));
            }
            None if emit_unmatched_query => result.push(PeakMatch::UnmatchedQuery(i)),
            None => (),
        }
    }

    if emit_unmatched_target {
        result.extend(
            used.iter()
                .enumerate()
                .filter(|(_, used)| !**used)
                .map(|(j, _)| PeakMatch::UnmatchedTarget(j)),
        );
    }
    result
}
