//! Diagnostic oxonium ions in empirical spectra.
use mzglyco::{
    assay::{Assay, Fragment, Fragments},
    error::GlycoError,
    mass_calculator::MassCalculator,
    matching::{MatchingParameters, PeakMatch, Peaks, match_peaks},
};

/// Finds the oxonium ions of a mass calculator in spectra.
#[derive(Clone, Debug, PartialEq)]
pub struct OxoniumIonExtractor {
    names: Vec<String>,
    ions: Peaks,
    parameters: MatchingParameters,
}

impl OxoniumIonExtractor {
    /// Create an extractor for all oxonium ions the calculator knows
    pub fn new(calculator: &(impl MassCalculator + ?Sized), parameters: MatchingParameters) -> Self {
        let (names, mz) = calculator.oxonium_ions().into_iter().unzip();
        Self {
            names,
            ions: Peaks::new(mz),
            parameters,
        }
    }

    /// The names of the oxonium ions, in the same order as their m/z
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The m/z of the oxonium ions
    pub fn mz(&self) -> &[f64] {
        &self.ions.mz
    }

    /// A copy of the spectrum with only the peaks that match an oxonium ion, annotated with
    /// the name of that ion. Any other annotation and additional columns are dropped.
    /// # Errors
    /// If the intensities of the spectrum are inconsistent.
    pub fn extract(&self, spectrum: &Assay) -> Result<Assay, GlycoError> {
        let intensity = spectrum.fragments.intensity();
        let rows = match_peaks(&spectrum.fragments, &self.ions, &self.parameters, false, false)
            .into_iter()
            .filter_map(|m| match m {
                PeakMatch::Matched(i, j) => Some(Fragment {
                    mz: spectrum.fragments.mz()[i],
                    intensity: intensity.map(|intensity| intensity[i]),
                    annotation: Some(self.names[j].clone()),
                    ..Fragment::default()
                }),
                _ => None,
            });
        Ok(Assay {
            fragments: Fragments::from_rows(rows)?,
            ..spectrum.clone()
        })
    }
}
