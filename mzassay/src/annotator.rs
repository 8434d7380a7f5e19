//! Annotating empirical spectra with the theoretical fragments of a (glyco)peptide.
use mzglyco::{
    assay::Assay,
    error::GlycoError,
    mass_calculator::MassCalculator,
    matching::{MatchingParameters, PeakMatch, match_peaks},
    modification::Modification,
};

use crate::builder::AssayBuilder;

/// Labels the peaks of an empirical spectrum with the fragments they match.
#[derive(Debug)]
pub struct SpectrumAnnotator<'c, C: MassCalculator + ?Sized> {
    builder: AssayBuilder<'c, C>,
    parameters: MatchingParameters,
}

impl<C: MassCalculator + ?Sized> Clone for SpectrumAnnotator<'_, C> {
    fn clone(&self) -> Self {
        Self {
            builder: self.builder.clone(),
            parameters: self.parameters,
        }
    }
}

impl<'c, C: MassCalculator + ?Sized> SpectrumAnnotator<'c, C> {
    /// Create a new annotator
    pub const fn new(builder: AssayBuilder<'c, C>, parameters: MatchingParameters) -> Self {
        Self {
            builder,
            parameters,
        }
    }

    /// The assay builder
    pub const fn builder(&self) -> &AssayBuilder<'c, C> {
        &self.builder
    }

    /// The matching parameters
    pub const fn parameters(&self) -> &MatchingParameters {
        &self.parameters
    }

    /// Annotate a spectrum. The theoretical fragments are matched against the peaks of the
    /// spectrum and the type, number, charge, loss, glycan, and annotation of every matched
    /// theoretical fragment are copied onto its peak, all other peaks get no annotation. The
    /// m/z, intensity, and any additional columns of the spectrum are kept, as is its
    /// precursor information. The result carries the given peptide.
    /// # Errors
    /// If the theoretical fragments cannot be generated.
    pub fn annotate(
        &self,
        spectrum: &Assay,
        sequence: &str,
        modification: &[Modification],
        glycan_struct: Option<&str>,
        glycan_site: Option<usize>,
    ) -> Result<Assay, GlycoError> {
        let theoretical = self.builder.theoretical_fragments(
            sequence,
            modification,
            glycan_struct,
            glycan_site,
            None,
        )?
        .fragments;

        let mut annotated = spectrum.clone();
        let fragments = &mut annotated.fragments;
        fragments.fragment_type_mut().fill(None);
        fragments.number_mut().fill(None);
        fragments.charge_mut().fill(None);
        fragments.loss_type_mut().fill(None);
        fragments.glycan_mut().fill(None);
        fragments.annotation_mut().fill(None);

        for matched in match_peaks(&theoretical, &spectrum.fragments, &self.parameters, false, true) {
            let PeakMatch::Matched(i, j) = matched else {
                continue;
            };
            fragments.fragment_type_mut()[j].clone_from(&theoretical.fragment_type()[i]);
            fragments.number_mut()[j] = theoretical.number()[i];
            fragments.charge_mut()[j] = theoretical.charge()[i];
            fragments.loss_type_mut()[j].clone_from(&theoretical.loss_type()[i]);
            fragments.glycan_mut()[j].clone_from(&theoretical.glycan()[i]);
            fragments.annotation_mut()[j].clone_from(&theoretical.annotation()[i]);
        }

        annotated.peptide_sequence = sequence.to_string();
        annotated.modification = modification.to_vec();
        annotated.glycan_struct = glycan_struct.map(ToString::to_string);
        annotated.glycan_site = glycan_site;
        Ok(annotated)
    }
}
