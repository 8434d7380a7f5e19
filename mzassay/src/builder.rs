//! Assembling theoretical assays from the fragments calculated by a [`MassCalculator`].
use std::collections::HashMap;

use context_error::{BoxedError, Context, CreateError};
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use mzglyco::{
    FragmentKind, FragmentVocabulary,
    assay::{Assay, Fragment, Fragments},
    error::{GlycoError, GlycoErrorKind},
    glycan_fragment::parse_glycan_fragment,
    mass_calculator::{FragmentRequest, FragmentSeries, MassCalculator},
    modification::Modification,
};

/// The loss type used for fragments without a neutral loss
pub const NO_LOSS: &str = "noloss";

/// The marker every N-glycan structure starts with
const N_GLYCAN_CORE: &str = "(N";

/// The glycan fragments that are generated
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(default)]
pub struct GlycanFragmentation {
    /// The glycan fragment types
    pub fragment_types: Vec<String>,
    /// The charges of glycan fragments
    pub fragment_charges: Vec<u32>,
}

impl Default for GlycanFragmentation {
    fn default() -> Self {
        Self {
            fragment_types: vec!["Y".to_string()],
            fragment_charges: vec![1, 2, 3],
        }
    }
}

/// The settings for fragment generation.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct FragmentationSettings {
    /// The peptide fragment types
    pub fragment_types: Vec<String>,
    /// The neutral losses of peptide fragments
    pub fragment_loss_types: Vec<String>,
    /// The charges of peptide fragments
    pub fragment_charges: Vec<u32>,
    /// The glycan fragments, without these this is a plain peptide fragmentation
    pub glycan: Option<GlycanFragmentation>,
    /// The lowest fragment m/z that is kept
    pub min_fragment_mz: Option<f64>,
    /// The highest fragment m/z that is kept
    pub max_fragment_mz: Option<f64>,
}

impl Default for FragmentationSettings {
    /// Glycopeptide fragmentation: b and y ions, their `-N(1)` and intact glycan variants, and Y ions
    fn default() -> Self {
        Self {
            fragment_types: ["b", "y", "b-N(1)", "y-N(1)", "b$", "y$"]
                .map(String::from)
                .to_vec(),
            fragment_loss_types: vec![NO_LOSS.to_string()],
            fragment_charges: vec![1, 2],
            glycan: Some(GlycanFragmentation::default()),
            min_fragment_mz: None,
            max_fragment_mz: None,
        }
    }
}

impl FragmentationSettings {
    /// Plain peptide fragmentation, b and y ions only
    pub fn peptide() -> Self {
        Self {
            fragment_types: vec!["b".to_string(), "y".to_string()],
            glycan: None,
            ..Self::default()
        }
    }

    /// Set the peptide fragment types
    #[must_use]
    pub fn fragment_types(self, fragment_types: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            fragment_types: fragment_types.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    /// Set the neutral losses
    #[must_use]
    pub fn fragment_loss_types(
        self,
        fragment_loss_types: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            fragment_loss_types: fragment_loss_types.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    /// Set the peptide fragment charges
    #[must_use]
    pub fn fragment_charges(self, fragment_charges: Vec<u32>) -> Self {
        Self {
            fragment_charges,
            ..self
        }
    }

    /// Set the glycan fragmentation
    #[must_use]
    pub fn glycan(self, glycan: Option<GlycanFragmentation>) -> Self {
        Self { glycan, ..self }
    }

    /// Set the m/z range of the fragments that are kept
    #[must_use]
    pub fn mz_range(self, min_fragment_mz: Option<f64>, max_fragment_mz: Option<f64>) -> Self {
        Self {
            min_fragment_mz,
            max_fragment_mz,
            ..self
        }
    }

    /// The closed set of fragment types these settings know about
    pub fn vocabulary(&self) -> FragmentVocabulary {
        FragmentVocabulary::new(
            self.fragment_types.iter().cloned(),
            self.glycan
                .iter()
                .flat_map(|g| g.fragment_types.iter().cloned()),
        )
    }
}

/// Builds theoretical assays with a borrowed mass calculator.
#[derive(Debug)]
pub struct AssayBuilder<'c, C: MassCalculator + ?Sized> {
    calculator: &'c C,
    settings: FragmentationSettings,
    vocabulary: FragmentVocabulary,
}

impl<C: MassCalculator + ?Sized> Clone for AssayBuilder<'_, C> {
    fn clone(&self) -> Self {
        Self {
            calculator: self.calculator,
            settings: self.settings.clone(),
            vocabulary: self.vocabulary.clone(),
        }
    }
}

fn annotation(name: &str, loss: Option<&str>, charge: Option<u32>) -> String {
    let mut text = name.to_string();
    if let Some(loss) = loss.filter(|l| *l != NO_LOSS) {
        text.push('-');
        text.push_str(loss);
    }
    if let Some(charge) = charge {
        text.push_str("^+");
        text.push_str(&charge.to_string());
    }
    text
}

/// The key that identifies a fragment series
type SeriesKey<'a> = (&'a str, u32, &'a str);

fn series_key(series: &FragmentSeries) -> SeriesKey<'_> {
    (&series.fragment_type, series.charge, &series.loss)
}

impl<'c, C: MassCalculator + ?Sized> AssayBuilder<'c, C> {
    /// Create a new builder
    pub fn new(calculator: &'c C, settings: FragmentationSettings) -> Self {
        let vocabulary = settings.vocabulary();
        Self {
            calculator,
            settings,
            vocabulary,
        }
    }

    /// The mass calculator
    pub const fn calculator(&self) -> &'c C {
        self.calculator
    }

    /// The settings
    pub const fn settings(&self) -> &FragmentationSettings {
        &self.settings
    }

    /// All fragment types this builder knows about
    pub const fn vocabulary(&self) -> &FragmentVocabulary {
        &self.vocabulary
    }

    fn glycan_types(&self) -> &[String] {
        self.settings
            .glycan
            .as_ref()
            .map_or(&[], |g| g.fragment_types.as_slice())
    }

    fn glycan_charges(&self) -> &[u32] {
        self.settings
            .glycan
            .as_ref()
            .map_or(&[], |g| g.fragment_charges.as_slice())
    }

    /// Generate the theoretical fragments for a (glyco)peptide. If `fragment_type` is given only
    /// those types (as far as they are known to this builder) are generated. Peptide fragments
    /// that carry glycan parts (`-N(1)` and `$` types) are only generated for N-glycans.
    /// # Errors
    /// If the mass calculator returns an error.
    pub fn theoretical_fragments(
        &self,
        sequence: &str,
        modification: &[Modification],
        glycan_struct: Option<&str>,
        glycan_site: Option<usize>,
        fragment_type: Option<&[String]>,
    ) -> Result<Assay, GlycoError> {
        let (mut peptide_types, glycan_types): (Vec<String>, Vec<String>) = match fragment_type {
            None => (self.settings.fragment_types.clone(), self.glycan_types().to_vec()),
            Some(requested) => (
                requested
                    .iter()
                    .filter(|t| self.vocabulary.classify(Some(t)) == FragmentKind::Peptide)
                    .cloned()
                    .collect(),
                requested
                    .iter()
                    .filter(|t| self.vocabulary.classify(Some(t)) == FragmentKind::Glycan)
                    .cloned()
                    .collect(),
            ),
        };
        if !glycan_struct.is_some_and(|g| g.starts_with(N_GLYCAN_CORE)) {
            peptide_types.retain(|t| !(t.ends_with("-N(1)") || t.ends_with('$')));
        }

        let mut fragments = Fragments::default();
        if !peptide_types.is_empty() {
            let series = self.calculator.fragment_mz(&FragmentRequest {
                sequence,
                modification,
                glycan: glycan_struct,
                glycan_site,
                fragment_types: &peptide_types,
                losses: &self.settings.fragment_loss_types,
                charges: &self.settings.fragment_charges,
            })?;
            for series in series {
                for (mz, number) in series.fragment_mz.iter().zip(&series.fragment_number) {
                    fragments.push(Fragment {
                        mz: *mz,
                        fragment_type: Some(series.fragment_type.clone()),
                        number: *number,
                        charge: Some(series.charge),
                        loss_type: Some(series.loss.clone()),
                        annotation: Some(annotation(
                            &format!(
                                "{}{}",
                                series.fragment_type,
                                number.map(|n| n.to_string()).unwrap_or_default()
                            ),
                            Some(&series.loss),
                            Some(series.charge),
                        )),
                        ..Fragment::default()
                    })?;
                }
            }
        }

        if let Some(glycan) = glycan_struct
            && !glycan_types.is_empty()
        {
            let series = self.calculator.fragment_mz(&FragmentRequest {
                sequence,
                modification,
                glycan: Some(glycan),
                glycan_site,
                fragment_types: &glycan_types,
                losses: &[NO_LOSS.to_string()],
                charges: self.glycan_charges(),
            })?;
            for series in series {
                for (mz, name) in series.fragment_mz.iter().zip(&series.fragment_name) {
                    fragments.push(Fragment {
                        mz: *mz,
                        fragment_type: Some(series.fragment_type.clone()),
                        number: None,
                        charge: Some(series.charge),
                        loss_type: Some(series.loss.clone()),
                        glycan: Some(name.clone()),
                        annotation: Some(annotation(name, Some(&series.loss), Some(series.charge))),
                        ..Fragment::default()
                    })?;
                }
            }
        }

        Ok(Assay {
            peptide_sequence: sequence.to_string(),
            modification: modification.to_vec(),
            glycan_struct: glycan_struct.map(ToString::to_string),
            glycan_site,
            fragments,
            ..Assay::default()
        })
    }

    /// Generate a full theoretical assay: the fragments with the precursor charge and m/z.
    /// # Errors
    /// If the mass calculator returns an error.
    pub fn assay(
        &self,
        sequence: &str,
        modification: &[Modification],
        glycan_struct: Option<&str>,
        glycan_site: Option<usize>,
        charge: u32,
    ) -> Result<Assay, GlycoError> {
        let mut assay =
            self.theoretical_fragments(sequence, modification, glycan_struct, glycan_site, None)?;
        assay.precursor_charge = Some(charge);
        self.update_precursor_mz(assay)
    }

    /// Recalculate the precursor m/z, the assay is consumed and returned.
    /// # Errors
    /// If the assay has no precursor charge or the mass calculator returns an error.
    pub fn update_precursor_mz(&self, mut assay: Assay) -> Result<Assay, GlycoError> {
        let charge = assay.precursor_charge.ok_or_else(|| {
            BoxedError::new(
                GlycoErrorKind::InvalidConfiguration,
                "Missing precursor charge",
                "The precursor m/z can only be calculated if the precursor charge is known",
                Context::show(assay.peptide_sequence.clone()),
            )
        })?;
        assay.precursor_mz = Some(self.calculator.precursor_mz(
            &assay.peptide_sequence,
            &assay.modification,
            assay.glycan_struct.as_deref(),
            charge,
        )?);
        Ok(assay)
    }

    /// Recalculate the m/z of every fragment for the current sequence, modifications, and
    /// glycan of the assay. Fragments whose series still exist but that have no counterpart any
    /// more (eg a `b-N(1)` ion that no longer covers the glycosite) are dropped. The assay is
    /// consumed and returned.
    /// # Errors
    /// If a fragment has a type unknown to this builder, if a whole fragment series cannot be
    /// found, or if the mass calculator returns an error.
    pub fn update_fragment_mz(&self, mut assay: Assay) -> Result<Assay, GlycoError> {
        let new_mz = self.recalculated_fragment_mz(&assay)?;
        let mut keep = Vec::with_capacity(new_mz.len());
        for (index, mz) in new_mz.into_iter().enumerate() {
            if let Some(mz) = mz {
                assay.fragments.mz_mut()[index] = mz;
                keep.push(index);
            }
        }
        if keep.len() != assay.fragments.len() {
            assay.fragments = assay.fragments.select(&keep);
        }
        Ok(assay)
    }

    /// The new m/z for every fragment, `None` if the fragment does not exist any more.
    /// # Errors
    /// See [`Self::update_fragment_mz`].
    pub fn recalculated_fragment_mz(&self, assay: &Assay) -> Result<Vec<Option<f64>>, GlycoError> {
        let fragments = &assay.fragments;
        let mut kinds = Vec::with_capacity(fragments.len());
        for t in fragments.fragment_type() {
            match self.vocabulary.classify(t.as_deref()) {
                FragmentKind::Unknown => {
                    return Err(BoxedError::new(
                        GlycoErrorKind::UnknownFragmentType,
                        "Unknown fragment type",
                        "This fragment type is not known to the assay builder",
                        Context::show(t.clone().unwrap_or_else(|| "None".to_string())),
                    ));
                }
                kind => kinds.push(kind),
            }
        }

        let mut series = Vec::new();
        for kind in [FragmentKind::Peptide, FragmentKind::Glycan] {
            let rows = (0..fragments.len())
                .filter(|i| kinds[*i] == kind)
                .collect_vec();
            if rows.is_empty() {
                continue;
            }
            let types = rows
                .iter()
                .filter_map(|i| fragments.fragment_type()[*i].clone())
                .unique()
                .collect_vec();
            let losses = rows
                .iter()
                .map(|i| {
                    fragments.loss_type()[*i]
                        .clone()
                        .unwrap_or_else(|| NO_LOSS.to_string())
                })
                .unique()
                .collect_vec();
            let charges = rows
                .iter()
                .filter_map(|i| fragments.charge()[*i])
                .unique()
                .collect_vec();
            series.extend(self.calculator.fragment_mz(&FragmentRequest {
                sequence: &assay.peptide_sequence,
                modification: &assay.modification,
                glycan: assay.glycan_struct.as_deref(),
                glycan_site: assay.glycan_site,
                fragment_types: &types,
                losses: &losses,
                charges: &charges,
            })?);
        }
        let lookup: HashMap<SeriesKey<'_>, &FragmentSeries> =
            series.iter().map(|s| (series_key(s), s)).collect();

        let glycan_types = self.glycan_types();
        let mut result = Vec::with_capacity(fragments.len());
        for (index, kind) in kinds.iter().enumerate() {
            let fragment_type = fragments.fragment_type()[index].as_deref().unwrap_or_default();
            let key = (
                fragment_type,
                fragments.charge()[index].unwrap_or_default(),
                fragments.loss_type()[index].as_deref().unwrap_or(NO_LOSS),
            );
            let series = lookup.get(&key).ok_or_else(|| {
                BoxedError::new(
                    GlycoErrorKind::FragmentNotFound,
                    "Fragment not found",
                    format!(
                        "The mass calculator did not give any fragments for type '{}' with charge {} and loss '{}'",
                        key.0, key.1, key.2
                    ),
                    Context::show(fragment_type.to_string()),
                )
            })?;
            let position = if *kind == FragmentKind::Glycan {
                let name = fragments.glycan()[index].as_deref().ok_or_else(|| {
                    BoxedError::new(
                        GlycoErrorKind::InvalidFragmentName,
                        "Missing glycan fragment name",
                        "A glycan fragment needs a name to be recalculated",
                        Context::show(fragment_type.to_string()),
                    )
                })?;
                let target = parse_glycan_fragment(name, glycan_types)?;
                let mut found = None;
                for (i, candidate) in series.fragment_name.iter().enumerate() {
                    if parse_glycan_fragment(candidate, glycan_types)? == target {
                        found = Some(i);
                        break;
                    }
                }
                found
            } else {
                series
                    .fragment_number
                    .iter()
                    .position(|n| *n == fragments.number()[index])
            };
            result.push(position.and_then(|i| series.fragment_mz.get(i).copied()));
        }
        Ok(result)
    }

    /// Keep only the fragments within the m/z range of the settings.
    #[must_use]
    pub fn filter_fragments_by_mz(&self, assay: &Assay) -> Assay {
        let indices = crate::filter::by_mz_range(
            assay,
            self.settings.min_fragment_mz,
            self.settings.max_fragment_mz,
        );
        assay.select_fragments(&indices)
    }

    /// Get a fragment filter that knows all fragment types of this builder
    pub const fn fragment_filter(&self) -> crate::filter::FragmentFilter<'_> {
        crate::filter::FragmentFilter::new(&self.vocabulary)
    }
}
