//! Decoy assays for false discovery rate estimation.
//!
//! Peptide decoys reverse the sequence (keeping a tryptic C-terminal residue in place) and
//! recalculate the fragments, glycan decoys shift the m/z of glycan fragments by a random
//! amount. All randomness comes from the random source that is passed in.
use std::{fmt::Display, str::FromStr};

use context_error::{BoxedError, Context, CreateError};
use itertools::Itertools;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use mzglyco::{
    FragmentKind,
    assay::{Assay, Metadata},
    error::{GlycoError, GlycoErrorKind},
    mass_calculator::MassCalculator,
    modification::{Modification, ModificationSite},
    parse_json::{ParseJson, use_serde},
};

use crate::builder::AssayBuilder;

/// The extra fragment column that marks the transitions added by [`mass_shift_decoy`]
pub const DECOY_TRANSITION: &str = "decoyTransition";

/// What to do with fragments of a type the builder does not know
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFragmentPolicy {
    /// Remove them from the decoy
    Ignore,
    /// Keep them unchanged in the decoy
    #[default]
    Keep,
    /// Fail with [`GlycoErrorKind::UnknownFragmentType`]
    Error,
}

impl FromStr for UnknownFragmentPolicy {
    type Err = GlycoError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "keep" => Ok(Self::Keep),
            "error" => Ok(Self::Error),
            _ => Err(BoxedError::new(
                GlycoErrorKind::InvalidConfiguration,
                "Invalid unknown fragment policy",
                "Use 'ignore', 'keep', or 'error'",
                Context::show(s.to_string()),
            )),
        }
    }
}

impl Display for UnknownFragmentPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Self::Ignore => "ignore",
                Self::Keep => "keep",
                Self::Error => "error",
            }
        )
    }
}

/// The kind of decoy to generate
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoyType {
    /// Reversed peptide sequence
    #[default]
    Peptide,
    /// Shifted glycan fragments
    Glycan,
    /// A peptide decoy with shifted glycan fragments
    Both,
}

impl FromStr for DecoyType {
    type Err = GlycoError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "peptide" => Ok(Self::Peptide),
            "glycan" => Ok(Self::Glycan),
            "both" => Ok(Self::Both),
            _ => Err(BoxedError::new(
                GlycoErrorKind::InvalidConfiguration,
                "Invalid decoy type",
                "Use 'peptide', 'glycan', or 'both'",
                Context::show(s.to_string()),
            )),
        }
    }
}

/// The settings for random decoy sequences
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct RandomDecoySettings {
    /// The number of sequences that are tried before giving up
    pub max_attempts: usize,
    /// The minimal absolute mass difference with the target sequence in Da
    pub min_mass_shift: f64,
}

impl Default for RandomDecoySettings {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            min_mass_shift: 1.0,
        }
    }
}

/// The settings for decoy generation
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecoySettings {
    /// What to do with fragments of an unknown type
    pub unknown_fragment_policy: UnknownFragmentPolicy,
    /// The lowest mass shift of glycan decoy fragments in Da
    pub min_glycan_shift: f64,
    /// The highest mass shift of glycan decoy fragments in Da
    pub max_glycan_shift: f64,
    /// The settings for random decoy sequences
    pub random: RandomDecoySettings,
}

impl Default for DecoySettings {
    fn default() -> Self {
        Self {
            unknown_fragment_policy: UnknownFragmentPolicy::default(),
            min_glycan_shift: 1.0,
            max_glycan_shift: 30.0,
            random: RandomDecoySettings::default(),
        }
    }
}

impl DecoySettings {
    /// Set the unknown fragment policy
    #[must_use]
    pub fn unknown_fragment_policy(self, unknown_fragment_policy: UnknownFragmentPolicy) -> Self {
        Self {
            unknown_fragment_policy,
            ..self
        }
    }

    /// Set the range of glycan fragment mass shifts
    #[must_use]
    pub fn glycan_shift(self, min_glycan_shift: f64, max_glycan_shift: f64) -> Self {
        Self {
            min_glycan_shift,
            max_glycan_shift,
            ..self
        }
    }

    /// Set the random decoy settings
    #[must_use]
    pub fn random(self, random: RandomDecoySettings) -> Self {
        Self { random, ..self }
    }

    /// Check that the glycan shift range is not empty and non negative.
    /// # Errors
    /// If the range is empty, negative, or not finite.
    pub fn validate(&self) -> Result<(), GlycoError> {
        if !(self.min_glycan_shift.is_finite()
            && self.max_glycan_shift.is_finite()
            && 0.0 <= self.min_glycan_shift
            && self.min_glycan_shift < self.max_glycan_shift)
        {
            return Err(BoxedError::new(
                GlycoErrorKind::InvalidConfiguration,
                "Invalid decoy settings",
                "The glycan shift range has to be a non empty range of non negative masses",
                Context::show(format!("{}..{}", self.min_glycan_shift, self.max_glycan_shift)),
            ));
        }
        Ok(())
    }
}

impl ParseJson for DecoySettings {
    fn from_json_value(value: Value) -> Result<Self, GlycoError> {
        let settings: Self = use_serde(value)?;
        settings.validate()?;
        Ok(settings)
    }
}

/// The decoy version of a (glyco)peptide
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DecoySequence {
    /// The decoy sequence
    pub sequence: String,
    /// The modifications, moved along with their residue
    pub modification: Vec<Modification>,
    /// The glycosylation site, moved along with its residue
    pub glycan_site: Option<usize>,
}

/// Reverse the sequence of the assay, keeping a C-terminal `K` or `R` in place. Residue
/// modifications and the glycosylation site move along with their residue, terminal
/// modifications stay at their terminus. For tryptic peptides the decoy of the decoy is the
/// original.
pub fn decoy_sequence(assay: &Assay) -> DecoySequence {
    let residues = assay.peptide_sequence.chars().collect_vec();
    let length = residues.len();
    let order = if matches!(residues.last(), Some('K' | 'R')) {
        (0..length - 1).rev().chain([length - 1]).collect_vec()
    } else {
        (0..length).rev().collect_vec()
    };

    let mut modification = Vec::with_capacity(assay.modification.len());
    modification.extend(
        assay
            .modification
            .iter()
            .filter(|m| m.position.is_none() && m.site == ModificationSite::NTerm)
            .cloned(),
    );
    let mut glycan_site = None;
    for (new, old) in order.iter().enumerate() {
        for m in &assay.modification {
            if m.position == Some(old + 1) {
                modification.push(Modification {
                    position: Some(new + 1),
                    ..m.clone()
                });
            }
        }
        if assay.glycan_site == Some(old + 1) {
            glycan_site = Some(new + 1);
        }
    }
    modification.extend(
        assay
            .modification
            .iter()
            .filter(|m| m.position.is_none() && m.site == ModificationSite::CTerm)
            .cloned(),
    );

    DecoySequence {
        sequence: order.iter().map(|i| residues[*i]).collect(),
        modification,
        glycan_site,
    }
}

/// Add a shifted copy of each of the selected fragments, the shift is divided by the charge
/// of the fragment. The copies are marked in the [`DECOY_TRANSITION`] column, fragments that
/// are already marked are not copied again.
/// # Errors
/// If the existing [`DECOY_TRANSITION`] column is inconsistent with the fragments.
pub fn mass_shift_decoy(assay: &Assay, shift: f64, selected: &[usize]) -> Result<Assay, GlycoError> {
    let mut new = assay.clone();
    if new.fragments.extra(DECOY_TRANSITION).is_none() {
        new.fragments
            .add_column(DECOY_TRANSITION, vec![Value::Bool(false); assay.fragments.len()])?;
    }
    let marked = new
        .fragments
        .extra(DECOY_TRANSITION)
        .map(<[Value]>::to_vec)
        .unwrap_or_default();
    for index in selected {
        if marked.get(*index).and_then(Value::as_bool).unwrap_or_default() {
            continue;
        }
        let Some(mut fragment) = assay.fragments.get(*index) else {
            continue;
        };
        let mz_shift = shift / f64::from(fragment.charge.filter(|c| *c > 0).unwrap_or(1));
        fragment.mz += mz_shift;
        fragment.annotation = fragment
            .annotation
            .map(|annotation| format!("DECOY_{annotation}[{mz_shift:+}]"));
        fragment
            .extra
            .insert(DECOY_TRANSITION.to_string(), Value::Bool(true));
        new.fragments.push(fragment)?;
    }
    Ok(new)
}

fn mark_decoy(metadata: &mut Metadata, kind: &str) {
    metadata.insert("decoy".to_string(), Value::Bool(true));
    metadata.insert(kind.to_string(), Value::Bool(true));
}

/// Generates decoy assays, using an assay builder to recalculate fragments.
#[derive(Debug)]
pub struct DecoyGenerator<'c, C: MassCalculator + ?Sized> {
    builder: AssayBuilder<'c, C>,
    settings: DecoySettings,
}

impl<C: MassCalculator + ?Sized> Clone for DecoyGenerator<'_, C> {
    fn clone(&self) -> Self {
        Self {
            builder: self.builder.clone(),
            settings: self.settings,
        }
    }
}

impl<'c, C: MassCalculator + ?Sized> DecoyGenerator<'c, C> {
    /// Create a new decoy generator.
    /// # Errors
    /// If the settings are invalid.
    pub fn new(builder: AssayBuilder<'c, C>, settings: DecoySettings) -> Result<Self, GlycoError> {
        settings.validate()?;
        Ok(Self { builder, settings })
    }

    /// The assay builder
    pub const fn builder(&self) -> &AssayBuilder<'c, C> {
        &self.builder
    }

    /// The settings
    pub const fn settings(&self) -> &DecoySettings {
        &self.settings
    }

    fn unknown_fragment(fragment_type: Option<&str>) -> GlycoError {
        BoxedError::new(
            GlycoErrorKind::UnknownFragmentType,
            "Unknown fragment type",
            "This fragment type is not known to the assay builder",
            Context::show(fragment_type.unwrap_or("None").to_string()),
        )
    }

    /// The indices of the fragments with a type known to the builder
    fn known_fragments(&self, assay: &Assay) -> Vec<usize> {
        let vocabulary = self.builder.vocabulary();
        assay
            .fragments
            .fragment_type()
            .iter()
            .enumerate()
            .filter(|(_, t)| vocabulary.is_known(t.as_deref()))
            .map(|(i, _)| i)
            .collect()
    }

    /// Recalculate the fragments for the current sequence of the assay, handling fragments of
    /// unknown type according to the policy, and apply the m/z range of the builder. The assay
    /// is consumed and returned.
    /// # Errors
    /// If the recalculation fails, or if there are unknown fragments with policy
    /// [`UnknownFragmentPolicy::Error`].
    pub fn update_fragments(&self, assay: Assay) -> Result<Assay, GlycoError> {
        let updated = match self.settings.unknown_fragment_policy {
            UnknownFragmentPolicy::Error => self.builder.update_fragment_mz(assay)?,
            UnknownFragmentPolicy::Ignore => {
                let known = self.known_fragments(&assay);
                self.builder
                    .update_fragment_mz(assay.select_fragments(&known))?
            }
            UnknownFragmentPolicy::Keep => {
                let known = self.known_fragments(&assay);
                let new_mz = self
                    .builder
                    .recalculated_fragment_mz(&assay.select_fragments(&known))?;
                let mut new_mz = known.iter().zip(new_mz).peekable();
                let mut assay = assay;
                let mut keep = Vec::with_capacity(assay.fragments.len());
                for index in 0..assay.fragments.len() {
                    match new_mz.next_if(|(k, _)| **k == index) {
                        Some((_, Some(mz))) => {
                            assay.fragments.mz_mut()[index] = mz;
                            keep.push(index);
                        }
                        Some((_, None)) => (),
                        None => keep.push(index),
                    }
                }
                if keep.len() != assay.fragments.len() {
                    assay.fragments = assay.fragments.select(&keep);
                }
                assay
            }
        };
        Ok(self.builder.filter_fragments_by_mz(&updated))
    }

    /// Create a peptide decoy: the decoy sequence with recalculated fragments. The metadata
    /// is marked with `decoy` and `peptideDecoy`, and all proteins get a `DECOY_` prefix.
    /// # Errors
    /// See [`Self::update_fragments`].
    pub fn peptide_decoy(&self, assay: &Assay) -> Result<Assay, GlycoError> {
        let decoy = decoy_sequence(assay);
        let mut new = self.update_fragments(Assay {
            peptide_sequence: decoy.sequence,
            modification: decoy.modification,
            glycan_site: decoy.glycan_site,
            ..assay.clone()
        })?;
        mark_decoy(&mut new.metadata, "peptideDecoy");
        if let Some(protein) = new.metadata.get_mut("protein")
            && !protein.is_null()
        {
            let text = match protein {
                Value::String(text) => text.clone(),
                ref other => other.to_string(),
            };
            *protein = Value::String(text.split('/').map(|p| format!("DECOY_{p}")).join("/"));
        }
        Ok(new)
    }

    /// Create a glycan decoy: every glycan fragment except the bare peptide (`Y0`) and the
    /// intact glycopeptide (`Y$`) is shifted by a random mass, rounded to two decimals and
    /// divided by the fragment charge. Shifted fragments get a `DECOY_` prefix on their type
    /// and annotation, and the shift in the annotation. Peptide fragments are unchanged.
    /// # Errors
    /// If there are unknown fragments with policy [`UnknownFragmentPolicy::Error`].
    pub fn glycan_decoy(&self, assay: &Assay, rng: &mut impl Rng) -> Result<Assay, GlycoError> {
        let mut new = if self.settings.unknown_fragment_policy == UnknownFragmentPolicy::Ignore {
            assay.select_fragments(&self.known_fragments(assay))
        } else {
            assay.clone()
        };
        let vocabulary = self.builder.vocabulary();
        let fragments = &mut new.fragments;
        for index in 0..fragments.len() {
            let fragment_type = fragments.fragment_type()[index].clone();
            match vocabulary.classify(fragment_type.as_deref()) {
                FragmentKind::Peptide => (),
                FragmentKind::Unknown => {
                    if self.settings.unknown_fragment_policy == UnknownFragmentPolicy::Error {
                        return Err(Self::unknown_fragment(fragment_type.as_deref()));
                    }
                }
                FragmentKind::Glycan => {
                    let fragment_type = fragment_type.unwrap_or_default();
                    if fragments.glycan()[index].as_deref().is_some_and(|name| {
                        name == format!("{fragment_type}0") || name == format!("{fragment_type}$")
                    }) {
                        continue;
                    }
                    let charge = fragments.charge()[index].filter(|c| *c > 0).unwrap_or(1);
                    let shift = (rng
                        .random_range(self.settings.min_glycan_shift..self.settings.max_glycan_shift)
                        * 100.0)
                        .round()
                        / 100.0
                        / f64::from(charge);
                    fragments.mz_mut()[index] += shift;
                    fragments.fragment_type_mut()[index] = Some(format!("DECOY_{fragment_type}"));
                    if let Some(annotation) = &mut fragments.annotation_mut()[index] {
                        *annotation = format!("DECOY_{annotation}[+{shift:.2}]");
                    }
                }
            }
        }
        mark_decoy(&mut new.metadata, "glycanDecoy");
        Ok(new)
    }

    /// Create a decoy of the given type, [`DecoyType::Both`] creates a glycan decoy of the peptide decoy.
    /// # Errors
    /// See [`Self::peptide_decoy`] and [`Self::glycan_decoy`].
    pub fn decoy(
        &self,
        assay: &Assay,
        decoy_type: DecoyType,
        rng: &mut impl Rng,
    ) -> Result<Assay, GlycoError> {
        match decoy_type {
            DecoyType::Peptide => self.peptide_decoy(assay),
            DecoyType::Glycan => self.glycan_decoy(assay, rng),
            DecoyType::Both => self.glycan_decoy(&self.peptide_decoy(assay)?, rng),
        }
    }

    /// Draw a random sequence of the same length from the residues the calculator knows,
    /// until its residue mass differs enough from the given sequence. Returns the sequence
    /// and the mass difference (decoy minus target).
    /// # Errors
    /// If no sequence is found within the maximal number of attempts, or the calculator
    /// does not know a residue.
    pub fn random_decoy_sequence(
        &self,
        sequence: &str,
        rng: &mut impl Rng,
    ) -> Result<(String, f64), GlycoError> {
        let calculator = self.builder.calculator();
        let codes = calculator.amino_acid_codes();
        if codes.is_empty() {
            return Err(BoxedError::small(
                GlycoErrorKind::MassCalculator,
                "No amino acids",
                "The mass calculator does not know any amino acids",
            ));
        }
        let target = calculator.residue_mass(sequence)?;
        let length = sequence.chars().count();
        for _ in 0..self.settings.random.max_attempts {
            let decoy: String = (0..length)
                .map(|_| codes[rng.random_range(0..codes.len())])
                .collect();
            let shift = calculator.residue_mass(&decoy)? - target;
            if shift.abs() > self.settings.random.min_mass_shift {
                return Ok((decoy, shift));
            }
        }
        Err(BoxedError::new(
            GlycoErrorKind::MaxAttempts,
            "Maximal number of attempts reached",
            format!(
                "No random sequence with a mass shift of more than {} Da was found in {} attempts",
                self.settings.random.min_mass_shift, self.settings.random.max_attempts
            ),
            Context::show(sequence.to_string()),
        ))
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use mzglyco::assay::{Fragment, Fragments};

    use context_error::FullErrorContent;
    use super::*;
    use crate::{builder::FragmentationSettings, testing_tools::ToyCalculator};

    const GLYCAN: &str = "(N(N(H(H)(H))))";

    #[test]
    fn policy() {
        assert_eq!(
            "Ignore".parse::<UnknownFragmentPolicy>().unwrap(),
            UnknownFragmentPolicy::Ignore
        );
        assert_eq!(UnknownFragmentPolicy::Error.to_string(), "error");
        let err = "drop".parse::<UnknownFragmentPolicy>().unwrap_err();
        assert_eq!(*err.get_kind(), GlycoErrorKind::InvalidConfiguration);
        assert_eq!("both".parse::<DecoyType>().unwrap(), DecoyType::Both);
    }

    #[test]
    fn settings() {
        let settings = DecoySettings::from_json(
            r#"{"unknown_fragment_policy": "ignore", "random": {"max_attempts": 5}}"#,
        )
        .unwrap();
        assert_eq!(settings.unknown_fragment_policy, UnknownFragmentPolicy::Ignore);
        assert_eq!(settings.random.max_attempts, 5);
        assert!((settings.random.min_mass_shift - 1.0).abs() < f64::EPSILON);
        assert!(DecoySettings::default().glycan_shift(30.0, 1.0).validate().is_err());
        assert!(DecoySettings::from_json(r#"{"min_glycan_shift": -1}"#).is_err());
    }

    #[test]
    fn tryptic_sequence() {
        let assay = Assay::new("ABCDEFGK")
            .modification(vec![
                Modification::c_term("Amidated"),
                Modification::residue("Oxidation", 2, 'B'),
                Modification::n_term("Acetyl"),
                Modification::residue("Carbamidomethyl", 8, 'K'),
            ])
            .glycan(GLYCAN, 5);
        let decoy = decoy_sequence(&assay);
        assert_eq!(decoy.sequence, "GFEDCBAK");
        assert_eq!(decoy.glycan_site, Some(3));
        assert_eq!(
            decoy.modification,
            [
                Modification::n_term("Acetyl"),
                Modification::residue("Oxidation", 6, 'B'),
                Modification::residue("Carbamidomethyl", 8, 'K'),
                Modification::c_term("Amidated"),
            ]
        );
        for m in &decoy.modification {
            m.check(&decoy.sequence).unwrap();
        }

        let twice = decoy_sequence(&Assay {
            peptide_sequence: decoy.sequence,
            modification: decoy.modification,
            glycan_site: decoy.glycan_site,
            ..assay.clone()
        });
        assert_eq!(twice.sequence, assay.peptide_sequence);
        assert_eq!(twice.glycan_site, assay.glycan_site);
        assert_eq!(
            twice.modification,
            [
                Modification::n_term("Acetyl"),
                Modification::residue("Oxidation", 2, 'B'),
                Modification::residue("Carbamidomethyl", 8, 'K'),
                Modification::c_term("Amidated"),
            ]
        );
    }

    #[test]
    fn non_tryptic_sequence() {
        assert_eq!(decoy_sequence(&Assay::new("PEPTIDE")).sequence, "EDITPEP");
        assert_eq!(decoy_sequence(&Assay::new("")).sequence, "");
        assert_eq!(decoy_sequence(&Assay::new("K")).sequence, "K");
    }

    fn target(builder: &AssayBuilder<'_, ToyCalculator>) -> Assay {
        let mut assay = builder
            .theoretical_fragments("PENTIDEK", &[], Some(GLYCAN), Some(3), None)
            .unwrap();
        assay
            .metadata
            .insert("protein".to_string(), Value::String("P1/P2".to_string()));
        assay
    }

    #[test]
    fn peptide_decoy() {
        let builder = AssayBuilder::new(&ToyCalculator, FragmentationSettings::default());
        let generator = DecoyGenerator::new(builder.clone(), DecoySettings::default()).unwrap();
        let decoy = generator.peptide_decoy(&target(&builder)).unwrap();
        assert_eq!(decoy.peptide_sequence, "EDITNEPK");
        assert_eq!(decoy.glycan_site, Some(5));
        assert!(decoy.flag("decoy") && decoy.flag("peptideDecoy"));
        assert_eq!(decoy.metadata["protein"], "DECOY_P1/DECOY_P2");
        decoy.fragments.validate().unwrap();

        let fresh = builder
            .theoretical_fragments("EDITNEPK", &[], Some(GLYCAN), Some(5), None)
            .unwrap();
        assert!(!decoy.fragments.is_empty());
        assert!(decoy.fragments.mz().iter().all(|mz| fresh.fragments.mz().contains(mz)));
    }

    #[test]
    fn unknown_fragments() {
        let builder = AssayBuilder::new(&ToyCalculator, FragmentationSettings::peptide());
        let mut assay = Assay::new("PEPTIDEK").fragments(
            Fragments::from_rows([Fragment {
                fragment_type: Some("c".to_string()),
                number: Some(2),
                charge: Some(1),
                ..Fragment::new(123.0)
            }])
            .unwrap(),
        );
        let theoretical = builder
            .theoretical_fragments("PEPTIDEK", &[], None, None, None)
            .unwrap();
        assay.fragments.extend(theoretical.fragments).unwrap();
        let total = assay.fragments.len();

        let keep = DecoyGenerator::new(builder.clone(), DecoySettings::default())
            .unwrap()
            .peptide_decoy(&assay)
            .unwrap();
        assert_eq!(keep.fragments.len(), total);
        assert_eq!(keep.fragments.mz()[0], 123.0);
        assert_eq!(keep.fragments.fragment_type()[0].as_deref(), Some("c"));

        let ignore = DecoyGenerator::new(
            builder.clone(),
            DecoySettings::default().unknown_fragment_policy(UnknownFragmentPolicy::Ignore),
        )
        .unwrap()
        .peptide_decoy(&assay)
        .unwrap();
        assert_eq!(ignore.fragments.len(), total - 1);
        assert_eq!(ignore.fragments.mz(), &keep.fragments.mz()[1..]);

        let error = DecoyGenerator::new(
            builder,
            DecoySettings::default().unknown_fragment_policy(UnknownFragmentPolicy::Error),
        )
        .unwrap();
        let err = error.peptide_decoy(&assay).unwrap_err();
        assert_eq!(*err.get_kind(), GlycoErrorKind::UnknownFragmentType);
        let err = error
            .glycan_decoy(&assay, &mut StdRng::seed_from_u64(1))
            .unwrap_err();
        assert_eq!(*err.get_kind(), GlycoErrorKind::UnknownFragmentType);
    }

    fn glycan_row(mz: f64, charge: u32, name: &str) -> Fragment {
        Fragment {
            fragment_type: Some("Y".to_string()),
            charge: Some(charge),
            loss_type: Some("noloss".to_string()),
            glycan: Some(name.to_string()),
            annotation: Some(format!("{name}^+{charge}")),
            ..Fragment::new(mz)
        }
    }

    #[test]
    fn glycan_decoy() {
        let builder = AssayBuilder::new(&ToyCalculator, FragmentationSettings::default());
        let generator = DecoyGenerator::new(builder, DecoySettings::default()).unwrap();
        let assay = Assay::new("PENTIDEK").glycan(GLYCAN, 3).fragments(
            Fragments::from_rows([
                Fragment {
                    fragment_type: Some("b".to_string()),
                    number: Some(2),
                    charge: Some(1),
                    ..Fragment::new(227.1)
                },
                glycan_row(1000.0, 2, "Y-N(1)"),
                glycan_row(900.0, 1, "Y0"),
                glycan_row(1500.0, 1, "Y$"),
            ])
            .unwrap(),
        );
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let decoy = generator.glycan_decoy(&assay, &mut rng).unwrap();
            let mz = decoy.fragments.mz();
            assert!((1000.5..=1015.0).contains(&mz[1]), "{}", mz[1]);
            assert_eq!(mz[0], 227.1);
            assert_eq!(mz[2], 900.0);
            assert_eq!(mz[3], 1500.0);
            assert_eq!(decoy.fragments.fragment_type()[1].as_deref(), Some("DECOY_Y"));
            assert_eq!(decoy.fragments.fragment_type()[2].as_deref(), Some("Y"));
            let annotation = decoy.fragments.annotation()[1].clone().unwrap();
            assert!(annotation.starts_with("DECOY_Y-N(1)^+2[+"), "{annotation}");
            assert!(decoy.flag("decoy") && decoy.flag("glycanDecoy"));
            assert!(!decoy.flag("peptideDecoy"));
        }
    }

    #[test]
    fn both() {
        let builder = AssayBuilder::new(&ToyCalculator, FragmentationSettings::default());
        let generator = DecoyGenerator::new(builder.clone(), DecoySettings::default()).unwrap();
        let decoy = generator
            .decoy(&target(&builder), DecoyType::Both, &mut StdRng::seed_from_u64(7))
            .unwrap();
        assert_eq!(decoy.peptide_sequence, "EDITNEPK");
        assert!(decoy.flag("peptideDecoy") && decoy.flag("glycanDecoy"));
        assert!(
            decoy
                .fragments
                .fragment_type()
                .iter()
                .any(|t| t.as_deref() == Some("DECOY_Y"))
        );
    }

    #[test]
    fn random_sequence() {
        let builder = AssayBuilder::new(&ToyCalculator, FragmentationSettings::peptide());
        let generator = DecoyGenerator::new(builder.clone(), DecoySettings::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let (sequence, shift) = generator.random_decoy_sequence("PEPTIDEK", &mut rng).unwrap();
        assert_eq!(sequence.len(), 8);
        assert!(shift.abs() > 1.0);
        let expected = ToyCalculator.residue_mass(&sequence).unwrap()
            - ToyCalculator.residue_mass("PEPTIDEK").unwrap();
        assert!((shift - expected).abs() < 1e-9);

        let impossible = DecoyGenerator::new(
            builder,
            DecoySettings::default().random(RandomDecoySettings {
                max_attempts: 10,
                min_mass_shift: 1e6,
            }),
        )
        .unwrap();
        let err = impossible
            .random_decoy_sequence("PEPTIDEK", &mut rng)
            .unwrap_err();
        assert_eq!(*err.get_kind(), GlycoErrorKind::MaxAttempts);
    }

    #[test]
    fn mass_shift() {
        let assay = Assay::new("PEPTIDEK").fragments(
            Fragments::from_rows([
                Fragment {
                    charge: Some(1),
                    annotation: Some("y1^+1".to_string()),
                    ..Fragment::new(147.1)
                },
                Fragment {
                    charge: Some(2),
                    annotation: Some("y2^+2".to_string()),
                    ..Fragment::new(200.0)
                },
            ])
            .unwrap(),
        );
        let decoy = mass_shift_decoy(&assay, 10.0, &[1]).unwrap();
        assert_eq!(decoy.fragments.len(), 3);
        assert_eq!(decoy.fragments.mz()[2], 205.0);
        assert_eq!(decoy.fragments.annotation()[2].as_deref(), Some("DECOY_y2^+2[+5]"));
        assert_eq!(
            decoy.fragments.extra(DECOY_TRANSITION).unwrap(),
            [Value::Bool(false), Value::Bool(false), Value::Bool(true)]
        );
        // decoy transitions are not copied again
        let again = mass_shift_decoy(&decoy, -4.0, &[0, 2]).unwrap();
        assert_eq!(again.fragments.len(), 4);
        assert_eq!(again.fragments.annotation()[3].as_deref(), Some("DECOY_y1^+1[-4]"));
    }
}
