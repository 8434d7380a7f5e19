//! All settings of an assay pipeline in one document.
use context_error::{BoxedError, Context, CreateError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use mzglyco::{
    error::{GlycoError, GlycoErrorKind},
    mass_calculator::MassCalculator,
    matching::MatchingParameters,
    parse_json::{ParseJson, use_serde},
};

use crate::{
    annotator::SpectrumAnnotator,
    builder::{AssayBuilder, FragmentationSettings},
    combine::AssayCombiner,
    decoy::{DecoyGenerator, DecoySettings, DecoyType},
    filter::AssayFilterCriteria,
    oxonium::OxoniumIonExtractor,
};

/// The settings for building, annotating, filtering, decoying, and combining assays.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Fragment generation
    pub fragmentation: FragmentationSettings,
    /// Peak matching for annotation and oxonium ion extraction
    pub matching: MatchingParameters,
    /// Assay filtering
    pub filter: AssayFilterCriteria,
    /// Decoy generation
    pub decoy: DecoySettings,
    /// The kind of decoys that are generated
    pub decoy_type: DecoyType,
    /// The seed for the random decoys
    pub seed: u64,
    /// Replicate removal
    pub combine: AssayCombiner,
}

impl PipelineSettings {
    /// Set the fragmentation settings
    #[must_use]
    pub fn fragmentation(self, fragmentation: FragmentationSettings) -> Self {
        Self {
            fragmentation,
            ..self
        }
    }

    /// Set the matching parameters
    #[must_use]
    pub fn matching(self, matching: MatchingParameters) -> Self {
        Self { matching, ..self }
    }

    /// Set the assay filter criteria
    #[must_use]
    pub fn filter(self, filter: AssayFilterCriteria) -> Self {
        Self { filter, ..self }
    }

    /// Set the decoy settings and type
    #[must_use]
    pub fn decoy(self, decoy: DecoySettings, decoy_type: DecoyType) -> Self {
        Self {
            decoy,
            decoy_type,
            ..self
        }
    }

    /// Set the seed for the random decoys
    #[must_use]
    pub fn seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }

    /// Set the replicate combination
    #[must_use]
    pub fn combine(self, combine: AssayCombiner) -> Self {
        Self { combine, ..self }
    }

    /// Check all parts of the settings.
    /// # Errors
    /// If the filter or decoy settings are invalid.
    pub fn validate(&self) -> Result<(), GlycoError> {
        self.filter.validate()?;
        self.decoy.validate()
    }

    /// An assay builder with the fragmentation settings
    pub fn builder<'c, C: MassCalculator + ?Sized>(&self, calculator: &'c C) -> AssayBuilder<'c, C> {
        AssayBuilder::new(calculator, self.fragmentation.clone())
    }

    /// A spectrum annotator with the fragmentation settings and matching parameters
    pub fn annotator<'c, C: MassCalculator + ?Sized>(
        &self,
        calculator: &'c C,
    ) -> SpectrumAnnotator<'c, C> {
        SpectrumAnnotator::new(self.builder(calculator), self.matching)
    }

    /// A decoy generator with the fragmentation and decoy settings
    /// # Errors
    /// If the decoy settings are invalid.
    pub fn decoy_generator<'c, C: MassCalculator + ?Sized>(
        &self,
        calculator: &'c C,
    ) -> Result<DecoyGenerator<'c, C>, GlycoError> {
        DecoyGenerator::new(self.builder(calculator), self.decoy)
    }

    /// An oxonium ion extractor with the matching parameters
    pub fn oxonium_extractor(&self, calculator: &(impl MassCalculator + ?Sized)) -> OxoniumIonExtractor {
        OxoniumIonExtractor::new(calculator, self.matching)
    }
}

impl ParseJson for PipelineSettings {
    /// Every section is parsed with its own rules, so the short forms of the matching
    /// parameters can be used here as well. Missing sections get their defaults.
    fn from_json_value(value: Value) -> Result<Self, GlycoError> {
        let Value::Object(map) = value else {
            return Err(BoxedError::new(
                GlycoErrorKind::InvalidJson,
                "Invalid PipelineSettings",
                "The JSON value has to be a map",
                Context::show(value.to_string()),
            ));
        };
        let mut settings = Self::default();
        for (key, value) in map {
            match key.as_str() {
                "fragmentation" => settings.fragmentation = use_serde(value)?,
                "matching" => settings.matching = MatchingParameters::from_json_value(value)?,
                "filter" => settings.filter = AssayFilterCriteria::from_json_value(value)?,
                "decoy" => settings.decoy = DecoySettings::from_json_value(value)?,
                "decoy_type" => {
                    settings.decoy_type = match value {
                        Value::String(text) => text.parse()?,
                        other => use_serde(other)?,
                    }
                }
                "seed" => {
                    settings.seed = value.as_u64().ok_or_else(|| {
                        BoxedError::new(
                            GlycoErrorKind::InvalidJson,
                            "Invalid PipelineSettings",
                            "The seed has to be a non negative integer",
                            Context::show(value.to_string()),
                        )
                    })?;
                }
                "combine" => settings.combine = use_serde(value)?,
                other => {
                    return Err(BoxedError::new(
                        GlycoErrorKind::InvalidJson,
                        "Invalid PipelineSettings",
                        format!("The key '{other}' is not a known section"),
                        Context::show(other.to_string()),
                    ));
                }
            }
        }
        Ok(settings)
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use mzglyco::{Tolerance, matching::MatchCriteria};

    use context_error::FullErrorContent;
    use super::*;
    use crate::{decoy::UnknownFragmentPolicy, testing_tools::ToyCalculator};

    #[test]
    fn load() {
        let settings = PipelineSettings::from_json(
            r#"{
                "fragmentation": {"fragment_types": ["b", "y"], "glycan": null},
                "matching": {"tolerance": "0.02 Da", "criteria": "nearest"},
                "filter": {"min_fragment_number": 3, "fragment": {"max_fragment_number": 6}},
                "decoy": {"unknown_fragment_policy": "ignore"},
                "decoy_type": "both",
                "seed": 42,
                "combine": {"group_key": {"glycan_site": false}}
            }"#,
        )
        .unwrap();
        assert_eq!(settings.fragmentation, FragmentationSettings {
            fragment_types: vec!["b".to_string(), "y".to_string()],
            glycan: None,
            ..FragmentationSettings::default()
        });
        assert_eq!(settings.matching.tolerance, Tolerance::Da(0.02));
        assert_eq!(settings.matching.criteria, MatchCriteria::Nearest);
        assert_eq!(settings.filter.min_fragment_number, Some(3));
        assert_eq!(settings.filter.fragment.max_fragment_number, Some(6));
        assert_eq!(
            settings.decoy.unknown_fragment_policy,
            UnknownFragmentPolicy::Ignore
        );
        assert_eq!(settings.decoy_type, DecoyType::Both);
        assert_eq!(settings.seed, 42);
        assert!(!settings.combine.group_key.glycan_site);
        settings.validate().unwrap();

        let annotator = settings.annotator(&ToyCalculator);
        assert_eq!(annotator.parameters(), &settings.matching);
        assert!(settings.decoy_generator(&ToyCalculator).is_ok());
        assert!(!settings.oxonium_extractor(&ToyCalculator).names().is_empty());
    }

    #[test]
    fn defaults() {
        assert_eq!(
            PipelineSettings::from_json("{}").unwrap(),
            PipelineSettings::default()
        );
    }

    #[test]
    fn invalid() {
        let err = PipelineSettings::from_json(r#"{"decoys": {}}"#).unwrap_err();
        assert_eq!(*err.get_kind(), GlycoErrorKind::InvalidJson);
        let err = PipelineSettings::from_json(r#"{"decoy": {"min_glycan_shift": 40.0}}"#)
            .unwrap_err();
        assert_eq!(*err.get_kind(), GlycoErrorKind::InvalidConfiguration);
        let err = PipelineSettings::from_json(r#"{"decoy_type": "protein"}"#).unwrap_err();
        assert_eq!(*err.get_kind(), GlycoErrorKind::InvalidConfiguration);
        let err = PipelineSettings::from_json(r#"{"seed": -1}"#).unwrap_err();
        assert_eq!(*err.get_kind(), GlycoErrorKind::InvalidJson);
        assert!(PipelineSettings::from_json("[]").is_err());
    }
}
