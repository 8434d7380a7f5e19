#![doc = include_str!("../README.md")]

/// Assays and their fragments
pub mod assay;
pub mod error;
mod fragment_type;
/// Parsing glycan fragment names
pub mod glycan_fragment;
pub mod mass_calculator;
/// Matching of peak lists
pub mod matching;
/// Modifications and their textual form
pub mod modification;
/// Loading settings from JSON
pub mod parse_json;
mod tolerance;

pub use fragment_type::{FragmentKind, FragmentVocabulary};
pub use tolerance::Tolerance;

/// A subset of the types and traits that are envisioned to be used the most, importing this is a good starting point for working with the crate
pub mod prelude {
    pub use crate::assay::{Assay, Fragment, Fragments, Metadata};
    pub use crate::error::{GlycoError, GlycoErrorKind};
    pub use crate::glycan_fragment::{GlycanComposition, GlycanFragmentName, parse_glycan_fragment};
    pub use crate::mass_calculator::{FragmentRequest, FragmentSeries, MassCalculator};
    pub use crate::matching::{
        MatchCriteria, MatchingParameters, PeakList, PeakMatch, Peaks, match_peaks,
    };
    pub use crate::modification::{Modification, ModificationSite};
    pub use crate::parse_json::ParseJson;
    pub use crate::{FragmentKind, FragmentVocabulary, Tolerance};
}
