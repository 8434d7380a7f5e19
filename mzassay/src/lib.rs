#![doc = include_str!("../README.md")]

pub mod annotator;
pub mod batch;
pub mod builder;
pub mod combine;
pub mod decoy;
pub mod filter;
pub mod oxonium;
pub mod settings;
#[cfg(test)]
mod testing_tools;

/// A subset of the types and traits that are envisioned to be used the most, importing this is a good starting point for working with the crate
pub mod prelude {
    pub use crate::annotator::SpectrumAnnotator;
    pub use crate::builder::{AssayBuilder, FragmentationSettings, GlycanFragmentation, NO_LOSS};
    pub use crate::combine::{AssayCombiner, GroupKey, ReplicateSelection};
    pub use crate::decoy::{
        DecoyGenerator, DecoySettings, DecoyType, RandomDecoySettings, UnknownFragmentPolicy,
        decoy_sequence, mass_shift_decoy,
    };
    pub use crate::filter::{
        AssayFilterCriteria, FilterCriteria, FragmentFilter, MonosaccharideThreshold, PriorPool,
    };
    pub use crate::oxonium::OxoniumIonExtractor;
    pub use crate::settings::PipelineSettings;
}
