//! Running the assay transformations over many assays at once.
//!
//! Assays that fail are skipped and reported with [`log::warn!`], a summary is reported with
//! [`log::info!`]. The results are always in the order of the input. Random decoys use one
//! random source per assay seeded from the given seed and the index of the assay, so the
//! sequential and parallel versions give the same results.
use log::{debug, info, warn};
use rand::{SeedableRng, rngs::StdRng};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

use mzglyco::{assay::Assay, error::GlycoError, mass_calculator::MassCalculator};

use crate::{
    builder::AssayBuilder,
    decoy::{DecoyGenerator, DecoyType},
    filter::{AssayFilterCriteria, FragmentFilter},
};

fn rng_for(seed: u64, index: usize) -> StdRng {
    StdRng::seed_from_u64(seed.wrapping_add(index as u64))
}

fn finish<T>(task: &str, outcomes: Vec<Result<Option<T>, GlycoError>>) -> Vec<T> {
    let total = outcomes.len();
    let mut rejected = 0;
    let mut failed = 0;
    let mut result = Vec::with_capacity(total);
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(Some(value)) => result.push(value),
            Ok(None) => rejected += 1,
            Err(err) => {
                failed += 1;
                warn!("{task}: skipped assay {index}: {err}");
            }
        }
    }
    info!(
        "{task}: kept {} of {total} assays ({rejected} rejected, {failed} failed)",
        result.len()
    );
    result
}

fn run<T>(
    task: &str,
    assays: &[Assay],
    f: impl Fn(usize, &Assay) -> Result<Option<T>, GlycoError>,
) -> Vec<T> {
    debug!("{task}: processing {} assays", assays.len());
    finish(
        task,
        assays.iter().enumerate().map(|(i, a)| f(i, a)).collect(),
    )
}

#[cfg(feature = "rayon")]
fn par_run<T: Send>(
    task: &str,
    assays: &[Assay],
    f: impl Fn(usize, &Assay) -> Result<Option<T>, GlycoError> + Sync,
) -> Vec<T> {
    debug!(
        "{task}: processing {} assays on {} threads",
        assays.len(),
        rayon::current_num_threads()
    );
    finish(
        task,
        assays.par_iter().enumerate().map(|(i, a)| f(i, a)).collect(),
    )
}

/// Recalculate the fragment m/z and, for assays with a precursor charge, the precursor m/z of all assays
pub fn update_assays<C: MassCalculator + ?Sized>(
    builder: &AssayBuilder<'_, C>,
    assays: &[Assay],
) -> Vec<Assay> {
    run("update", assays, |_, assay| update_one(builder, assay))
}

/// Recalculate all assays in parallel, see [`update_assays`]
#[cfg(feature = "rayon")]
pub fn par_update_assays<C: MassCalculator + Sync + ?Sized>(
    builder: &AssayBuilder<'_, C>,
    assays: &[Assay],
) -> Vec<Assay> {
    par_run("update", assays, |_, assay| update_one(builder, assay))
}

fn update_one<C: MassCalculator + ?Sized>(
    builder: &AssayBuilder<'_, C>,
    assay: &Assay,
) -> Result<Option<Assay>, GlycoError> {
    let assay = builder.update_fragment_mz(assay.clone())?;
    if assay.precursor_charge.is_some() {
        builder.update_precursor_mz(assay).map(Some)
    } else {
        Ok(Some(assay))
    }
}

/// Filter all assays, rejected assays are left out
pub fn filter_assays(
    filter: FragmentFilter<'_>,
    assays: &[Assay],
    criteria: &AssayFilterCriteria,
) -> Vec<Assay> {
    run("filter", assays, |_, assay| filter.filter_assay(assay, criteria))
}

/// Filter all assays in parallel, see [`filter_assays`]
#[cfg(feature = "rayon")]
pub fn par_filter_assays(
    filter: FragmentFilter<'_>,
    assays: &[Assay],
    criteria: &AssayFilterCriteria,
) -> Vec<Assay> {
    par_run("filter", assays, |_, assay| filter.filter_assay(assay, criteria))
}

/// Create a decoy for every assay
pub fn decoys<C: MassCalculator + ?Sized>(
    generator: &DecoyGenerator<'_, C>,
    assays: &[Assay],
    decoy_type: DecoyType,
    seed: u64,
) -> Vec<Assay> {
    run("decoy", assays, |index, assay| {
        generator
            .decoy(assay, decoy_type, &mut rng_for(seed, index))
            .map(Some)
    })
}

/// Create a decoy for every assay in parallel, see [`decoys`]
#[cfg(feature = "rayon")]
pub fn par_decoys<C: MassCalculator + Sync + ?Sized>(
    generator: &DecoyGenerator<'_, C>,
    assays: &[Assay],
    decoy_type: DecoyType,
    seed: u64,
) -> Vec<Assay> {
    par_run("decoy", assays, |index, assay| {
        generator
            .decoy(assay, decoy_type, &mut rng_for(seed, index))
            .map(Some)
    })
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use crate::{
        builder::FragmentationSettings,
        decoy::DecoySettings,
        filter::FilterCriteria,
        testing_tools::ToyCalculator,
    };

    const GLYCAN: &str = "(N(N(H(H)(H))))";

    fn assays(builder: &AssayBuilder<'_, ToyCalculator>) -> Vec<Assay> {
        ["PENTIDEK", "ANTTK", "GNSSR"]
            .iter()
            .map(|sequence| {
                builder
                    .assay(sequence, &[], Some(GLYCAN), Some(2), 2)
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn update_skips_failures() {
        let builder = AssayBuilder::new(&ToyCalculator, FragmentationSettings::default());
        let mut input = assays(&builder);
        let expected = input.clone();
        input[1].precursor_mz = None;
        input[2].peptide_sequence = "GNSSB".to_string();
        let updated = update_assays(&builder, &input);
        assert_eq!(updated.len(), 2);
        assert_eq!(updated[0], expected[0]);
        assert_eq!(updated[1], expected[1]);
    }

    #[test]
    fn filter_rejects() {
        let builder = AssayBuilder::new(&ToyCalculator, FragmentationSettings::default());
        let input = assays(&builder);
        let criteria = AssayFilterCriteria::default()
            .min_fragment_number(10)
            .fragment(FilterCriteria::default().fragment_type(["y"]));
        let filtered = filter_assays(builder.fragment_filter(), &input, &criteria);
        // 14 y ions for the longest peptide, 8 for the others
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].peptide_sequence, "PENTIDEK");
    }

    #[test]
    fn seeded_decoys() {
        let builder = AssayBuilder::new(&ToyCalculator, FragmentationSettings::default());
        let generator = DecoyGenerator::new(builder.clone(), DecoySettings::default()).unwrap();
        let input = assays(&builder);
        let first = decoys(&generator, &input, DecoyType::Both, 12);
        let second = decoys(&generator, &input, DecoyType::Both, 12);
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
        assert!(first.iter().all(|a| a.flag("decoy")));
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn parallel_is_sequential() {
        let builder = AssayBuilder::new(&ToyCalculator, FragmentationSettings::default());
        let generator = DecoyGenerator::new(builder.clone(), DecoySettings::default()).unwrap();
        let input = assays(&builder);
        assert_eq!(
            par_decoys(&generator, &input, DecoyType::Glycan, 5),
            decoys(&generator, &input, DecoyType::Glycan, 5)
        );
        assert_eq!(
            par_update_assays(&builder, &input),
            update_assays(&builder, &input)
        );
        let criteria = AssayFilterCriteria::default().min_fragment_number(1);
        assert_eq!(
            par_filter_assays(builder.fragment_filter(), &input, &criteria),
            filter_assays(builder.fragment_filter(), &input, &criteria)
        );
    }
}
