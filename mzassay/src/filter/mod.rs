//! Selecting fragments from assays, and rejecting whole assays.
//!
//! All selections are given as indices into the fragments of the assay that was passed in,
//! in ascending order. Use [`Assay::select_fragments`] to get the reduced assay.
mod assay_filter;
mod criteria;
mod engine;

use mzglyco::assay::Assay;

pub use assay_filter::*;
pub use criteria::*;
pub use engine::*;

/// The fragments within the m/z range, unset bounds are unbounded
pub fn by_mz_range(assay: &Assay, min: Option<f64>, max: Option<f64>) -> Vec<usize> {
    assay
        .fragments
        .mz()
        .iter()
        .enumerate()
        .filter(|(_, mz)| min.is_none_or(|min| **mz >= min) && max.is_none_or(|max| **mz <= max))
        .map(|(i, _)| i)
        .collect()
}

/// The fragments with one of the given charges
pub fn by_charge(assay: &Assay, charges: &[u32]) -> Vec<usize> {
    assay
        .fragments
        .charge()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_some_and(|c| charges.contains(&c)))
        .map(|(i, _)| i)
        .collect()
}

/// The fragments with one of the given neutral losses
pub fn by_loss_type(assay: &Assay, losses: &[String]) -> Vec<usize> {
    assay
        .fragments
        .loss_type()
        .iter()
        .enumerate()
        .filter(|(_, l)| l.as_deref().is_some_and(|l| losses.iter().any(|a| a == l)))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use mzglyco::assay::{Fragment, Fragments};

    use super::*;

    #[test]
    fn simple_filters() {
        let assay = Assay::new("PEPK").fragments(
            Fragments::from_rows([
                Fragment {
                    charge: Some(1),
                    loss_type: Some("noloss".to_string()),
                    ..Fragment::new(100.0)
                },
                Fragment {
                    charge: Some(2),
                    loss_type: Some("H2O".to_string()),
                    ..Fragment::new(200.0)
                },
                Fragment::new(300.0),
            ])
            .unwrap(),
        );
        assert_eq!(by_mz_range(&assay, Some(150.0), None), [1, 2]);
        assert_eq!(by_mz_range(&assay, None, Some(200.0)), [0, 1]);
        assert_eq!(by_mz_range(&assay, None, None), [0, 1, 2]);
        assert_eq!(by_charge(&assay, &[2, 3]), [1]);
        assert_eq!(by_loss_type(&assay, &["noloss".to_string()]), [0]);
    }
}
