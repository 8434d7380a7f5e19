use std::cmp::Reverse;

use itertools::Itertools;
use ordered_float::OrderedFloat;

use mzglyco::{
    FragmentKind, FragmentVocabulary,
    assay::Assay,
    error::GlycoError,
    glycan_fragment::parse_glycan_fragment,
};

use crate::filter::{
    by_charge, by_loss_type, by_mz_range,
    criteria::{ALL_MONOSACCHARIDES, FilterCriteria, MonosaccharideThreshold, PriorPool},
};

/// Selects fragments from assays, knowing which fragment types are peptide and which are glycan fragments.
#[derive(Clone, Copy, Debug)]
pub struct FragmentFilter<'a> {
    vocabulary: &'a FragmentVocabulary,
}

/// Keep the indices in `indices` that are also in `other`, both have to be ascending
fn intersect(indices: &[usize], other: &[usize]) -> Vec<usize> {
    let mut other = other.iter().peekable();
    indices
        .iter()
        .copied()
        .filter(|i| {
            while other.next_if(|o| **o < *i).is_some() {}
            other.peek().is_some_and(|o| **o == *i)
        })
        .collect()
}

/// All indices sorted on descending intensity, stable. Without intensities the order is kept.
fn rank_by_intensity(assay: &Assay) -> Vec<usize> {
    let mut order = (0..assay.fragments.len()).collect_vec();
    if let Some(intensity) = assay.fragments.intensity() {
        order.sort_by_key(|i| Reverse(OrderedFloat(intensity[*i])));
    }
    order
}

/// Only keep the indices with an intensity of at least `fraction` times the highest intensity among them
fn above_relative_intensity(assay: &Assay, indices: Vec<usize>, fraction: Option<f64>) -> Vec<usize> {
    let (Some(fraction), Some(intensity)) = (fraction, assay.fragments.intensity()) else {
        return indices;
    };
    let Some(max) = indices.iter().map(|i| OrderedFloat(intensity[*i])).max() else {
        return indices;
    };
    let threshold = fraction * max.0;
    indices
        .into_iter()
        .filter(|i| intensity[*i] >= threshold)
        .collect()
}

impl<'a> FragmentFilter<'a> {
    /// Create a new filter
    pub const fn new(vocabulary: &'a FragmentVocabulary) -> Self {
        Self { vocabulary }
    }

    /// The vocabulary
    pub const fn vocabulary(&self) -> &'a FragmentVocabulary {
        self.vocabulary
    }

    fn kind(&self, assay: &Assay, index: usize) -> FragmentKind {
        self.vocabulary
            .classify(assay.fragments.fragment_type()[index].as_deref())
    }

    /// The fragments with one of the given types, all types of the vocabulary if no types are given
    pub fn by_type(&self, assay: &Assay, types: Option<&[String]>) -> Vec<usize> {
        assay
            .fragments
            .fragment_type()
            .iter()
            .enumerate()
            .filter(|(_, t)| {
                t.as_deref().is_some_and(|t| match types {
                    Some(types) => types.iter().any(|a| a == t),
                    None => self.vocabulary.is_known(Some(t)),
                })
            })
            .map(|(i, _)| i)
            .collect()
    }

    /// The fragments of the given kind
    pub fn by_kind(&self, assay: &Assay, kind: FragmentKind) -> Vec<usize> {
        (0..assay.fragments.len())
            .filter(|i| self.kind(assay, *i) == kind)
            .collect()
    }

    /// The glycan fragments and the other fragments with an ordinal of at least `min_number`
    pub fn by_amino_acid_number(&self, assay: &Assay, min_number: u32) -> Vec<usize> {
        (0..assay.fragments.len())
            .filter(|i| {
                self.kind(assay, *i) == FragmentKind::Glycan
                    || assay.fragments.number()[*i].is_some_and(|n| n >= min_number)
            })
            .collect()
    }

    /// The other fragments and the glycan fragments that keep enough monosaccharides. The bare
    /// peptide (`Y0`) and intact glycan (`Y$`) count as zero monosaccharides, as do glycan
    /// fragments without a name.
    /// # Errors
    /// If a glycan fragment name cannot be parsed.
    pub fn by_monosaccharide_number(
        &self,
        assay: &Assay,
        threshold: &MonosaccharideThreshold,
    ) -> Result<Vec<usize>, GlycoError> {
        let mut result = Vec::new();
        for (index, name) in assay.fragments.glycan().iter().enumerate() {
            if self.kind(assay, index) != FragmentKind::Glycan {
                result.push(index);
                continue;
            }
            let composition = name
                .as_deref()
                .map(|name| parse_glycan_fragment(name, self.vocabulary.glycan.as_slice()))
                .transpose()?
                .and_then(|parsed| parsed.composition)
                .unwrap_or_default();
            let enough = match threshold {
                MonosaccharideThreshold::Total(min) => composition.total() >= *min,
                MonosaccharideThreshold::PerCode(map) => map.iter().all(|(code, min)| {
                    if code == ALL_MONOSACCHARIDES {
                        composition.total() >= *min
                    } else {
                        composition.count(code) >= *min
                    }
                }),
            };
            if enough {
                result.push(index);
            }
        }
        Ok(result)
    }

    /// Select the fragments that fulfil all criteria, the indices are ascending.
    /// # Errors
    /// If the criteria are invalid or a glycan fragment name cannot be parsed.
    pub fn select(&self, assay: &Assay, criteria: &FilterCriteria) -> Result<Vec<usize>, GlycoError> {
        criteria.validate()?;
        self.select_validated(assay, criteria)
    }

    /// Select the fragments that fulfil all criteria and return the reduced assay.
    /// # Errors
    /// If the criteria are invalid or a glycan fragment name cannot be parsed.
    pub fn filter_fragments(&self, assay: &Assay, criteria: &FilterCriteria) -> Result<Assay, GlycoError> {
        Ok(assay.select_fragments(&self.select(assay, criteria)?))
    }

    /// The fragments that pass all inclusion filters, without given types only the types of the
    /// vocabulary pass
    fn candidates(&self, assay: &Assay, criteria: &FilterCriteria) -> Result<Vec<usize>, GlycoError> {
        let mut candidates = self.by_type(assay, criteria.fragment_type.as_deref());
        if let Some(min) = criteria.min_fragment_amino_acid_number {
            candidates = intersect(&candidates, &self.by_amino_acid_number(assay, min));
        }
        if let Some(threshold) = &criteria.min_fragment_monosaccharide_number {
            candidates = intersect(&candidates, &self.by_monosaccharide_number(assay, threshold)?);
        }
        if criteria.min_fragment_mz.is_some() || criteria.max_fragment_mz.is_some() {
            candidates = intersect(
                &candidates,
                &by_mz_range(assay, criteria.min_fragment_mz, criteria.max_fragment_mz),
            );
        }
        if let Some(charges) = &criteria.fragment_charge {
            candidates = intersect(&candidates, &by_charge(assay, charges));
        }
        if let Some(losses) = &criteria.fragment_loss_type {
            candidates = intersect(&candidates, &by_loss_type(assay, losses));
        }
        Ok(candidates)
    }

    /// The members of a prior pool in the (reduced) assay
    fn pool(
        &self,
        assay: &Assay,
        kind: FragmentKind,
        pool: Option<&PriorPool>,
    ) -> Result<Vec<bool>, GlycoError> {
        let mut members = vec![false; assay.fragments.len()];
        let Some(pool) = pool else {
            return Ok(members);
        };
        let restricted = match &pool.criteria {
            Some(criteria) => Some(self.select_validated(assay, criteria)?),
            None => None,
        };
        for index in self.by_kind(assay, kind) {
            members[index] = restricted.as_ref().is_none_or(|r| r.binary_search(&index).is_ok());
        }
        Ok(members)
    }

    fn select_validated(&self, assay: &Assay, criteria: &FilterCriteria) -> Result<Vec<usize>, GlycoError> {
        let candidates = self.candidates(assay, criteria)?;
        let reduced = assay.select_fragments(&candidates);
        let ranked = rank_by_intensity(&reduced);

        let selected = if criteria.has_prior_pools() {
            self.select_with_pools(&reduced, &ranked, criteria)?
        } else {
            ranked
                .into_iter()
                .take(criteria.max_fragment_number.unwrap_or(usize::MAX))
                .collect()
        };
        let mut selected =
            above_relative_intensity(&reduced, selected, criteria.min_relative_fragment_intensity)
                .into_iter()
                .map(|i| candidates[i])
                .collect_vec();
        selected.sort_unstable();
        Ok(selected)
    }

    /// Fill the budget with the most intense fragments, preferring the prior pools
    fn select_with_pools(
        &self,
        reduced: &Assay,
        ranked: &[usize],
        criteria: &FilterCriteria,
    ) -> Result<Vec<usize>, GlycoError> {
        let Some(max) = criteria.max_fragment_number else {
            return Ok(ranked.to_vec());
        };
        let peptide_budget = criteria.prior_peptide_fragment.as_ref().map_or(0, |p| p.number);
        let glycan_budget = criteria.prior_glycan_fragment.as_ref().map_or(0, |p| p.number);
        let peptide_pool = self.pool(
            reduced,
            FragmentKind::Peptide,
            criteria.prior_peptide_fragment.as_ref(),
        )?;
        let glycan_pool = self.pool(
            reduced,
            FragmentKind::Glycan,
            criteria.prior_glycan_fragment.as_ref(),
        )?;

        let mut peptide = Vec::new();
        let mut glycan = Vec::new();
        let mut other = Vec::new();
        for &index in ranked {
            if peptide_pool[index] && peptide.len() < peptide_budget {
                peptide.push(index);
            } else if glycan_pool[index] && glycan.len() < glycan_budget {
                glycan.push(index);
            } else {
                other.push(index);
            }
        }

        let taken = peptide.len() + glycan.len();
        if taken <= max {
            other.truncate(max - taken);
            Ok(peptide.into_iter().chain(glycan).chain(other).collect())
        } else {
            let peptide_share = (max as f64 * peptide_budget as f64
                / (peptide_budget as f64 + glycan_budget as f64))
                .round_ties_even() as usize;
            let glycan_share = max - peptide_share.min(max);
            peptide.truncate(peptide_share);
            glycan.truncate(glycan_share);
            Ok(peptide.into_iter().chain(glycan).collect())
        }
    }
}
