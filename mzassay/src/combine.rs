//! Combining replicate assays of the same (glyco)peptide.
use std::collections::BTreeMap;

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use mzglyco::assay::Assay;

/// Which properties make assays replicates of each other. The sequence, modifications,
/// glycan structure, and precursor charge are always used.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(default)]
pub struct GroupKey {
    /// Also use the glycosylation site
    pub glycan_site: bool,
    /// Only combine assays from the same file (the `file` metadata entry)
    pub within_run: bool,
}

impl Default for GroupKey {
    fn default() -> Self {
        Self {
            glycan_site: true,
            within_run: false,
        }
    }
}

impl GroupKey {
    /// Set the use of the glycosylation site
    #[must_use]
    pub fn glycan_site(self, glycan_site: bool) -> Self {
        Self {
            glycan_site,
            ..self
        }
    }

    /// Set whether only assays from the same file are combined
    #[must_use]
    pub fn within_run(self, within_run: bool) -> Self {
        Self { within_run, ..self }
    }

    /// The key of an assay, assays with the same key are replicates
    pub fn key(&self, assay: &Assay) -> ReplicateKey {
        ReplicateKey {
            file: self
                .within_run
                .then(|| assay.metadata.get("file"))
                .flatten()
                .filter(|v| !v.is_null())
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                }),
            sequence: assay.peptide_sequence.clone(),
            modification: assay.modification_string(),
            glycan_struct: assay.glycan_struct.clone(),
            precursor_charge: assay.precursor_charge,
            glycan_site: if self.glycan_site {
                assay.glycan_site
            } else {
                None
            },
        }
    }
}

/// The identity of a group of replicates, see [`GroupKey`]
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ReplicateKey {
    /// The file, only if combining within runs
    pub file: Option<String>,
    /// The peptide sequence
    pub sequence: String,
    /// The modifications in their textual form
    pub modification: Option<String>,
    /// The glycan structure
    pub glycan_struct: Option<String>,
    /// The precursor charge
    pub precursor_charge: Option<u32>,
    /// The glycosylation site, only if the site is used
    pub glycan_site: Option<usize>,
}

/// Which assay of a group of replicates is kept
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum ReplicateSelection {
    /// The first one
    #[default]
    First,
    /// The one with the best score, stored in the metadata under the given name. Assays
    /// without a numeric score are skipped, if no assay has a score the first is kept.
    BestScore {
        /// The metadata entry
        score: String,
        /// If a higher score is better
        higher_is_better: bool,
    },
}

/// Removes redundant assays by keeping one assay per group of replicates
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(default)]
pub struct AssayCombiner {
    /// How replicates are recognised
    pub group_key: GroupKey,
    /// Which replicate is kept
    pub selection: ReplicateSelection,
}

impl AssayCombiner {
    /// Create a new combiner
    pub const fn new(group_key: GroupKey, selection: ReplicateSelection) -> Self {
        Self {
            group_key,
            selection,
        }
    }

    /// Pick one assay from a group of replicates, `None` if the group is empty
    pub fn combine_replicates<'a>(&self, replicates: &'a [Assay]) -> Option<&'a Assay> {
        match &self.selection {
            ReplicateSelection::First => replicates.first(),
            ReplicateSelection::BestScore {
                score,
                higher_is_better,
            } => {
                let scored = replicates.iter().filter_map(|assay| {
                    assay
                        .metadata
                        .get(score)
                        .and_then(Value::as_f64)
                        .map(|s| (assay, OrderedFloat(s)))
                });
                // the first of equally scoring replicates is kept
                let best = if *higher_is_better {
                    scored.reduce(|best, next| if next.1 > best.1 { next } else { best })
                } else {
                    scored.reduce(|best, next| if next.1 < best.1 { next } else { best })
                };
                best.map(|(assay, _)| assay).or_else(|| replicates.first())
            }
        }
    }

    /// Group the assays into replicates, ordered by their key. Within a group the original
    /// order is kept.
    pub fn group_replicates(&self, assays: impl IntoIterator<Item = Assay>) -> Vec<Vec<Assay>> {
        let mut groups: BTreeMap<ReplicateKey, Vec<Assay>> = BTreeMap::new();
        for assay in assays {
            groups.entry(self.group_key.key(&assay)).or_default().push(assay);
        }
        groups.into_values().collect()
    }

    /// Keep one assay per group of replicates, ordered by their key
    pub fn remove_redundant(&self, assays: impl IntoIterator<Item = Assay>) -> Vec<Assay> {
        self.group_replicates(assays)
            .iter()
            .filter_map(|group| self.combine_replicates(group).cloned())
            .collect()
    }

    /// Remove the redundant assays from multiple sets of assays at once
    pub fn combine(&self, sets: impl IntoIterator<Item = Vec<Assay>>) -> Vec<Assay> {
        self.remove_redundant(sets.into_iter().flatten())
    }
}
