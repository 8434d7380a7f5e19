use std::collections::BTreeMap;

use context_error::{BoxedError, Context, CreateError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{GlycoError, GlycoErrorKind},
    matching::PeakList,
};

/// All fragments of an assay, stored as columns that always have the same length.
///
/// Mutable access is only given as slices so the lengths can only be changed through the
/// methods that check them.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(try_from = "UncheckedFragments")]
pub struct Fragments {
    #[serde(rename = "fragmentMZ")]
    mz: Vec<f64>,
    #[serde(rename = "fragmentIntensity", skip_serializing_if = "Option::is_none")]
    intensity: Option<Vec<f64>>,
    #[serde(rename = "fragmentType")]
    fragment_type: Vec<Option<String>>,
    #[serde(rename = "fragmentNumber")]
    number: Vec<Option<u32>>,
    #[serde(rename = "fragmentCharge")]
    charge: Vec<Option<u32>>,
    #[serde(rename = "fragmentLossType")]
    loss_type: Vec<Option<String>>,
    #[serde(rename = "fragmentGlycan")]
    glycan: Vec<Option<String>>,
    #[serde(rename = "fragmentAnnotation")]
    annotation: Vec<Option<String>>,
    #[serde(flatten)]
    extra: BTreeMap<String, Vec<Value>>,
}

/// A single fragment, one row of [`Fragments`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fragment {
    /// The m/z
    pub mz: f64,
    /// The intensity, only present in empirical assays
    pub intensity: Option<f64>,
    /// The fragment type, eg `b`, `y`, `Y`
    pub fragment_type: Option<String>,
    /// The ordinal of backbone fragments
    pub number: Option<u32>,
    /// The charge
    pub charge: Option<u32>,
    /// The neutral loss, `noloss` if there is none
    pub loss_type: Option<String>,
    /// The glycan fragment name, only for glycan fragments
    pub glycan: Option<String>,
    /// The full annotation, eg `b3^+1` or `Y-H(1)N(2)^+2`
    pub annotation: Option<String>,
    /// Any additional columns
    pub extra: BTreeMap<String, Value>,
}

impl Fragment {
    /// A fragment without any annotation
    pub fn new(mz: f64) -> Self {
        Self {
            mz,
            ..Self::default()
        }
    }

    /// Set the intensity
    #[must_use]
    pub fn intensity(self, intensity: f64) -> Self {
        Self {
            intensity: Some(intensity),
            ..self
        }
    }
}

#[derive(Deserialize)]
struct UncheckedFragments {
    #[serde(rename = "fragmentMZ")]
    mz: Vec<f64>,
    #[serde(rename = "fragmentIntensity", default)]
    intensity: Option<Vec<f64>>,
    #[serde(rename = "fragmentType", default)]
    fragment_type: Option<Vec<Option<String>>>,
    #[serde(rename = "fragmentNumber", default)]
    number: Option<Vec<Option<u32>>>,
    #[serde(rename = "fragmentCharge", default)]
    charge: Option<Vec<Option<u32>>>,
    #[serde(rename = "fragmentLossType", default)]
    loss_type: Option<Vec<Option<String>>>,
    #[serde(rename = "fragmentGlycan", default)]
    glycan: Option<Vec<Option<String>>>,
    #[serde(rename = "fragmentAnnotation", default)]
    annotation: Option<Vec<Option<String>>>,
    #[serde(flatten)]
    extra: BTreeMap<String, Vec<Value>>,
}

impl TryFrom<UncheckedFragments> for Fragments {
    type Error = GlycoError;
    /// Missing annotation columns are filled with `None`.
    fn try_from(value: UncheckedFragments) -> Result<Self, Self::Error> {
        let len = value.mz.len();
        let fragments = Self {
            mz: value.mz,
            intensity: value.intensity,
            fragment_type: value.fragment_type.unwrap_or_else(|| vec![None; len]),
            number: value.number.unwrap_or_else(|| vec![None; len]),
            charge: value.charge.unwrap_or_else(|| vec![None; len]),
            loss_type: value.loss_type.unwrap_or_else(|| vec![None; len]),
            glycan: value.glycan.unwrap_or_else(|| vec![None; len]),
            annotation: value.annotation.unwrap_or_else(|| vec![None; len]),
            extra: value.extra,
        };
        fragments.validate()?;
        Ok(fragments)
    }
}

macro_rules! column {
    ($name:ident, $name_mut:ident, $t:ty, $doc:literal) => {
        #[doc = concat!("The ", $doc, " column")]
        pub fn $name(&self) -> &[Option<$t>] {
            &self.$name
        }
        #[doc = concat!("The ", $doc, " column, mutable")]
        pub fn $name_mut(&mut self) -> &mut [Option<$t>] {
            &mut self.$name
        }
    };
}

impl Fragments {
    /// Create unannotated fragments from only m/z values
    pub fn new(mz: Vec<f64>) -> Self {
        let len = mz.len();
        Self {
            mz,
            intensity: None,
            fragment_type: vec![None; len],
            number: vec![None; len],
            charge: vec![None; len],
            loss_type: vec![None; len],
            glycan: vec![None; len],
            annotation: vec![None; len],
            extra: BTreeMap::new(),
        }
    }

    /// Create unannotated fragments from m/z and intensity values
    /// # Errors
    /// If the two lists have a different length.
    pub fn with_intensity(mz: Vec<f64>, intensity: Vec<f64>) -> Result<Self, GlycoError> {
        let mut fragments = Self::new(mz);
        fragments.set_intensity(Some(intensity))?;
        Ok(fragments)
    }

    /// Create fragments from individual rows
    /// # Errors
    /// If the rows are not consistent, see [`Self::push`].
    pub fn from_rows(rows: impl IntoIterator<Item = Fragment>) -> Result<Self, GlycoError> {
        let mut fragments = Self::default();
        for row in rows {
            fragments.push(row)?;
        }
        Ok(fragments)
    }

    /// Check that all columns have the same length.
    /// # Errors
    /// If any column differs in length from the m/z column.
    pub fn validate(&self) -> Result<(), GlycoError> {
        let len = self.mz.len();
        let lengths = [
            ("fragmentIntensity", self.intensity.as_ref().map(Vec::len)),
            ("fragmentType", Some(self.fragment_type.len())),
            ("fragmentNumber", Some(self.number.len())),
            ("fragmentCharge", Some(self.charge.len())),
            ("fragmentLossType", Some(self.loss_type.len())),
            ("fragmentGlycan", Some(self.glycan.len())),
            ("fragmentAnnotation", Some(self.annotation.len())),
        ];
        for (name, other) in lengths
            .into_iter()
            .filter_map(|(name, l)| l.map(|l| (name, l)))
            .chain(self.extra.iter().map(|(name, c)| (name.as_str(), c.len())))
        {
            if other != len {
                return Err(BoxedError::new(
                    GlycoErrorKind::InconsistentFragments,
                    "Inconsistent fragments",
                    format!("The column '{name}' has {other} values while there are {len} fragments"),
                    Context::show(name.to_string()),
                ));
            }
        }
        Ok(())
    }

    /// The number of fragments
    pub fn len(&self) -> usize {
        self.mz.len()
    }

    /// Check if there are no fragments
    pub fn is_empty(&self) -> bool {
        self.mz.is_empty()
    }

    /// The m/z column
    pub fn mz(&self) -> &[f64] {
        &self.mz
    }

    /// The m/z column, mutable
    pub fn mz_mut(&mut self) -> &mut [f64] {
        &mut self.mz
    }

    /// The intensity column, if present
    pub fn intensity(&self) -> Option<&[f64]> {
        self.intensity.as_deref()
    }

    /// The intensity column, mutable
    pub fn intensity_mut(&mut self) -> Option<&mut [f64]> {
        self.intensity.as_deref_mut()
    }

    /// Set or remove the intensity column.
    /// # Errors
    /// If the new column has the wrong length.
    pub fn set_intensity(&mut self, intensity: Option<Vec<f64>>) -> Result<(), GlycoError> {
        if let Some(column) = &intensity {
            self.check_length("fragmentIntensity", column.len())?;
        }
        self.intensity = intensity;
        Ok(())
    }

    column!(fragment_type, fragment_type_mut, String, "fragment type");
    column!(number, number_mut, u32, "fragment number");
    column!(charge, charge_mut, u32, "fragment charge");
    column!(loss_type, loss_type_mut, String, "fragment loss type");
    column!(glycan, glycan_mut, String, "glycan fragment name");
    column!(annotation, annotation_mut, String, "fragment annotation");

    /// An additional column
    pub fn extra(&self, name: &str) -> Option<&[Value]> {
        self.extra.get(name).map(Vec::as_slice)
    }

    /// An additional column, mutable
    pub fn extra_mut(&mut self, name: &str) -> Option<&mut [Value]> {
        self.extra.get_mut(name).map(Vec::as_mut_slice)
    }

    /// The names of all additional columns
    pub fn extra_columns(&self) -> impl Iterator<Item = &str> {
        self.extra.keys().map(String::as_str)
    }

    /// Add or replace an additional column.
    /// # Errors
    /// If the column has the wrong length.
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        column: Vec<Value>,
    ) -> Result<(), GlycoError> {
        let name = name.into();
        self.check_length(&name, column.len())?;
        self.extra.insert(name, column);
        Ok(())
    }

    /// Remove an additional column
    pub fn remove_column(&mut self, name: &str) -> Option<Vec<Value>> {
        self.extra.remove(name)
    }

    fn check_length(&self, name: &str, length: usize) -> Result<(), GlycoError> {
        if length == self.len() {
            Ok(())
        } else {
            Err(BoxedError::new(
                GlycoErrorKind::InconsistentFragments,
                "Inconsistent fragments",
                format!(
                    "The column '{name}' has {length} values while there are {} fragments",
                    self.len()
                ),
                Context::show(name.to_string()),
            ))
        }
    }

    /// Add a fragment at the end. The first fragment decides if there is an intensity column,
    /// all later fragments have to follow that. Additional values that have no column yet
    /// start a new column that is `null` for all earlier fragments, columns that are not
    /// given a value get `null`.
    /// # Errors
    /// If the presence of the intensity does not match the intensity column.
    pub fn push(&mut self, fragment: Fragment) -> Result<(), GlycoError> {
        let len = self.len();
        match (&mut self.intensity, fragment.intensity) {
            (Some(column), Some(intensity)) => column.push(intensity),
            (None, Some(intensity)) if len == 0 => self.intensity = Some(vec![intensity]),
            (None, None) => (),
            (Some(_), None) | (None, Some(_)) => {
                return Err(BoxedError::small(
                    GlycoErrorKind::InconsistentFragments,
                    "Inconsistent fragments",
                    "A fragment has to have an intensity exactly when the other fragments have one",
                ));
            }
        }
        self.mz.push(fragment.mz);
        self.fragment_type.push(fragment.fragment_type);
        self.number.push(fragment.number);
        self.charge.push(fragment.charge);
        self.loss_type.push(fragment.loss_type);
        self.glycan.push(fragment.glycan);
        self.annotation.push(fragment.annotation);
        let mut values = fragment.extra;
        for (name, column) in &mut self.extra {
            column.push(values.remove(name).unwrap_or(Value::Null));
        }
        for (name, value) in values {
            let mut column = vec![Value::Null; len];
            column.push(value);
            self.extra.insert(name, column);
        }
        Ok(())
    }

    /// Add all fragments from another set at the end, with the same rules as [`Self::push`].
    /// Nothing is added if the sets cannot be combined.
    /// # Errors
    /// If the presence of intensities differs between the two sets.
    pub fn extend(&mut self, other: Self) -> Result<(), GlycoError> {
        if !self.is_empty()
            && !other.is_empty()
            && self.intensity.is_some() != other.intensity.is_some()
        {
            return Err(BoxedError::small(
                GlycoErrorKind::InconsistentFragments,
                "Inconsistent fragments",
                "Fragments can only be combined if both sets have intensities or neither has",
            ));
        }
        for row in other {
            self.push(row)?;
        }
        Ok(())
    }

    /// Get a single fragment
    pub fn get(&self, index: usize) -> Option<Fragment> {
        (index < self.len()).then(|| Fragment {
            mz: self.mz[index],
            intensity: self.intensity.as_ref().map(|i| i[index]),
            fragment_type: self.fragment_type[index].clone(),
            number: self.number[index],
            charge: self.charge[index],
            loss_type: self.loss_type[index].clone(),
            glycan: self.glycan[index].clone(),
            annotation: self.annotation[index].clone(),
            extra: self
                .extra
                .iter()
                .map(|(name, column)| (name.clone(), column[index].clone()))
                .collect(),
        })
    }

    /// Iterate over all fragments
    pub fn iter(&self) -> impl Iterator<Item = Fragment> + '_ {
        (0..self.len()).filter_map(|index| self.get(index))
    }

    /// Select the fragments at the given indices, in the given order. Selecting `b` from the
    /// result of selecting `a` is the same as selecting `b.map(|k| a[k])` directly.
    /// # Panics
    /// If any index is out of bounds.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        fn pick<T: Clone>(column: &[T], indices: &[usize]) -> Vec<T> {
            indices.iter().map(|&i| column[i].clone()).collect()
        }
        Self {
            mz: pick(&self.mz, indices),
            intensity: self.intensity.as_ref().map(|c| pick(c, indices)),
            fragment_type: pick(&self.fragment_type, indices),
            number: pick(&self.number, indices),
            charge: pick(&self.charge, indices),
            loss_type: pick(&self.loss_type, indices),
            glycan: pick(&self.glycan, indices),
            annotation: pick(&self.annotation, indices),
            extra: self
                .extra
                .iter()
                .map(|(name, column)| (name.clone(), pick(column, indices)))
                .collect(),
        }
    }
}

impl IntoIterator for Fragments {
    type Item = Fragment;
    type IntoIter = std::vec::IntoIter<Fragment>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter().collect::<Vec<_>>().into_iter()
    }
}

impl PeakList for Fragments {
    fn peak_mz(&self) -> &[f64] {
        &self.mz
    }
    fn peak_intensity(&self) -> Option<&[f64]> {
        self.intensity.as_deref()
    }
}
