use serde::{Deserialize, Serialize};

/// The class of a fragment type
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum FragmentKind {
    /// A peptide backbone fragment (`b`, `y`, `b-N(1)`, `y$`, ...)
    Peptide,
    /// A glycan fragment (`Y`)
    Glycan,
    /// Anything not in the vocabulary
    Unknown,
}

/// The closed set of fragment types a builder knows about
#[derive(Clone, Debug, Default, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct FragmentVocabulary {
    /// The peptide backbone fragment types
    pub peptide: Vec<String>,
    /// The glycan fragment types
    pub glycan: Vec<String>,
}

impl FragmentVocabulary {
    /// Create a new vocabulary
    pub fn new(
        peptide: impl IntoIterator<Item = impl Into<String>>,
        glycan: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            peptide: peptide.into_iter().map(Into::into).collect(),
            glycan: glycan.into_iter().map(Into::into).collect(),
        }
    }

    /// Classify a fragment type, `None` is always unknown
    pub fn classify(&self, fragment_type: Option<&str>) -> FragmentKind {
        match fragment_type {
            Some(t) if self.peptide.iter().any(|p| p == t) => FragmentKind::Peptide,
            Some(t) if self.glycan.iter().any(|g| g == t) => FragmentKind::Glycan,
            _ => FragmentKind::Unknown,
        }
    }

    /// Check if this type is part of the vocabulary
    pub fn is_known(&self, fragment_type: Option<&str>) -> bool {
        self.classify(fragment_type) != FragmentKind::Unknown
    }

    /// All types, peptide types first
    pub fn all(&self) -> impl Iterator<Item = &str> {
        self.peptide
            .iter()
            .chain(self.glycan.iter())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify() {
        let vocabulary = FragmentVocabulary::new(["b", "y", "y$"], ["Y"]);
        assert_eq!(vocabulary.classify(Some("b")), FragmentKind::Peptide);
        assert_eq!(vocabulary.classify(Some("y$")), FragmentKind::Peptide);
        assert_eq!(vocabulary.classify(Some("Y")), FragmentKind::Glycan);
        assert_eq!(vocabulary.classify(Some("c")), FragmentKind::Unknown);
        assert_eq!(vocabulary.classify(None), FragmentKind::Unknown);
        assert_eq!(vocabulary.all().collect::<Vec<_>>(), ["b", "y", "y$", "Y"]);
    }
}
