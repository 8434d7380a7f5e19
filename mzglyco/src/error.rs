//! The [`GlycoErrorKind`] which makes it easy for downstream users of the error type to match on the exact error.

use context_error::{BoxedError, ErrorKind};

/// The error type used throughout this crate and `mzassay`.
pub type GlycoError = BoxedError<'static, GlycoErrorKind>;

/// All kinds of errors that can be raised while building, matching, filtering, or decoying assays.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum GlycoErrorKind {
    /// A setting was given an unsupported value (tolerance unit, match criteria, policy, etc)
    #[default]
    InvalidConfiguration,
    /// A glycan fragment name did not follow any of the supported forms
    InvalidFragmentName,
    /// A modification could not be parsed or does not fit the sequence
    InvalidModification,
    /// The fragment columns of an assay have differing lengths
    InconsistentFragments,
    /// A fragment could not be found in the fragments generated by the mass calculator
    FragmentNotFound,
    /// A fragment type is not part of the known vocabulary
    UnknownFragmentType,
    /// A randomised search ran out of attempts
    MaxAttempts,
    /// The mass calculator could not handle the request
    MassCalculator,
    /// Settings could not be read from JSON
    InvalidJson,
}

impl ErrorKind for GlycoErrorKind {
    type Settings = ();
    fn descriptor(&self) -> &'static str {
        "error"
    }
    fn ignored(&self, _settings: Self::Settings) -> bool {
        false
    }
    fn is_error(&self, _settings: Self::Settings) -> bool {
        true
    }
}
