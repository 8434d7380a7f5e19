use std::{fmt::Display, ops::RangeInclusive, str::FromStr};

use context_error::{BoxedError, Context, CreateError};
use serde::{Deserialize, Serialize};

use crate::error::{GlycoError, GlycoErrorKind};

/// A tolerance around a given m/z for searching purposes
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub enum Tolerance {
    /// A relative tolerance, in parts per million
    Ppm(f64),
    /// An absolute tolerance, in Dalton (Thomson for m/z values)
    Da(f64),
}

impl Tolerance {
    /// Create a new ppm tolerance
    pub const fn new_ppm(value: f64) -> Self {
        Self::Ppm(value)
    }

    /// Create a new absolute tolerance
    pub const fn new_absolute(value: f64) -> Self {
        Self::Da(value)
    }

    /// Create a tolerance from a value and a unit as written in settings files (`ppm` or `Da`).
    /// # Errors
    /// If the unit is not one of the two supported units.
    pub fn with_unit(value: f64, unit: &str) -> Result<Self, GlycoError> {
        match unit.trim() {
            "ppm" => Ok(Self::Ppm(value)),
            "Da" | "da" | "Th" => Ok(Self::Da(value)),
            other => Err(BoxedError::new(
                GlycoErrorKind::InvalidConfiguration,
                "Invalid tolerance unit",
                "The tolerance unit has to be 'ppm' or 'Da'",
                Context::show(other.to_string()),
            )),
        }
    }

    /// The inclusive window of values that are accepted around the given m/z.
    pub fn window(self, mz: f64) -> RangeInclusive<f64> {
        match self {
            Self::Ppm(ppm) => mz * ppm.mul_add(-1e-6, 1.0)..=mz * ppm.mul_add(1e-6, 1.0),
            Self::Da(da) => mz - da..=mz + da,
        }
    }

    /// Check if the value is within the window around the reference m/z
    pub fn within(self, reference: f64, value: f64) -> bool {
        self.window(reference).contains(&value)
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::Ppm(20.0)
    }
}

impl Display for Tolerance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ppm(v) => write!(f, "{v} ppm"),
            Self::Da(v) => write!(f, "{v} Da"),
        }
    }
}

impl FromStr for Tolerance {
    type Err = GlycoError;
    /// Parse a tolerance like `20 ppm` or `0.05Da`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_alphabetic())
            .ok_or_else(|| {
                BoxedError::new(
                    GlycoErrorKind::InvalidConfiguration,
                    "Invalid tolerance",
                    "A tolerance needs a unit, either 'ppm' or 'Da'",
                    Context::show(s.to_string()),
                )
            })?;
        let value = s[..split].trim().parse::<f64>().map_err(|err| {
            BoxedError::new(
                GlycoErrorKind::InvalidConfiguration,
                "Invalid tolerance",
                format!("The tolerance value is not a valid number: {err}"),
                Context::show(s.to_string()),
            )
        })?;
        Self::with_unit(value, &s[split..])
    }
}

#[cfg(test)]
#[expect(clippy::missing_panics_doc)]
mod tests {
    use context_error::FullErrorContent;
    use super::*;

    #[test]
    fn ppm_window() {
        let window = Tolerance::Ppm(10.0).window(1000.0);
        assert!((window.start() - 999.99).abs() < 1e-9);
        assert!((window.end() - 1000.01).abs() < 1e-9);
        assert!(Tolerance::Ppm(10.0).within(1000.0, 1000.009));
        assert!(!Tolerance::Ppm(10.0).within(1000.0, 1000.011));
    }

    #[test]
    fn absolute_window() {
        assert_eq!(Tolerance::Da(0.5).window(100.0), 99.5..=100.5);
        assert!(Tolerance::Da(0.5).within(100.0, 100.5));
    }

    #[test]
    fn parse() {
        assert_eq!("20 ppm".parse::<Tolerance>().unwrap(), Tolerance::Ppm(20.0));
        assert_eq!("0.05Da".parse::<Tolerance>().unwrap(), Tolerance::Da(0.05));
        assert!("20".parse::<Tolerance>().is_err());
        let err = Tolerance::with_unit(20.0, "mmu").unwrap_err();
        assert_eq!(*err.get_kind(), GlycoErrorKind::InvalidConfiguration);
    }
}
