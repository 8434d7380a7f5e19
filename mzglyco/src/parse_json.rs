use std::{any::type_name, collections::BTreeMap};

use context_error::{BoxedError, Context, CreateError};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{
    error::{GlycoError, GlycoErrorKind},
    matching::{MatchCriteria, MatchingParameters},
    tolerance::Tolerance,
};

/// Load a settings structure from JSON, needed to give errors that point at the offending document.
pub trait ParseJson: Sized {
    /// Parse a JSON value element into this structure
    /// # Errors
    /// If the JSON is not valid to the format
    fn from_json_value(value: Value) -> Result<Self, GlycoError>;

    /// Parse a string containing JSON into this structure
    /// # Errors
    /// If the JSON is not valid to the format
    fn from_json(value: &str) -> Result<Self, GlycoError> {
        let value = serde_json::from_str::<Value>(value).map_err(|err| {
            BoxedError::new(
                GlycoErrorKind::InvalidJson,
                format!("Invalid JSON (for {})", type_name::<Self>()),
                err.to_string(),
                Context::show(value.to_string()),
            )
        })?;
        Self::from_json_value(value)
    }
}

/// Parse a JSON value element into this structure using the serde JSON parser
/// # Errors
/// If the JSON is not valid to the format
#[expect(clippy::needless_pass_by_value)]
pub fn use_serde<T: DeserializeOwned>(value: Value) -> Result<T, GlycoError> {
    serde_json::from_value(value.clone()).map_err(|err| {
        BoxedError::new(
            GlycoErrorKind::InvalidJson,
            format!("Could not parse JSON into {}", type_name::<T>()),
            err.to_string(),
            Context::show(value.to_string()),
        )
    })
}

impl ParseJson for Tolerance {
    /// Accepts both the serde form (`{"Ppm": 20.0}`) and the short text form (`"20 ppm"`).
    fn from_json_value(value: Value) -> Result<Self, GlycoError> {
        if let Value::String(text) = value {
            text.parse()
        } else {
            use_serde(value)
        }
    }
}

impl ParseJson for MatchCriteria {
    fn from_json_value(value: Value) -> Result<Self, GlycoError> {
        if let Value::String(text) = value {
            text.parse()
        } else {
            use_serde(value)
        }
    }
}

impl ParseJson for MatchingParameters {
    /// Next to the serde form this accepts the flat layout `{"tolerance": [20, "ppm"], "criteria": "nearest"}`.
    fn from_json_value(value: Value) -> Result<Self, GlycoError> {
        if let Value::Object(map) = value {
            let mut parameters = Self::default();
            for (key, value) in map {
                match key.as_str() {
                    "tolerance" => {
                        parameters = parameters.tolerance(match value {
                            Value::Array(pair) if pair.len() == 2 => {
                                let amount = pair[0].as_f64().ok_or_else(|| {
                                    BoxedError::new(
                                        GlycoErrorKind::InvalidJson,
                                        "Invalid tolerance",
                                        "The tolerance value has to be a number",
                                        Context::show(pair[0].to_string()),
                                    )
                                })?;
                                let unit = pair[1].as_str().ok_or_else(|| {
                                    BoxedError::new(
                                        GlycoErrorKind::InvalidJson,
                                        "Invalid tolerance",
                                        "The tolerance unit has to be a string",
                                        Context::show(pair[1].to_string()),
                                    )
                                })?;
                                Tolerance::with_unit(amount, unit)?
                            }
                            other => Tolerance::from_json_value(other)?,
                        });
                    }
                    "criteria" => {
                        parameters = parameters.criteria(MatchCriteria::from_json_value(value)?);
                    }
                    other => {
                        return Err(BoxedError::new(
                            GlycoErrorKind::InvalidJson,
                            "Invalid MatchingParameters",
                            format!("The key '{other}' is not a known matching parameter"),
                            Context::show(other.to_string()),
                        ));
                    }
                }
            }
            Ok(parameters)
        } else {
            Err(BoxedError::new(
                GlycoErrorKind::InvalidJson,
                "Invalid MatchingParameters",
                "The JSON value has to be a map",
                Context::show(value.to_string()),
            ))
        }
    }
}

impl<T: ParseJson> ParseJson for Option<T> {
    fn from_json_value(value: Value) -> Result<Self, GlycoError> {
        if value == Value::Null {
            Ok(None)
        } else {
            T::from_json_value(value).map(Some)
        }
    }
}

impl<T: ParseJson> ParseJson for Vec<T> {
    fn from_json_value(value: Value) -> Result<Self, GlycoError> {
        if let Value::Array(arr) = value {
            arr.into_iter()
                .map(|element| T::from_json_value(element))
                .collect()
        } else {
            Err(BoxedError::new(
                GlycoErrorKind::InvalidJson,
                format!("Invalid JSON (for {})", type_name::<Self>()),
                "The JSON value has to be a list",
                Context::show(value.to_string()),
            ))
        }
    }
}

impl<T: ParseJson> ParseJson for BTreeMap<String, T> {
    fn from_json_value(value: Value) -> Result<Self, GlycoError> {
        if let Value::Object(map) = value {
            map.into_iter()
                .map(|(key, value)| T::from_json_value(value).map(|value| (key, value)))
                .collect()
        } else {
            Err(BoxedError::new(
                GlycoErrorKind::InvalidJson,
                format!("Invalid JSON (for {})", type_name::<Self>()),
                "The JSON value has to be a map",
                Context::show(value.to_string()),
            ))
        }
    }
}
