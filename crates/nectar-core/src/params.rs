//! Helpers for building query parameters and parsing `key=value` input.
//!
//! Filter parameters reach managers as plain string pairs; this module
//! reduces the boilerplate of assembling them from optional values and of
//! validating caller-supplied `key=value` strings.

use crate::error::{Error, Result};
use std::fmt::Display;

/// Builder for assembling query parameter pairs.
#[derive(Debug, Default, Clone)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Create a new, empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self { pairs: Vec::new() }
    }

    /// Append a required key/value pair.
    pub fn push<T>(&mut self, key: impl Into<String>, value: T)
    where
        T: Display,
    {
        self.pairs.push((key.into(), value.to_string()));
    }

    /// Append a key/value pair when the value is present.
    pub fn push_opt<T>(&mut self, key: impl Into<String>, value: Option<T>)
    where
        T: Display,
    {
        if let Some(value) = value {
            self.push(key, value);
        }
    }

    /// Return the collected key/value pairs.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }

    /// Returns true if no parameters have been added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Split one `key=value` string at the first delimiter.
///
/// A string without `=` is a user error, surfaced as
/// [`Error::MalformedParameter`] rather than a panic.
pub fn parse_key_value(input: &str) -> Result<(String, String)> {
    match input.split_once('=') {
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => Err(Error::MalformedParameter(input.to_string())),
    }
}

/// Reformat a batch of `key=value` strings into query parameter pairs.
pub fn format_parameters<S: AsRef<str>>(inputs: &[S]) -> Result<Vec<(String, String)>> {
    inputs
        .iter()
        .map(|input| parse_key_value(input.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_opt_skips_none() {
        let mut params = QueryParams::new();
        params.push_opt("zone", Option::<String>::None);
        assert!(params.is_empty());
    }

    #[test]
    fn push_renders_display_values() {
        let mut params = QueryParams::new();
        params.push("allocation", 42);
        params.push_opt("status", Some("A"));
        assert_eq!(
            params.into_pairs(),
            vec![
                ("allocation".to_string(), "42".to_string()),
                ("status".to_string(), "A".to_string()),
            ]
        );
    }

    #[test]
    fn parse_key_value_splits_at_first_delimiter() {
        assert_eq!(
            parse_key_value("resource=compute.cores").unwrap(),
            ("resource".to_string(), "compute.cores".to_string())
        );
        assert_eq!(
            parse_key_value("note=a=b").unwrap(),
            ("note".to_string(), "a=b".to_string())
        );
    }

    #[test]
    fn parse_key_value_rejects_missing_delimiter() {
        let err = parse_key_value("justakey").unwrap_err();
        assert!(matches!(err, Error::MalformedParameter(_)));
    }

    #[test]
    fn format_parameters_stops_at_the_first_malformed_input() {
        let err = format_parameters(&["a=1", "bad"]).unwrap_err();
        assert_eq!(err, Error::MalformedParameter("bad".to_string()));
    }
}
