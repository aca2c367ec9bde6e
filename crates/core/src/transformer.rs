//! Observation value transformers.
//!
//! Some observations carry codes from the sending system that must be translated into the
//! codes the dossier expects (the placenta location, for instance). A [`ValueTransformer`] is
//! handed the kind of value and the value itself and returns the value to store.

use serde::Deserialize;
use std::collections::HashMap;

/// Remaps observation values of a given kind.
pub trait ValueTransformer: std::fmt::Debug {
    fn transform(&self, transformation_type: &str, value: &str) -> String;
}

/// Returns every value unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityTransformer;

impl ValueTransformer for IdentityTransformer {
    fn transform(&self, _transformation_type: &str, value: &str) -> String {
        value.to_string()
    }
}

/// Value mappings: transformation type → source value → replacement.
///
/// Deserializes from YAML such as:
///
/// ```yaml
/// placentaloc:
///   anterior wall: voorwand
///   posterior-wall: achterwand
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ValueMappings(HashMap<String, HashMap<String, String>>);

impl ValueMappings {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T, V> FromIterator<(T, V)> for ValueMappings
where
    T: Into<String>,
    V: IntoIterator<Item = (String, String)>,
{
    fn from_iter<I: IntoIterator<Item = (T, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(kind, values)| (kind.into(), values.into_iter().collect()))
                .collect(),
        )
    }
}

/// Looks values up in a mapping table; unmapped types and values pass through unchanged.
///
/// Types and values are compared case-insensitively, with spaces and hyphens treated as
/// underscores. Table keys are normalised once, on construction.
#[derive(Clone, Debug, Default)]
pub struct MappingTransformer {
    mappings: HashMap<String, HashMap<String, String>>,
}

impl MappingTransformer {
    pub fn new(mappings: ValueMappings) -> Self {
        let mappings = mappings
            .0
            .into_iter()
            .map(|(kind, values)| {
                let values = values
                    .into_iter()
                    .map(|(from, to)| (normalise_key(&from), to))
                    .collect();
                (normalise_key(&kind), values)
            })
            .collect();
        Self { mappings }
    }
}

impl ValueTransformer for MappingTransformer {
    fn transform(&self, transformation_type: &str, value: &str) -> String {
        self.mappings
            .get(&normalise_key(transformation_type))
            .and_then(|values| values.get(&normalise_key(value)))
            .cloned()
            .unwrap_or_else(|| value.to_string())
    }
}

fn normalise_key(key: &str) -> String {
    key.to_lowercase().replace([' ', '-'], "_")
}
