//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the observation processor. Environment variables and files are read here, never
//! while a message is being converted.

use crate::constants::RESOURCE_TYPE;
use crate::transformer::{IdentityTransformer, MappingTransformer, ValueMappings, ValueTransformer};
use crate::{DossierError, DossierResult};
use std::path::Path;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    resource_type: String,
    value_mappings: ValueMappings,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(resource_type: String, value_mappings: ValueMappings) -> DossierResult<Self> {
        if resource_type.trim().is_empty() {
            return Err(DossierError::InvalidConfiguration(
                "resource_type cannot be empty".into(),
            ));
        }

        Ok(Self {
            resource_type,
            value_mappings,
        })
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn value_mappings(&self) -> &ValueMappings {
        &self.value_mappings
    }

    /// The transformer for observation values: table-driven when mappings are configured,
    /// identity otherwise.
    pub fn value_transformer(&self) -> Box<dyn ValueTransformer + Send + Sync> {
        if self.value_mappings.is_empty() {
            Box::new(IdentityTransformer)
        } else {
            Box::new(MappingTransformer::new(self.value_mappings.clone()))
        }
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            resource_type: RESOURCE_TYPE.to_string(),
            value_mappings: ValueMappings::default(),
        }
    }
}

/// Load a value mapping table from a YAML file.
///
/// # Errors
///
/// Returns [`DossierError::FileRead`] if the file cannot be read, or
/// [`DossierError::ValueMappings`] if it is not a mapping of mappings of strings.
pub fn load_value_mappings(path: &Path) -> DossierResult<ValueMappings> {
    let yaml = std::fs::read_to_string(path).map_err(DossierError::FileRead)?;
    serde_yaml::from_str(&yaml).map_err(DossierError::ValueMappings)
}

/// Resolve the value mappings from an optional path value.
///
/// If `value` is `None` or empty/whitespace, returns an empty table.
pub fn value_mappings_from_env_value(value: Option<String>) -> DossierResult<ValueMappings> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        Some(path) => load_value_mappings(Path::new(&path)),
        None => Ok(ValueMappings::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_empty_resource_type_is_rejected() {
        let result = CoreConfig::new("  ".into(), ValueMappings::default());
        assert!(matches!(result, Err(DossierError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_default_uses_dossier_resource_type() {
        let config = CoreConfig::default();
        assert_eq!(config.resource_type(), "hub/dossier");
        assert!(config.value_mappings().is_empty());
        assert_eq!(config.value_transformer().transform("placentaloc", "x"), "x");
    }

    #[test]
    fn test_missing_env_value_means_no_mappings() {
        assert!(value_mappings_from_env_value(None).unwrap().is_empty());
        assert!(value_mappings_from_env_value(Some(" ".into()))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_mappings_are_loaded_from_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mappings.yaml");
        fs::write(&path, "placentaloc:\n  anterior: voorwand\n").unwrap();

        let mappings =
            value_mappings_from_env_value(Some(path.display().to_string())).unwrap();
        let config = CoreConfig::new("hub/dossier".into(), mappings).unwrap();

        assert_eq!(
            config.value_transformer().transform("placentaloc", "Anterior"),
            "voorwand"
        );
    }

    #[test]
    fn test_unreadable_mappings_file() {
        let temp = TempDir::new().unwrap();
        let result = load_value_mappings(&temp.path().join("missing.yaml"));
        assert!(matches!(result, Err(DossierError::FileRead(_))));
    }

    #[test]
    fn test_malformed_mappings_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mappings.yaml");
        fs::write(&path, "- just\n- a list\n").unwrap();

        let result = load_value_mappings(&path);

        assert!(matches!(result, Err(DossierError::ValueMappings(_))));
    }
}
