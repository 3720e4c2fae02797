//! Organization configuration.
//!
//! Configuration is resolved once at startup, from environment variables with
//! defaults suitable for local development, and then passed to the code that
//! creates organizations and loads the type catalog.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::catalog::OrganizationTypeCatalog;
use crate::error::{OrgError, OrgResult};
use crate::organization::Organization;

/// Type assigned to new organizations when none is chosen.
pub const DEFAULT_ORGANIZATION_TYPE: &str = "family_practice";

/// Organization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgConfig {
    /// JSON catalog replacing the built-in one.
    pub catalog_path: Option<PathBuf>,

    /// Fail catalog loading when required features are not enabled by default.
    pub strict_catalog: bool,

    /// Organization type used when creating an organization without one.
    pub default_type: String,
}

impl Default for OrgConfig {
    fn default() -> Self {
        Self {
            catalog_path: None,
            strict_catalog: false,
            default_type: DEFAULT_ORGANIZATION_TYPE.to_string(),
        }
    }
}

impl OrgConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PRACTICE_CATALOG_PATH`: JSON catalog override (default: built-in catalog)
    /// - `PRACTICE_STRICT_CATALOG`: reject inconsistent catalogs (default: false)
    /// - `PRACTICE_DEFAULT_TYPE`: type for new organizations (default: family_practice)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            catalog_path: std::env::var("PRACTICE_CATALOG_PATH")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
            strict_catalog: std::env::var("PRACTICE_STRICT_CATALOG")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(default.strict_catalog),
            default_type: std::env::var("PRACTICE_DEFAULT_TYPE")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(default.default_type),
        }
    }

    /// Load the catalog this configuration points at.
    ///
    /// Without an override the built-in catalog is borrowed. Inconsistent
    /// entries are logged, or rejected when `strict_catalog` is set.
    pub fn load_catalog(&self) -> OrgResult<Cow<'static, OrganizationTypeCatalog>> {
        let catalog = match &self.catalog_path {
            Some(path) => {
                let catalog = OrganizationTypeCatalog::from_path(path)?;
                info!(path = %path.display(), types = catalog.len(), "Loaded organization type catalog");
                Cow::Owned(catalog)
            }
            None => Cow::Borrowed(OrganizationTypeCatalog::builtin()),
        };

        let inconsistencies = catalog.inconsistencies();
        if !inconsistencies.is_empty() {
            for found in &inconsistencies {
                warn!(
                    type_id = %found.type_id,
                    feature = %found.feature,
                    default = ?found.default,
                    "Required feature is not enabled by default"
                );
            }
            if self.strict_catalog {
                return Err(OrgError::Catalog(format!(
                    "{} required feature(s) are not enabled by default",
                    inconsistencies.len()
                )));
            }
        }

        self.validate(&catalog)?;
        Ok(catalog)
    }

    /// Check this configuration against a loaded catalog.
    pub fn validate(&self, catalog: &OrganizationTypeCatalog) -> OrgResult<()> {
        if !catalog.contains(&self.default_type) {
            return Err(OrgError::Config {
                key: "PRACTICE_DEFAULT_TYPE".to_string(),
                message: format!("unknown organization type {:?}", self.default_type),
            });
        }
        Ok(())
    }

    /// Create an organization of the configured default type.
    pub fn create_organization(
        &self,
        name: impl Into<String>,
        catalog: &OrganizationTypeCatalog,
    ) -> Organization {
        Organization::create(name, self.default_type.clone(), catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_catalog(name: &str, json: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("practice-org-{}-{name}.json", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(json.as_bytes()).unwrap();
        path
    }

    const INCONSISTENT: &str = r#"[{"id": "family_practice", "name": "Family Practice",
        "description": "", "category": "Primary Care",
        "defaultFeatures": {"patientManagement": false},
        "requiredFeatures": ["patientManagement"]}]"#;

    #[test]
    fn test_default_config() {
        let config = OrgConfig::default();
        assert!(config.catalog_path.is_none());
        assert!(!config.strict_catalog);
        assert_eq!(config.default_type, "family_practice");
    }

    fn clear_env() {
        for var in [
            "PRACTICE_CATALOG_PATH",
            "PRACTICE_STRICT_CATALOG",
            "PRACTICE_DEFAULT_TYPE",
        ] {
            std::env::remove_var(var);
        }
    }

    // Only this test touches the PRACTICE_* variables.
    #[test]
    fn test_from_env() {
        clear_env();
        let config = OrgConfig::from_env();
        assert!(config.catalog_path.is_none());
        assert!(!config.strict_catalog);
        assert_eq!(config.default_type, DEFAULT_ORGANIZATION_TYPE);

        std::env::set_var("PRACTICE_CATALOG_PATH", "/etc/practice/catalog.json");
        std::env::set_var("PRACTICE_STRICT_CATALOG", "true");
        std::env::set_var("PRACTICE_DEFAULT_TYPE", "hospital");
        let config = OrgConfig::from_env();
        assert_eq!(
            config.catalog_path,
            Some(PathBuf::from("/etc/practice/catalog.json"))
        );
        assert!(config.strict_catalog);
        assert_eq!(config.default_type, "hospital");

        std::env::set_var("PRACTICE_STRICT_CATALOG", "1");
        assert!(OrgConfig::from_env().strict_catalog);
        std::env::set_var("PRACTICE_STRICT_CATALOG", "yes");
        assert!(!OrgConfig::from_env().strict_catalog);

        std::env::set_var("PRACTICE_CATALOG_PATH", "  ");
        std::env::set_var("PRACTICE_DEFAULT_TYPE", "");
        let config = OrgConfig::from_env();
        assert!(config.catalog_path.is_none());
        assert_eq!(config.default_type, DEFAULT_ORGANIZATION_TYPE);

        clear_env();
    }

    #[test]
    fn test_load_builtin_catalog() {
        let catalog = OrgConfig::default().load_catalog().unwrap();
        assert!(matches!(catalog, Cow::Borrowed(_)));
        assert!(catalog.contains("hospital"));
    }

    #[test]
    fn test_validate_unknown_default_type() {
        let config = OrgConfig {
            default_type: "spaceship".to_string(),
            ..OrgConfig::default()
        };
        let err = config.validate(OrganizationTypeCatalog::builtin()).unwrap_err();
        assert!(matches!(err, OrgError::Config { ref key, .. } if key == "PRACTICE_DEFAULT_TYPE"));
    }

    #[test]
    fn test_create_organization_uses_default_type() {
        let config = OrgConfig {
            default_type: "urgent_care".to_string(),
            ..OrgConfig::default()
        };
        let catalog = OrganizationTypeCatalog::builtin();
        let org = config.create_organization("Walk-in Care", catalog);
        assert_eq!(org.org_type, "urgent_care");
        assert_eq!(org.features, catalog.default_features("urgent_care"));
    }

    #[test]
    fn test_lenient_catalog_keeps_inconsistent_entries() {
        let path = write_catalog("lenient", INCONSISTENT);
        let config = OrgConfig {
            catalog_path: Some(path.clone()),
            ..OrgConfig::default()
        };
        let catalog = config.load_catalog().unwrap();
        assert_eq!(catalog.inconsistencies().len(), 1);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_strict_catalog_rejects_inconsistent_entries() {
        let path = write_catalog("strict", INCONSISTENT);
        let config = OrgConfig {
            catalog_path: Some(path.clone()),
            strict_catalog: true,
            ..OrgConfig::default()
        };
        assert!(matches!(config.load_catalog(), Err(OrgError::Catalog(_))));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_missing_catalog_file() {
        let config = OrgConfig {
            catalog_path: Some(PathBuf::from("/nonexistent/practice-catalog.json")),
            ..OrgConfig::default()
        };
        assert!(matches!(config.load_catalog(), Err(OrgError::Catalog(_))));
    }
}
