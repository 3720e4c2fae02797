//! Organization type catalog
//!
//! This module defines the organization archetypes available in the platform
//! (family practice, hospital, laboratory, ...) and the feature constraints
//! associated with each type. The built-in catalog is constructed once per
//! process and never mutated; deployments may replace it with a JSON catalog
//! (see [`OrgConfig`](crate::config::OrgConfig)).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::error::{OrgError, OrgResult};
use crate::features::{keys, FeatureKey, FeatureMap};

/// Metadata and feature constraints for one organization type.
///
/// `required_features` are expected to default to `true` in
/// `default_features`, but nothing enforces it here; use
/// [`OrganizationTypeCatalog::inconsistencies`] to find entries that break
/// the expectation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationTypeDefinition {
    /// Unique type key (e.g. "hospital")
    pub id: String,

    /// Display name
    pub name: String,

    /// Display description
    pub description: String,

    /// Grouping tag (e.g. "Primary Care"), no behavioral effect
    pub category: String,

    /// Feature map assigned to organizations of this type at creation
    #[serde(default)]
    pub default_features: FeatureMap,

    /// Features that must stay enabled
    #[serde(default)]
    pub required_features: Vec<FeatureKey>,

    /// Features eligible for bulk enable
    #[serde(default)]
    pub optional_features: Vec<FeatureKey>,

    /// Compliance regimes that apply (e.g. "HIPAA", "CLIA")
    #[serde(default)]
    pub compliance: Vec<String>,
}

impl OrganizationTypeDefinition {
    /// Check if a feature is in the required set.
    pub fn is_required(&self, key: &str) -> bool {
        self.required_features.iter().any(|k| k.as_str() == key)
    }

    /// Check if a feature is in the optional set.
    pub fn is_optional(&self, key: &str) -> bool {
        self.optional_features.iter().any(|k| k.as_str() == key)
    }
}

/// One category and its types, in catalog declaration order.
#[derive(Debug, Clone)]
pub struct CategoryGroup<'a> {
    /// Category name
    pub category: &'a str,

    /// Types in this category
    pub types: Vec<&'a OrganizationTypeDefinition>,
}

/// A required feature that the type's default map does not enable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogInconsistency {
    /// Type that declares the requirement
    pub type_id: String,

    /// Required feature
    pub feature: FeatureKey,

    /// Its default value, `None` when the default map omits it
    pub default: Option<bool>,
}

/// Read-only registry of organization types.
///
/// # Examples
///
/// ```
/// use practice_org::OrganizationTypeCatalog;
///
/// let catalog = OrganizationTypeCatalog::builtin();
/// let hospital = catalog.get_type("hospital").unwrap();
/// assert_eq!(hospital.category, "Acute Care");
///
/// assert!(catalog.get_type("not_a_real_type").is_none());
/// assert!(catalog.default_features("not_a_real_type").is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct OrganizationTypeCatalog {
    types: Vec<OrganizationTypeDefinition>,
    index: HashMap<String, usize>,
}

impl OrganizationTypeCatalog {
    /// Build a catalog from definitions in declaration order.
    ///
    /// # Errors
    ///
    /// `OrgError::DuplicateType` if two definitions share an id.
    pub fn new(types: Vec<OrganizationTypeDefinition>) -> OrgResult<Self> {
        let mut index = HashMap::with_capacity(types.len());
        for (position, definition) in types.iter().enumerate() {
            if index.insert(definition.id.clone(), position).is_some() {
                return Err(OrgError::DuplicateType(definition.id.clone()));
            }
        }
        Ok(Self { types, index })
    }

    /// The built-in catalog, constructed on first use.
    pub fn builtin() -> &'static OrganizationTypeCatalog {
        static BUILTIN: OnceLock<OrganizationTypeCatalog> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            let types = builtin_types();
            let index = types
                .iter()
                .enumerate()
                .map(|(position, definition)| (definition.id.clone(), position))
                .collect();
            OrganizationTypeCatalog { types, index }
        })
    }

    /// Parse a catalog from a JSON array of type definitions.
    pub fn from_json(json: &str) -> OrgResult<Self> {
        let types: Vec<OrganizationTypeDefinition> = serde_json::from_str(json)
            .map_err(|e| OrgError::Catalog(format!("invalid catalog JSON: {e}")))?;
        Self::new(types)
    }

    /// Read a catalog from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> OrgResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| OrgError::Catalog(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Look up a type. Unknown ids are an expected outcome, not an error.
    pub fn get_type(&self, type_id: &str) -> Option<&OrganizationTypeDefinition> {
        self.index.get(type_id).map(|&position| &self.types[position])
    }

    /// Check if the catalog declares a type.
    pub fn contains(&self, type_id: &str) -> bool {
        self.index.contains_key(type_id)
    }

    /// Feature map for a new organization of this type.
    ///
    /// Returns an empty map (every feature disabled) for an unknown type.
    pub fn default_features(&self, type_id: &str) -> FeatureMap {
        self.get_type(type_id)
            .map(|definition| definition.default_features.clone())
            .unwrap_or_default()
    }

    /// All types in declaration order.
    pub fn types(&self) -> impl Iterator<Item = &OrganizationTypeDefinition> {
        self.types.iter()
    }

    /// Number of types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Group types by category.
    ///
    /// Categories appear in order of their first type; types keep
    /// declaration order within a category.
    pub fn list_by_category(&self) -> Vec<CategoryGroup<'_>> {
        let mut groups: Vec<CategoryGroup<'_>> = Vec::new();
        for definition in &self.types {
            match groups
                .iter_mut()
                .find(|group| group.category == definition.category)
            {
                Some(group) => group.types.push(definition),
                None => groups.push(CategoryGroup {
                    category: &definition.category,
                    types: vec![definition],
                }),
            }
        }
        groups
    }

    /// Required features that a type's defaults do not enable.
    ///
    /// A non-empty result means freshly created organizations of the listed
    /// types fail validation.
    pub fn inconsistencies(&self) -> Vec<CatalogInconsistency> {
        self.types
            .iter()
            .flat_map(|definition| {
                definition
                    .required_features
                    .iter()
                    .filter(|key| !definition.default_features.is_enabled(key.as_str()))
                    .map(|key| CatalogInconsistency {
                        type_id: definition.id.clone(),
                        feature: key.clone(),
                        default: definition.default_features.get(key.as_str()),
                    })
            })
            .collect()
    }
}

#[allow(clippy::too_many_arguments)]
fn definition(
    id: &str,
    name: &str,
    description: &str,
    category: &str,
    defaults: &[(&'static str, bool)],
    required: &[&'static str],
    optional: &[&'static str],
    compliance: &[&str],
) -> OrganizationTypeDefinition {
    OrganizationTypeDefinition {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        default_features: defaults
            .iter()
            .map(|&(key, enabled)| (FeatureKey::from_static(key), enabled))
            .collect(),
        required_features: required.iter().map(|&k| FeatureKey::from_static(k)).collect(),
        optional_features: optional.iter().map(|&k| FeatureKey::from_static(k)).collect(),
        compliance: compliance.iter().map(|c| c.to_string()).collect(),
    }
}

fn builtin_types() -> Vec<OrganizationTypeDefinition> {
    vec![
        definition(
            "family_practice",
            "Family Practice",
            "Comprehensive primary care for patients of all ages",
            "Primary Care",
            &[
                (keys::PATIENT_MANAGEMENT, true),
                (keys::APPOINTMENTS, true),
                (keys::VISITS, true),
                (keys::PRESCRIPTIONS, true),
                (keys::LAB_RESULTS, true),
                (keys::BILLING, true),
                (keys::PATIENT_PORTAL, true),
                (keys::BASIC_REPORTING, true),
                (keys::ADVANCED_LAB_INTEGRATION, false),
                (keys::INVENTORY, false),
                (keys::USER_MANAGEMENT, false),
            ],
            &[
                keys::PATIENT_MANAGEMENT,
                keys::APPOINTMENTS,
                keys::VISITS,
                keys::PRESCRIPTIONS,
            ],
            &[
                keys::ADVANCED_LAB_INTEGRATION,
                keys::INVENTORY,
                keys::USER_MANAGEMENT,
            ],
            &["HIPAA"],
        ),
        definition(
            "clinic",
            "Outpatient Clinic",
            "Walk-in and scheduled outpatient care",
            "Primary Care",
            &[
                (keys::PATIENT_MANAGEMENT, true),
                (keys::APPOINTMENTS, true),
                (keys::VISITS, true),
                (keys::PRESCRIPTIONS, true),
                (keys::BILLING, true),
                (keys::BASIC_REPORTING, true),
                (keys::LAB_RESULTS, false),
                (keys::TELEMEDICINE, false),
                (keys::INSURANCE_CLAIMS, false),
            ],
            &[keys::PATIENT_MANAGEMENT, keys::APPOINTMENTS, keys::VISITS],
            &[keys::LAB_RESULTS, keys::TELEMEDICINE, keys::INSURANCE_CLAIMS],
            &["HIPAA"],
        ),
        definition(
            "pediatric_practice",
            "Pediatric Practice",
            "Primary care for infants, children and adolescents",
            "Primary Care",
            &[
                (keys::PATIENT_MANAGEMENT, true),
                (keys::APPOINTMENTS, true),
                (keys::VISITS, true),
                (keys::IMMUNIZATION_TRACKING, true),
                (keys::PRESCRIPTIONS, true),
                (keys::BILLING, true),
                (keys::PATIENT_PORTAL, false),
                (keys::TELEMEDICINE, false),
                (keys::LAB_RESULTS, false),
            ],
            &[
                keys::PATIENT_MANAGEMENT,
                keys::APPOINTMENTS,
                keys::VISITS,
                keys::IMMUNIZATION_TRACKING,
            ],
            &[keys::PATIENT_PORTAL, keys::TELEMEDICINE, keys::LAB_RESULTS],
            &["HIPAA", "COPPA"],
        ),
        definition(
            "specialty_clinic",
            "Specialty Clinic",
            "Referral-based specialist care such as cardiology or dermatology",
            "Specialty Care",
            &[
                (keys::PATIENT_MANAGEMENT, true),
                (keys::APPOINTMENTS, true),
                (keys::VISITS, true),
                (keys::REFERRALS, true),
                (keys::PRESCRIPTIONS, true),
                (keys::BILLING, true),
                (keys::INSURANCE_CLAIMS, true),
                (keys::IMAGING, false),
                (keys::ADVANCED_LAB_INTEGRATION, false),
                (keys::TELEMEDICINE, false),
            ],
            &[keys::PATIENT_MANAGEMENT, keys::APPOINTMENTS, keys::REFERRALS],
            &[
                keys::IMAGING,
                keys::ADVANCED_LAB_INTEGRATION,
                keys::TELEMEDICINE,
            ],
            &["HIPAA"],
        ),
        definition(
            "hospital",
            "Hospital",
            "Inpatient and emergency care across multiple departments",
            "Acute Care",
            &[
                (keys::PATIENT_MANAGEMENT, true),
                (keys::DEPARTMENT_MANAGEMENT, true),
                (keys::USER_MANAGEMENT, true),
                (keys::ADVANCED_REPORTING, true),
                (keys::APPOINTMENTS, true),
                (keys::VISITS, true),
                (keys::PRESCRIPTIONS, true),
                (keys::LAB_RESULTS, true),
                (keys::BILLING, true),
                (keys::INSURANCE_CLAIMS, true),
                (keys::PHARMACY, false),
                (keys::INVENTORY, false),
                (keys::IMAGING, false),
                (keys::EMERGENCY_SERVICES, false),
                (keys::MULTI_LOCATION, false),
            ],
            &[
                keys::PATIENT_MANAGEMENT,
                keys::DEPARTMENT_MANAGEMENT,
                keys::USER_MANAGEMENT,
                keys::ADVANCED_REPORTING,
            ],
            &[
                keys::PHARMACY,
                keys::INVENTORY,
                keys::IMAGING,
                keys::EMERGENCY_SERVICES,
                keys::MULTI_LOCATION,
            ],
            &["HIPAA", "Joint Commission"],
        ),
        definition(
            "urgent_care",
            "Urgent Care Center",
            "Same-day treatment for non-life-threatening conditions",
            "Acute Care",
            &[
                (keys::PATIENT_MANAGEMENT, true),
                (keys::VISITS, true),
                (keys::PRESCRIPTIONS, true),
                (keys::BILLING, true),
                (keys::BASIC_REPORTING, true),
                (keys::LAB_RESULTS, false),
                (keys::IMAGING, false),
                (keys::TELEMEDICINE, false),
            ],
            &[keys::PATIENT_MANAGEMENT, keys::VISITS, keys::PRESCRIPTIONS],
            &[keys::LAB_RESULTS, keys::IMAGING, keys::TELEMEDICINE],
            &["HIPAA"],
        ),
        definition(
            "laboratory",
            "Clinical Laboratory",
            "Diagnostic testing and specimen processing",
            "Diagnostics",
            &[
                (keys::PATIENT_MANAGEMENT, true),
                (keys::LAB_TEST_MANAGEMENT, true),
                (keys::SAMPLE_TRACKING, true),
                (keys::QUALITY_CONTROL, true),
                (keys::LAB_RESULTS, true),
                (keys::ADVANCED_LAB_INTEGRATION, false),
                (keys::BILLING, false),
                (keys::PATIENT_PORTAL, false),
            ],
            &[
                keys::LAB_TEST_MANAGEMENT,
                keys::SAMPLE_TRACKING,
                keys::QUALITY_CONTROL,
            ],
            &[
                keys::ADVANCED_LAB_INTEGRATION,
                keys::BILLING,
                keys::PATIENT_PORTAL,
            ],
            &["HIPAA", "CLIA", "CAP"],
        ),
        definition(
            "imaging_center",
            "Imaging Center",
            "Radiology and diagnostic imaging services",
            "Diagnostics",
            &[
                (keys::PATIENT_MANAGEMENT, true),
                (keys::IMAGING, true),
                (keys::APPOINTMENTS, true),
                (keys::BASIC_REPORTING, true),
                (keys::ADVANCED_REPORTING, false),
                (keys::BILLING, false),
                (keys::PATIENT_PORTAL, false),
            ],
            &[keys::PATIENT_MANAGEMENT, keys::IMAGING, keys::APPOINTMENTS],
            &[keys::ADVANCED_REPORTING, keys::BILLING, keys::PATIENT_PORTAL],
            &["HIPAA", "ACR"],
        ),
        definition(
            "pharmacy",
            "Pharmacy",
            "Retail or outpatient pharmacy dispensing prescriptions",
            "Pharmacy",
            &[
                (keys::PATIENT_MANAGEMENT, true),
                (keys::PHARMACY, true),
                (keys::INVENTORY, true),
                (keys::PRESCRIPTIONS, true),
                (keys::BILLING, false),
                (keys::INSURANCE_CLAIMS, false),
                (keys::PATIENT_PORTAL, false),
            ],
            &[keys::PHARMACY, keys::INVENTORY, keys::PRESCRIPTIONS],
            &[keys::BILLING, keys::INSURANCE_CLAIMS, keys::PATIENT_PORTAL],
            &["HIPAA", "DEA"],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_lookup() {
        let catalog = OrganizationTypeCatalog::builtin();
        assert_eq!(catalog.len(), 9);

        let hospital = catalog.get_type("hospital").unwrap();
        assert_eq!(hospital.name, "Hospital");
        let required: Vec<&str> = hospital.required_features.iter().map(FeatureKey::as_str).collect();
        assert_eq!(
            required,
            vec![
                "patientManagement",
                "departmentManagement",
                "userManagement",
                "advancedReporting"
            ]
        );
    }

    #[test]
    fn test_unknown_type_has_no_defaults() {
        let catalog = OrganizationTypeCatalog::builtin();
        assert!(catalog.get_type("not_a_real_type").is_none());
        assert_eq!(catalog.default_features("not_a_real_type"), FeatureMap::new());
    }

    #[test]
    fn test_list_by_category_keeps_declaration_order() {
        let catalog = OrganizationTypeCatalog::builtin();
        let groups = catalog.list_by_category();

        let categories: Vec<&str> = groups.iter().map(|g| g.category).collect();
        assert_eq!(
            categories,
            vec![
                "Primary Care",
                "Specialty Care",
                "Acute Care",
                "Diagnostics",
                "Pharmacy"
            ]
        );

        let primary: Vec<&str> = groups[0].types.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(primary, vec!["family_practice", "clinic", "pediatric_practice"]);
    }

    #[test]
    fn test_builtin_catalog_is_consistent() {
        assert!(OrganizationTypeCatalog::builtin().inconsistencies().is_empty());
    }

    #[test]
    fn test_inconsistency_is_reported_not_fixed() {
        let broken = definition(
            "broken",
            "Broken",
            "Requires a feature it does not enable",
            "Test",
            &[(keys::BILLING, false)],
            &[keys::BILLING, keys::PHARMACY],
            &[],
            &[],
        );
        let catalog = OrganizationTypeCatalog::new(vec![broken]).unwrap();

        let found = catalog.inconsistencies();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].feature.as_str(), "billing");
        assert_eq!(found[0].default, Some(false));
        assert_eq!(found[1].feature.as_str(), "pharmacy");
        assert_eq!(found[1].default, None);

        // defaults are returned as declared
        assert!(!catalog.default_features("broken").is_enabled("billing"));
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let a = definition("clinic", "A", "", "X", &[], &[], &[], &[]);
        let b = definition("clinic", "B", "", "X", &[], &[], &[], &[]);
        let err = OrganizationTypeCatalog::new(vec![a, b]).unwrap_err();
        assert!(matches!(err, OrgError::DuplicateType(id) if id == "clinic"));
    }

    #[test]
    fn test_catalog_from_json() {
        let json = r#"[
            {
                "id": "dental",
                "name": "Dental Office",
                "description": "General dentistry",
                "category": "Specialty Care",
                "defaultFeatures": { "patientManagement": true, "billing": false },
                "requiredFeatures": ["patientManagement"],
                "optionalFeatures": ["billing"],
                "compliance": ["HIPAA"]
            }
        ]"#;
        let catalog = OrganizationTypeCatalog::from_json(json).unwrap();
        let dental = catalog.get_type("dental").unwrap();
        assert!(dental.is_required("patientManagement"));
        assert!(dental.is_optional("billing"));
        assert!(dental.default_features.is_enabled("patientManagement"));
    }

    #[test]
    fn test_catalog_from_json_rejects_bad_keys() {
        let json = r#"[{"id": "x", "name": "X", "description": "", "category": "X",
                        "requiredFeatures": ["not a key"]}]"#;
        assert!(matches!(
            OrganizationTypeCatalog::from_json(json),
            Err(OrgError::Catalog(_))
        ));
    }
}
