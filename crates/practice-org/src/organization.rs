//! Organization domain models
//!
//! This module provides the Organization entity: a tenant of the practice
//! platform with an organization type and exactly one feature map. The
//! creation workflow assigns the type's default features from the catalog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::OrganizationTypeCatalog;
use crate::features::FeatureMap;

/// An organization represents a tenant (a practice, hospital, lab, ...).
///
/// # Examples
///
/// ```
/// use practice_org::{Organization, OrganizationTypeCatalog};
///
/// let catalog = OrganizationTypeCatalog::builtin();
/// let org = Organization::create("Riverside Family Health", "family_practice", catalog);
/// assert_eq!(org.org_type, "family_practice");
/// assert!(org.features.is_enabled("patientManagement"));
/// assert!(org.is_active);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    /// Unique identifier for the organization
    pub id: Uuid,

    /// Human-readable name
    pub name: String,

    /// Organization type id (key into the type catalog)
    #[serde(rename = "type")]
    pub org_type: String,

    /// Persisted feature map
    #[serde(default)]
    pub features: FeatureMap,

    /// Whether the organization is active
    pub is_active: bool,

    /// When the organization was created
    pub created_at: DateTime<Utc>,

    /// When the organization was last updated
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// Creates a new organization with an explicit feature map.
    pub fn new(name: impl Into<String>, org_type: impl Into<String>, features: FeatureMap) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            org_type: org_type.into(),
            features,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Creation workflow: a new organization with its type's default features.
    ///
    /// An unknown type yields an empty feature map, which leaves every
    /// feature disabled.
    pub fn create(
        name: impl Into<String>,
        org_type: impl Into<String>,
        catalog: &OrganizationTypeCatalog,
    ) -> Self {
        let org_type = org_type.into();
        let features = catalog.default_features(&org_type);
        Self::new(name, org_type, features)
    }

    /// Display name of this organization's type, falling back to the raw id.
    pub fn type_name<'a>(&'a self, catalog: &'a OrganizationTypeCatalog) -> &'a str {
        catalog
            .get_type(&self.org_type)
            .map(|definition| definition.name.as_str())
            .unwrap_or(&self.org_type)
    }

    /// Build the list-view projection.
    pub fn summary(&self, catalog: &OrganizationTypeCatalog) -> OrganizationSummary {
        OrganizationSummary {
            id: self.id,
            name: self.name.clone(),
            org_type: self.org_type.clone(),
            type_name: self.type_name(catalog).to_string(),
            enabled_feature_count: self.features.enabled_keys().count(),
            is_active: self.is_active,
        }
    }
}

/// Summary of an organization for list displays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationSummary {
    /// Organization ID
    pub id: Uuid,

    /// Organization name
    pub name: String,

    /// Type id
    #[serde(rename = "type")]
    pub org_type: String,

    /// Type display name
    pub type_name: String,

    /// Number of enabled features
    pub enabled_feature_count: usize,

    /// Whether the organization is active
    pub is_active: bool,
}
