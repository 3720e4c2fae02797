//! Feature resolution
//!
//! [`FeatureResolver`] decides, for an organization type and a feature map,
//! which features are required, optional or merely available, which toggles
//! are locked, and whether the map satisfies the type. It is pure: every call
//! takes the map explicitly and returns a new map instead of mutating state.
//!
//! # Classification
//!
//! - **Required**: in the type's `required_features`; locked on
//! - **Optional**: in `optional_features` and not required; bulk-enable set
//! - **Available**: anything else, including every key of an unknown type
//!
//! Required takes precedence over optional when a key appears in both sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::catalog::{OrganizationTypeCatalog, OrganizationTypeDefinition};
use crate::error::{OrgError, OrgResult};
use crate::features::{FeatureKey, FeatureMap};
use crate::organization::Organization;

/// How a feature relates to an organization type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeatureClass {
    /// Must stay enabled for this type
    Required,

    /// Associated with the type, freely togglable, bulk-enable eligible
    Optional,

    /// Not constrained by the type
    Available,
}

impl FeatureClass {
    /// Badge text shown next to the feature toggle.
    pub fn label(&self) -> &'static str {
        match self {
            FeatureClass::Required => "Required",
            FeatureClass::Optional => "Optional",
            FeatureClass::Available => "Available",
        }
    }

    /// Get string representation of the class.
    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureClass::Required => "required",
            FeatureClass::Optional => "optional",
            FeatureClass::Available => "available",
        }
    }
}

/// Result of a toggle request.
///
/// A rejection is an ordinary outcome; the UI shows `reason` as a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToggleOutcome {
    /// The flag was flipped; `enabled` is its new value
    Applied {
        /// New state of the feature
        enabled: bool,
    },

    /// The flip would disable a required feature; the map is unchanged
    Rejected {
        /// Human-readable reason
        reason: String,
    },
}

impl ToggleOutcome {
    /// Check if the toggle was applied.
    pub fn is_applied(&self) -> bool {
        matches!(self, ToggleOutcome::Applied { .. })
    }

    /// Check if the toggle was rejected.
    pub fn is_rejected(&self) -> bool {
        matches!(self, ToggleOutcome::Rejected { .. })
    }
}

/// One rendered row of the feature settings screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRow {
    /// Feature key
    pub key: FeatureKey,

    /// Current effective state
    pub enabled: bool,

    /// Classification for the organization type
    pub class: FeatureClass,

    /// Whether the toggle control is interactive
    pub can_toggle: bool,
}

impl FeatureRow {
    /// Badge text for the row.
    pub fn label(&self) -> &'static str {
        self.class.label()
    }
}

/// Stateless rule evaluator over an organization type catalog.
///
/// # Examples
///
/// ```
/// use practice_org::{FeatureClass, FeatureKey, FeatureMap, FeatureResolver, ToggleOutcome};
///
/// let resolver = FeatureResolver::builtin();
/// assert_eq!(resolver.classify("hospital", "userManagement"), FeatureClass::Required);
/// assert!(!resolver.can_toggle("hospital", "userManagement"));
///
/// let map = FeatureMap::from_pairs([("inventory", false)]).unwrap();
/// let key = FeatureKey::parse("inventory").unwrap();
/// let (map, outcome) = resolver.toggle(&map, "hospital", &key);
/// assert_eq!(outcome, ToggleOutcome::Applied { enabled: true });
/// assert!(map.is_enabled("inventory"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FeatureResolver<'a> {
    catalog: &'a OrganizationTypeCatalog,
}

impl FeatureResolver<'static> {
    /// Resolver over the built-in catalog.
    pub fn builtin() -> Self {
        Self::new(OrganizationTypeCatalog::builtin())
    }
}

impl<'a> FeatureResolver<'a> {
    /// Creates a resolver over the given catalog.
    pub fn new(catalog: &'a OrganizationTypeCatalog) -> Self {
        Self { catalog }
    }

    /// The catalog this resolver reads.
    pub fn catalog(&self) -> &'a OrganizationTypeCatalog {
        self.catalog
    }

    /// Classify a feature for an organization type.
    ///
    /// Unknown types and unknown keys classify as [`FeatureClass::Available`].
    pub fn classify(&self, type_id: &str, key: &str) -> FeatureClass {
        match self.catalog.get_type(type_id) {
            Some(definition) => classify_in(definition, key),
            None => FeatureClass::Available,
        }
    }

    /// Whether the toggle for this feature is interactive.
    ///
    /// Required features are locked on and never togglable.
    pub fn can_toggle(&self, type_id: &str, key: &str) -> bool {
        self.classify(type_id, key) != FeatureClass::Required
    }

    /// Flip one feature.
    ///
    /// Disabling a required feature is rejected and returns the map
    /// unchanged. Enabling a required feature that is currently off is
    /// allowed.
    pub fn toggle(
        &self,
        map: &FeatureMap,
        type_id: &str,
        key: &FeatureKey,
    ) -> (FeatureMap, ToggleOutcome) {
        let currently_enabled = map.is_enabled(key.as_str());

        if currently_enabled && !self.can_toggle(type_id, key.as_str()) {
            let type_name = self
                .catalog
                .get_type(type_id)
                .map(|definition| definition.name.as_str())
                .unwrap_or(type_id);
            let reason = format!("{key} is required for {type_name} and cannot be disabled");
            tracing::warn!(type_id = %type_id, feature = %key, "Rejected disabling required feature");
            return (map.clone(), ToggleOutcome::Rejected { reason });
        }

        let mut next = map.clone();
        next.set(key.clone(), !currently_enabled);
        tracing::debug!(
            type_id = %type_id,
            feature = %key,
            enabled = !currently_enabled,
            "Toggled feature"
        );
        (
            next,
            ToggleOutcome::Applied {
                enabled: !currently_enabled,
            },
        )
    }

    /// Force every optional feature of the type to `true`.
    ///
    /// Keys outside the optional set are left untouched. Idempotent.
    pub fn enable_all_optional(&self, map: &FeatureMap, type_id: &str) -> FeatureMap {
        let mut next = map.clone();
        if let Some(definition) = self.catalog.get_type(type_id) {
            for key in &definition.optional_features {
                next.set(key.clone(), true);
            }
        }
        next
    }

    /// Check that every required feature is enabled.
    ///
    /// A required key that is absent counts as disabled. Unknown types have
    /// no requirements and always validate.
    pub fn validate(&self, type_id: &str, map: &FeatureMap) -> bool {
        match self.catalog.get_type(type_id) {
            Some(definition) => definition
                .required_features
                .iter()
                .all(|key| map.is_enabled(key.as_str())),
            None => true,
        }
    }

    /// Required features that `map` leaves disabled, in declaration order.
    pub fn missing_required(&self, type_id: &str, map: &FeatureMap) -> Vec<FeatureKey> {
        self.catalog
            .get_type(type_id)
            .map(|definition| {
                definition
                    .required_features
                    .iter()
                    .filter(|key| !map.is_enabled(key.as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Like [`validate`](Self::validate) but reports which features are missing.
    ///
    /// # Errors
    ///
    /// `OrgError::Invalid` listing the missing required features.
    pub fn check(&self, type_id: &str, map: &FeatureMap) -> OrgResult<()> {
        let missing = self.missing_required(type_id, map);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(OrgError::Invalid {
                type_id: type_id.to_string(),
                missing,
            })
        }
    }

    /// Discard in-progress edits: the organization's persisted map verbatim.
    pub fn reset(&self, organization: &Organization) -> FeatureMap {
        organization.features.clone()
    }

    /// Check whether `map` may be kept when switching to `new_type`.
    ///
    /// # Errors
    ///
    /// - `OrgError::UnknownType` if `new_type` is not in the catalog
    /// - `OrgError::Invalid` if `map` lacks a feature `new_type` requires
    pub fn can_change_type(&self, map: &FeatureMap, new_type: &str) -> OrgResult<()> {
        if !self.catalog.contains(new_type) {
            return Err(OrgError::UnknownType(new_type.to_string()));
        }
        self.check(new_type, map)
    }

    /// Rows for the feature settings screen.
    ///
    /// Covers every key in the map, the type's defaults, and both constraint
    /// sets. Required rows come first, then optional rows (each in
    /// declaration order), then the remaining keys sorted.
    pub fn rows(&self, type_id: &str, map: &FeatureMap) -> Vec<FeatureRow> {
        let definition = self.catalog.get_type(type_id);
        let mut seen: BTreeSet<&FeatureKey> = BTreeSet::new();
        let mut ordered: Vec<&FeatureKey> = Vec::new();

        if let Some(definition) = definition {
            for key in definition
                .required_features
                .iter()
                .chain(definition.optional_features.iter())
            {
                if seen.insert(key) {
                    ordered.push(key);
                }
            }
        }

        let mut rest: BTreeSet<&FeatureKey> = map.keys().collect();
        if let Some(definition) = definition {
            rest.extend(definition.default_features.keys());
        }
        ordered.extend(rest.into_iter().filter(|key| !seen.contains(key)));

        ordered
            .into_iter()
            .map(|key| {
                let class = definition
                    .map(|definition| classify_in(definition, key.as_str()))
                    .unwrap_or(FeatureClass::Available);
                FeatureRow {
                    key: key.clone(),
                    enabled: map.is_enabled(key.as_str()),
                    class,
                    can_toggle: class != FeatureClass::Required,
                }
            })
            .collect()
    }
}

fn classify_in(definition: &OrganizationTypeDefinition, key: &str) -> FeatureClass {
    if definition.is_required(key) {
        FeatureClass::Required
    } else if definition.is_optional(key) {
        FeatureClass::Optional
    } else {
        FeatureClass::Available
    }
}
