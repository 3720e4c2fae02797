//! Feature keys and feature maps
//!
//! Feature keys are open identifiers: new capabilities are introduced by
//! catalog data, not by code changes, so [`FeatureKey`] is a validated string
//! rather than a closed enum. A [`FeatureMap`] assigns an enabled flag to
//! each key an organization knows about; a key that is absent is disabled.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{OrgError, OrgResult};

/// Maximum length of a feature key in bytes.
pub const MAX_FEATURE_KEY_LEN: usize = 64;

/// Well-known feature keys used by the built-in catalog.
pub mod keys {
    pub const PATIENT_MANAGEMENT: &str = "patientManagement";
    pub const APPOINTMENTS: &str = "appointments";
    pub const VISITS: &str = "visits";
    pub const PRESCRIPTIONS: &str = "prescriptions";
    pub const LAB_RESULTS: &str = "labResults";
    pub const BILLING: &str = "billing";
    pub const INSURANCE_CLAIMS: &str = "insuranceClaims";
    pub const PATIENT_PORTAL: &str = "patientPortal";
    pub const TELEMEDICINE: &str = "telemedicine";
    pub const INVENTORY: &str = "inventory";
    pub const PHARMACY: &str = "pharmacy";
    pub const USER_MANAGEMENT: &str = "userManagement";
    pub const DEPARTMENT_MANAGEMENT: &str = "departmentManagement";
    pub const BASIC_REPORTING: &str = "basicReporting";
    pub const ADVANCED_REPORTING: &str = "advancedReporting";
    pub const ADVANCED_LAB_INTEGRATION: &str = "advancedLabIntegration";
    pub const IMAGING: &str = "imaging";
    pub const EMERGENCY_SERVICES: &str = "emergencyServices";
    pub const MULTI_LOCATION: &str = "multiLocation";
    pub const LAB_TEST_MANAGEMENT: &str = "labTestManagement";
    pub const SAMPLE_TRACKING: &str = "sampleTracking";
    pub const QUALITY_CONTROL: &str = "qualityControl";
    pub const IMMUNIZATION_TRACKING: &str = "immunizationTracking";
    pub const REFERRALS: &str = "referrals";
}

/// Identifier of a togglable capability (e.g. `billing`, `pharmacy`).
///
/// A well-formed key is non-empty, at most [`MAX_FEATURE_KEY_LEN`] bytes,
/// starts with an ASCII letter, and contains only ASCII letters, digits and
/// underscores.
///
/// # Examples
///
/// ```
/// use practice_org::FeatureKey;
///
/// let key = FeatureKey::parse("advancedLabIntegration").unwrap();
/// assert_eq!(key.as_str(), "advancedLabIntegration");
///
/// assert!(FeatureKey::parse("").is_err());
/// assert!(FeatureKey::parse("lab results").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FeatureKey(String);

impl FeatureKey {
    /// Parse and validate a feature key.
    pub fn parse(s: impl Into<String>) -> OrgResult<Self> {
        let s = s.into();
        if Self::is_well_formed(&s) {
            Ok(Self(s))
        } else {
            Err(OrgError::InvalidFeatureKey(s))
        }
    }

    /// Check whether a string would be accepted by [`FeatureKey::parse`].
    pub fn is_well_formed(s: &str) -> bool {
        let mut chars = s.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {}
            _ => return false,
        }
        s.len() <= MAX_FEATURE_KEY_LEN && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Key from a compile-time constant such as those in [`keys`].
    pub(crate) fn from_static(s: &'static str) -> Self {
        debug_assert!(Self::is_well_formed(s), "malformed feature key {s:?}");
        Self(s.to_string())
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for FeatureKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for FeatureKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for FeatureKey {
    type Error = OrgError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for FeatureKey {
    type Error = OrgError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<FeatureKey> for String {
    fn from(key: FeatureKey) -> Self {
        key.0
    }
}

/// Feature key to enabled flag assignments for one organization.
///
/// Iteration and serialization are ordered by key. Absent keys are disabled,
/// and equality compares effective state: `{a: false}` equals `{}`.
///
/// # Examples
///
/// ```
/// use practice_org::FeatureMap;
///
/// let map = FeatureMap::from_pairs([("billing", true), ("inventory", false)]).unwrap();
/// assert!(map.is_enabled("billing"));
/// assert!(!map.is_enabled("inventory"));
/// assert!(!map.is_enabled("pharmacy"));
/// assert_eq!(map.get("pharmacy"), None);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureMap {
    entries: BTreeMap<FeatureKey, bool>,
}

impl FeatureMap {
    /// Creates an empty feature map.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Build a map from `(key, enabled)` pairs, validating every key.
    pub fn from_pairs<I, K>(pairs: I) -> OrgResult<Self>
    where
        I: IntoIterator<Item = (K, bool)>,
        K: Into<String>,
    {
        let mut map = Self::new();
        for (key, enabled) in pairs {
            map.set(FeatureKey::parse(key)?, enabled);
        }
        Ok(map)
    }

    /// Check if a feature is enabled. Absent keys are disabled.
    pub fn is_enabled(&self, key: &str) -> bool {
        self.entries.get(key).copied().unwrap_or(false)
    }

    /// Get the stored flag for a key, or `None` if the key is absent.
    pub fn get(&self, key: &str) -> Option<bool> {
        self.entries.get(key).copied()
    }

    /// Check if the key is present, whatever its value.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Set a feature flag, returning the previous value if the key was present.
    pub fn set(&mut self, key: FeatureKey, enabled: bool) -> Option<bool> {
        self.entries.insert(key, enabled)
    }

    /// Keys whose flag is `true`, in key order.
    pub fn enabled_keys(&self) -> impl Iterator<Item = &FeatureKey> {
        self.entries
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(key, _)| key)
    }

    /// All keys present in the map, in key order.
    pub fn keys(&self) -> impl Iterator<Item = &FeatureKey> {
        self.entries.keys()
    }

    /// Iterate over `(key, enabled)` entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&FeatureKey, bool)> {
        self.entries.iter().map(|(key, enabled)| (key, *enabled))
    }

    /// Number of keys present.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no keys are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys whose effective state differs between `self` and `other`.
    ///
    /// Effective state treats an absent key as disabled, so `{a: false}` and
    /// `{}` do not differ. Each change is reported as `(key, now_enabled)`
    /// where `now_enabled` is the value in `other`.
    pub fn diff(&self, other: &FeatureMap) -> Vec<FeatureChange> {
        let keys: BTreeSet<&FeatureKey> = self.entries.keys().chain(other.entries.keys()).collect();
        keys.into_iter()
            .filter_map(|key| {
                let after = other.is_enabled(key.as_str());
                (self.is_enabled(key.as_str()) != after).then(|| FeatureChange {
                    key: key.clone(),
                    enabled: after,
                })
            })
            .collect()
    }

    /// Check if two maps enable exactly the same features.
    pub fn same_effective_state(&self, other: &FeatureMap) -> bool {
        self.entries
            .keys()
            .chain(other.entries.keys())
            .all(|key| self.is_enabled(key.as_str()) == other.is_enabled(key.as_str()))
    }
}

impl PartialEq for FeatureMap {
    fn eq(&self, other: &Self) -> bool {
        self.same_effective_state(other)
    }
}

impl Eq for FeatureMap {}

impl<'a> IntoIterator for &'a FeatureMap {
    type Item = (&'a FeatureKey, &'a bool);
    type IntoIter = std::collections::btree_map::Iter<'a, FeatureKey, bool>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<(FeatureKey, bool)> for FeatureMap {
    fn from_iter<T: IntoIterator<Item = (FeatureKey, bool)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A single effective change between two feature maps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureChange {
    /// Feature that changed
    pub key: FeatureKey,

    /// State after the change
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_key_validation() {
        assert!(FeatureKey::parse(keys::PATIENT_MANAGEMENT).is_ok());
        assert!(FeatureKey::parse("lab_v2").is_ok());

        assert!(FeatureKey::parse("").is_err());
        assert!(FeatureKey::parse("2fa").is_err());
        assert!(FeatureKey::parse("_hidden").is_err());
        assert!(FeatureKey::parse("lab-results").is_err());
        assert!(FeatureKey::parse("a".repeat(MAX_FEATURE_KEY_LEN + 1)).is_err());
        assert!(FeatureKey::parse("a".repeat(MAX_FEATURE_KEY_LEN)).is_ok());
    }

    #[test]
    fn test_feature_key_serde_rejects_malformed() {
        let key: FeatureKey = serde_json::from_str("\"billing\"").unwrap();
        assert_eq!(key.as_str(), "billing");

        let bad: Result<FeatureKey, _> = serde_json::from_str("\"bad key\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_absent_key_is_disabled() {
        let map = FeatureMap::from_pairs([("billing", true)]).unwrap();
        assert!(map.is_enabled("billing"));
        assert!(!map.is_enabled("pharmacy"));
        assert!(!map.contains_key("pharmacy"));
    }

    #[test]
    fn test_feature_map_serializes_as_object() {
        let map = FeatureMap::from_pairs([("inventory", false), ("billing", true)]).unwrap();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"billing":true,"inventory":false}"#);

        let back: FeatureMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn test_diff_uses_effective_state() {
        let before = FeatureMap::from_pairs([("billing", true), ("inventory", false)]).unwrap();
        let after = FeatureMap::from_pairs([("billing", false), ("pharmacy", true)]).unwrap();

        let changes = before.diff(&after);
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].key.as_str(), "billing");
        assert!(!changes[0].enabled);
        assert_eq!(changes[1].key.as_str(), "pharmacy");
        assert!(changes[1].enabled);

        let explicit_false = FeatureMap::from_pairs([("inventory", false)]).unwrap();
        assert!(explicit_false.same_effective_state(&FeatureMap::new()));
    }

    #[test]
    fn test_diff_reports_shared_keys_once_in_order() {
        let before = FeatureMap::from_pairs([("visits", true), ("billing", true), ("imaging", false)]).unwrap();
        let after = FeatureMap::from_pairs([("imaging", true), ("visits", false), ("billing", false)]).unwrap();

        let diff = before.diff(&after);
        let changed: Vec<(&str, bool)> = diff
            .iter()
            .map(|change| (change.key.as_str(), change.enabled))
            .collect();
        assert_eq!(changed, vec![("billing", false), ("imaging", true), ("visits", false)]);
    }

    #[test]
    fn test_equality_treats_absent_as_disabled() {
        let explicit_false = FeatureMap::from_pairs([("telemedicine", false)]).unwrap();
        assert_eq!(explicit_false, FeatureMap::new());
        assert_ne!(
            FeatureMap::from_pairs([("telemedicine", true)]).unwrap(),
            FeatureMap::new()
        );
        // structure is still kept for serialization
        assert_eq!(explicit_false.len(), 1);
    }

    #[test]
    fn test_enabled_keys() {
        let map = FeatureMap::from_pairs([("a", true), ("b", false), ("c", true)]).unwrap();
        let enabled: Vec<&str> = map.enabled_keys().map(FeatureKey::as_str).collect();
        assert_eq!(enabled, vec!["a", "c"]);
    }
}
