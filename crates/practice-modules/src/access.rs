//! # Module Access
//!
//! Computes the set of modules an organization can see from its feature map.
//! The set is what the navigation shell renders and what route guards check.

use practice_org::{FeatureMap, Organization};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::modules::{ClinicalModule, ModuleArea};

/// A set of visible modules.
///
/// Iteration follows navigation order regardless of insertion order.
///
/// # Example
///
/// ```
/// use practice_modules::{ClinicalModule, ModuleSet};
/// use practice_org::FeatureMap;
///
/// let features = FeatureMap::from_pairs([("patientManagement", true), ("billing", true)]).unwrap();
/// let visible = ModuleSet::visible_for(&features);
///
/// assert!(visible.contains(ClinicalModule::Patients));
/// assert!(visible.contains(ClinicalModule::Billing));
/// assert!(!visible.contains(ClinicalModule::Pharmacy));
/// assert!(visible.is_route_visible("/patients/42"));
/// assert!(!visible.is_route_visible("/pharmacy"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSet {
    modules: HashSet<ClinicalModule>,
}

impl ModuleSet {
    /// Create a new empty module set.
    pub fn new() -> Self {
        Self {
            modules: HashSet::new(),
        }
    }

    /// Modules whose gates are open for a feature map.
    pub fn visible_for(features: &FeatureMap) -> Self {
        let modules: HashSet<ClinicalModule> = ClinicalModule::all()
            .into_iter()
            .filter(|module| module.is_visible(features))
            .collect();
        tracing::debug!(
            visible = modules.len(),
            enabled_features = features.enabled_keys().count(),
            "Resolved visible modules"
        );
        Self { modules }
    }

    /// Add a module to the set.
    pub fn add(&mut self, module: ClinicalModule) {
        self.modules.insert(module);
    }

    /// Remove a module from the set.
    ///
    /// # Returns
    ///
    /// `true` if the module was present, `false` otherwise
    pub fn remove(&mut self, module: ClinicalModule) -> bool {
        self.modules.remove(&module)
    }

    /// Check if the set contains a module.
    pub fn contains(&self, module: ClinicalModule) -> bool {
        self.modules.contains(&module)
    }

    /// Modules in navigation order.
    pub fn iter(&self) -> impl Iterator<Item = ClinicalModule> + '_ {
        ClinicalModule::all()
            .into_iter()
            .filter(move |module| self.modules.contains(module))
    }

    /// Visible modules in one area, in navigation order.
    pub fn in_area(&self, area: ModuleArea) -> Vec<ClinicalModule> {
        self.iter().filter(|module| module.area() == area).collect()
    }

    /// Routes of the visible modules, in navigation order.
    pub fn routes(&self) -> Vec<&'static str> {
        self.iter().map(|module| module.route()).collect()
    }

    /// Check whether a route may be rendered.
    ///
    /// Routes that belong to no module are hidden.
    pub fn is_route_visible(&self, path: &str) -> bool {
        ClinicalModule::for_route(path).is_some_and(|module| self.contains(module))
    }

    /// Modules present in `self` but not in `other`.
    ///
    /// Used to tell the user which screens disappear when saving a change.
    pub fn difference(&self, other: &ModuleSet) -> Vec<ClinicalModule> {
        self.iter().filter(|module| !other.contains(*module)).collect()
    }

    /// Get the count of modules.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl FromIterator<ClinicalModule> for ModuleSet {
    fn from_iter<T: IntoIterator<Item = ClinicalModule>>(iter: T) -> Self {
        Self {
            modules: iter.into_iter().collect(),
        }
    }
}

/// Module visibility for organizations.
pub struct ModuleAccess;

impl ModuleAccess {
    /// Modules visible for an organization's persisted features.
    pub fn for_organization(organization: &Organization) -> ModuleSet {
        ModuleSet::visible_for(&organization.features)
    }

    /// Modules that would be hidden if `before` were replaced by `after`.
    pub fn lost_modules(before: &FeatureMap, after: &FeatureMap) -> Vec<ClinicalModule> {
        ModuleSet::visible_for(before).difference(&ModuleSet::visible_for(after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use practice_org::OrganizationTypeCatalog;

    #[test]
    fn test_empty_features_show_core_only() {
        let visible = ModuleSet::visible_for(&FeatureMap::new());
        let modules: Vec<ClinicalModule> = visible.iter().collect();
        assert_eq!(modules, vec![ClinicalModule::Dashboard, ClinicalModule::Settings]);
    }

    #[test]
    fn test_iteration_follows_navigation_order() {
        let set: ModuleSet = [ClinicalModule::Users, ClinicalModule::Patients, ClinicalModule::Dashboard]
            .into_iter()
            .collect();
        let modules: Vec<ClinicalModule> = set.iter().collect();
        assert_eq!(
            modules,
            vec![ClinicalModule::Dashboard, ClinicalModule::Patients, ClinicalModule::Users]
        );
    }

    #[test]
    fn test_laboratory_defaults() {
        let catalog = OrganizationTypeCatalog::builtin();
        let org = Organization::create("Central Lab", "laboratory", catalog);
        let visible = ModuleAccess::for_organization(&org);

        assert!(visible.contains(ClinicalModule::LabResults));
        assert!(visible.contains(ClinicalModule::Patients));
        assert!(!visible.contains(ClinicalModule::Pharmacy));
        assert!(!visible.contains(ClinicalModule::Billing));
        assert_eq!(visible.in_area(ModuleArea::Diagnostics), vec![ClinicalModule::LabResults]);
    }

    #[test]
    fn test_disabled_feature_hides_route() {
        let before = FeatureMap::from_pairs([("pharmacy", true), ("inventory", true)]).unwrap();
        let after = FeatureMap::from_pairs([("pharmacy", true), ("inventory", false)]).unwrap();

        assert!(ModuleSet::visible_for(&before).is_route_visible("/inventory"));
        assert!(!ModuleSet::visible_for(&after).is_route_visible("/inventory/items/7"));
        assert_eq!(
            ModuleAccess::lost_modules(&before, &after),
            vec![ClinicalModule::Inventory]
        );
    }

    #[test]
    fn test_unknown_route_is_hidden() {
        let visible = ModuleSet::visible_for(&FeatureMap::new());
        assert!(visible.is_route_visible("/"));
        assert!(!visible.is_route_visible("/admin/secret"));
    }

    #[test]
    fn test_add_remove() {
        let mut set = ModuleSet::new();
        assert!(set.is_empty());
        set.add(ClinicalModule::Billing);
        assert_eq!(set.len(), 1);
        assert!(set.remove(ClinicalModule::Billing));
        assert!(!set.remove(ClinicalModule::Billing));
    }
}
