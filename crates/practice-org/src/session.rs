//! Feature editing session
//!
//! This module provides the [`EditingSession`] type that tracks the
//! organization selected for editing, its last persisted feature map, and
//! the working copy the user is changing. Every mutation goes through a
//! [`FeatureResolver`]; the session only records the result and whether
//! there is anything left to save.
//!
//! # State Machine
//!
//! ```text
//!          toggle / enable_all_optional / change_type (map differs)
//!   Clean ──────────────────────────────────────────────────────→ Dirty
//!     ↑                                                             │
//!     └──────────────── save (ok) / reset / select ─────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::error::{OrgError, OrgResult};
use crate::features::{FeatureChange, FeatureKey, FeatureMap};
use crate::organization::Organization;
use crate::repository::OrganizationRepository;
use crate::resolver::{FeatureResolver, ToggleOutcome};

/// Whether the working copy has unsaved edits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Working copy matches the persisted organization
    #[default]
    Clean,

    /// Working copy has unsaved edits
    Dirty,
}

/// One user's feature editing session.
///
/// # Examples
///
/// ```
/// use practice_org::{EditingSession, FeatureKey, FeatureResolver, Organization, SessionState};
///
/// let resolver = FeatureResolver::builtin();
/// let org = Organization::create("Riverside", "family_practice", resolver.catalog());
///
/// let mut session = EditingSession::new();
/// session.select(org);
/// assert_eq!(session.state(), SessionState::Clean);
///
/// let inventory = FeatureKey::parse("inventory").unwrap();
/// session.toggle(&resolver, &inventory).unwrap();
/// assert_eq!(session.state(), SessionState::Dirty);
///
/// session.reset(&resolver).unwrap();
/// assert_eq!(session.state(), SessionState::Clean);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EditingSession {
    /// Organization as last persisted
    selected: Option<Organization>,

    /// Type being edited (differs from the persisted type after `change_type`)
    working_type: Option<String>,

    /// Working copy of the feature map
    working: FeatureMap,

    /// Current state
    state: SessionState,
}

impl EditingSession {
    /// Creates a session with nothing selected.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select an organization for editing.
    ///
    /// The working copy becomes the organization's persisted map. Unsaved
    /// edits to a previously selected organization are discarded.
    pub fn select(&mut self, organization: Organization) {
        if self.is_dirty() {
            if let Some(previous) = &self.selected {
                warn!(
                    org_id = %previous.id,
                    pending = self.pending_changes().len(),
                    "Discarding unsaved feature changes"
                );
            }
        }
        info!(org_id = %organization.id, org_type = %organization.org_type, "Selected organization");
        self.working = organization.features.clone();
        self.working_type = Some(organization.org_type.clone());
        self.selected = Some(organization);
        self.state = SessionState::Clean;
    }

    /// Clear the selection.
    pub fn clear(&mut self) {
        self.selected = None;
        self.working_type = None;
        self.working = FeatureMap::new();
        self.state = SessionState::Clean;
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if there are unsaved edits.
    pub fn is_dirty(&self) -> bool {
        self.state == SessionState::Dirty
    }

    /// The selected organization as last persisted.
    pub fn selected(&self) -> Option<&Organization> {
        self.selected.as_ref()
    }

    /// Type of the working copy.
    pub fn working_type(&self) -> Option<&str> {
        self.working_type.as_deref()
    }

    /// Working copy of the feature map.
    pub fn features(&self) -> &FeatureMap {
        &self.working
    }

    /// Effective changes between the persisted map and the working copy.
    pub fn pending_changes(&self) -> Vec<FeatureChange> {
        match &self.selected {
            Some(org) => org.features.diff(&self.working),
            None => Vec::new(),
        }
    }

    /// Whether the working copy may be saved.
    pub fn can_save(&self, resolver: &FeatureResolver<'_>) -> bool {
        match self.working_type() {
            Some(type_id) => resolver.validate(type_id, &self.working),
            None => false,
        }
    }

    /// Toggle one feature of the working copy.
    ///
    /// A rejected toggle leaves the session untouched and is returned as an
    /// ordinary outcome.
    ///
    /// # Errors
    ///
    /// `OrgError::NoSelection` if no organization is selected.
    pub fn toggle(
        &mut self,
        resolver: &FeatureResolver<'_>,
        key: &FeatureKey,
    ) -> OrgResult<ToggleOutcome> {
        let type_id = self.working_type.as_deref().ok_or(OrgError::NoSelection)?;
        let (next, outcome) = resolver.toggle(&self.working, type_id, key);
        if outcome.is_applied() {
            self.working = next;
            self.refresh_state();
        }
        Ok(outcome)
    }

    /// Enable every optional feature of the working type.
    ///
    /// # Errors
    ///
    /// `OrgError::NoSelection` if no organization is selected.
    pub fn enable_all_optional(&mut self, resolver: &FeatureResolver<'_>) -> OrgResult<()> {
        let type_id = self.working_type.as_deref().ok_or(OrgError::NoSelection)?;
        self.working = resolver.enable_all_optional(&self.working, type_id);
        self.refresh_state();
        Ok(())
    }

    /// Switch the organization to another type, keeping the working map.
    ///
    /// # Errors
    ///
    /// - `OrgError::NoSelection` if no organization is selected
    /// - `OrgError::UnknownType` / `OrgError::Invalid` if the working map
    ///   would orphan a feature the new type requires
    pub fn change_type(&mut self, resolver: &FeatureResolver<'_>, new_type: &str) -> OrgResult<()> {
        if self.selected.is_none() {
            return Err(OrgError::NoSelection);
        }
        resolver.can_change_type(&self.working, new_type)?;
        self.working_type = Some(new_type.to_string());
        self.refresh_state();
        Ok(())
    }

    /// Discard edits and return to the persisted state.
    ///
    /// # Errors
    ///
    /// `OrgError::NoSelection` if no organization is selected.
    pub fn reset(&mut self, resolver: &FeatureResolver<'_>) -> OrgResult<()> {
        let org = self.selected.as_ref().ok_or(OrgError::NoSelection)?;
        self.working = resolver.reset(org);
        self.working_type = Some(org.org_type.clone());
        self.state = SessionState::Clean;
        debug!(org_id = %org.id, "Reset feature edits");
        Ok(())
    }

    /// Validate and persist the working copy.
    ///
    /// On success the stored organization becomes the new persisted state
    /// and the session is clean. On failure the session keeps its edits.
    ///
    /// # Errors
    ///
    /// - `OrgError::NoSelection` if no organization is selected
    /// - `OrgError::Invalid` if a required feature is disabled
    /// - any error returned by the repository
    #[instrument(skip_all)]
    pub async fn save<R>(
        &mut self,
        resolver: &FeatureResolver<'_>,
        repository: &R,
    ) -> OrgResult<Organization>
    where
        R: OrganizationRepository + ?Sized,
    {
        let org = self.selected.as_ref().ok_or(OrgError::NoSelection)?;
        let type_id = self
            .working_type
            .clone()
            .unwrap_or_else(|| org.org_type.clone());
        resolver.check(&type_id, &self.working)?;

        let changes = org.features.diff(&self.working);
        let saved = if type_id != org.org_type {
            repository
                .update_type(org.id, type_id, self.working.clone())
                .await?
        } else {
            repository.save_features(org.id, self.working.clone()).await?
        };

        info!(
            org_id = %saved.id,
            org_type = %saved.org_type,
            changed = changes.len(),
            "Saved organization features"
        );
        self.working = saved.features.clone();
        self.working_type = Some(saved.org_type.clone());
        self.selected = Some(saved.clone());
        self.state = SessionState::Clean;
        Ok(saved)
    }

    fn refresh_state(&mut self) {
        let Some(org) = &self.selected else {
            self.state = SessionState::Clean;
            return;
        };
        let type_changed = self.working_type.as_deref() != Some(org.org_type.as_str());
        self.state = if type_changed || !org.features.same_effective_state(&self.working) {
            SessionState::Dirty
        } else {
            SessionState::Clean
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::keys;
    use crate::repository::MemoryOrganizationRepository;

    fn key(s: &str) -> FeatureKey {
        FeatureKey::parse(s).unwrap()
    }

    fn hospital() -> Organization {
        Organization::create("General Hospital", "hospital", FeatureResolver::builtin().catalog())
    }

    #[test]
    fn test_new_session_is_clean() {
        let session = EditingSession::new();
        assert_eq!(session.state(), SessionState::Clean);
        assert!(session.selected().is_none());
        assert!(session.features().is_empty());
    }

    #[test]
    fn test_mutations_require_selection() {
        let resolver = FeatureResolver::builtin();
        let mut session = EditingSession::new();
        assert!(matches!(
            session.toggle(&resolver, &key(keys::BILLING)),
            Err(OrgError::NoSelection)
        ));
        assert!(matches!(session.reset(&resolver), Err(OrgError::NoSelection)));
        assert!(matches!(
            session.enable_all_optional(&resolver),
            Err(OrgError::NoSelection)
        ));
    }

    #[test]
    fn test_toggle_marks_dirty_and_back_clean() {
        let resolver = FeatureResolver::builtin();
        let mut session = EditingSession::new();
        session.select(hospital());

        session.toggle(&resolver, &key(keys::PHARMACY)).unwrap();
        assert!(session.is_dirty());
        assert_eq!(session.pending_changes().len(), 1);

        session.toggle(&resolver, &key(keys::PHARMACY)).unwrap();
        assert_eq!(session.state(), SessionState::Clean);
    }

    #[test]
    fn test_rejected_toggle_keeps_state() {
        let resolver = FeatureResolver::builtin();
        let mut session = EditingSession::new();
        session.select(hospital());

        let outcome = session
            .toggle(&resolver, &key(keys::DEPARTMENT_MANAGEMENT))
            .unwrap();
        assert!(outcome.is_rejected());
        assert_eq!(session.state(), SessionState::Clean);
        assert!(session.features().is_enabled(keys::DEPARTMENT_MANAGEMENT));
    }

    #[test]
    fn test_enable_all_optional_without_change_stays_clean() {
        let resolver = FeatureResolver::builtin();
        let mut org = hospital();
        org.features = resolver.enable_all_optional(&org.features, "hospital");

        let mut session = EditingSession::new();
        session.select(org);
        session.enable_all_optional(&resolver).unwrap();
        assert_eq!(session.state(), SessionState::Clean);
    }

    #[test]
    fn test_reset_discards_edits() {
        let resolver = FeatureResolver::builtin();
        let org = hospital();
        let mut session = EditingSession::new();
        session.select(org.clone());

        session.enable_all_optional(&resolver).unwrap();
        assert!(session.is_dirty());

        session.reset(&resolver).unwrap();
        assert_eq!(session.state(), SessionState::Clean);
        assert_eq!(session.features(), &org.features);
    }

    #[test]
    fn test_change_type_blocked_when_requirements_orphaned() {
        let resolver = FeatureResolver::builtin();
        let mut session = EditingSession::new();
        session.select(hospital());

        assert!(matches!(
            session.change_type(&resolver, "laboratory"),
            Err(OrgError::Invalid { .. })
        ));
        assert_eq!(session.working_type(), Some("hospital"));

        session.change_type(&resolver, "clinic").unwrap();
        assert!(session.is_dirty());
        assert_eq!(session.working_type(), Some("clinic"));
    }

    #[test]
    fn test_select_while_dirty_discards_edits() {
        let resolver = FeatureResolver::builtin();
        let clinic = Organization::create("Lakeside Clinic", "clinic", resolver.catalog());
        let mut session = EditingSession::new();
        session.select(hospital());

        session.enable_all_optional(&resolver).unwrap();
        assert!(session.is_dirty());

        session.select(clinic.clone());
        assert_eq!(session.state(), SessionState::Clean);
        assert_eq!(session.selected(), Some(&clinic));
        assert_eq!(session.working_type(), Some("clinic"));
        assert_eq!(session.features(), &clinic.features);
        assert!(session.pending_changes().is_empty());
    }

    #[test]
    fn test_change_type_back_is_clean() {
        let resolver = FeatureResolver::builtin();
        let mut session = EditingSession::new();
        session.select(hospital());

        session.change_type(&resolver, "clinic").unwrap();
        assert!(session.is_dirty());

        session.change_type(&resolver, "hospital").unwrap();
        assert_eq!(session.state(), SessionState::Clean);
        assert_eq!(session.working_type(), Some("hospital"));
    }

    #[test]
    fn test_clear_drops_selection() {
        let resolver = FeatureResolver::builtin();
        let mut session = EditingSession::new();
        session.select(hospital());
        session.toggle(&resolver, &key(keys::PHARMACY)).unwrap();

        session.clear();
        assert_eq!(session.state(), SessionState::Clean);
        assert!(session.selected().is_none());
        assert!(session.working_type().is_none());
        assert!(session.features().is_empty());
        assert!(matches!(
            session.toggle(&resolver, &key(keys::PHARMACY)),
            Err(OrgError::NoSelection)
        ));
    }

    #[tokio::test]
    async fn test_save_persists_and_cleans() {
        let resolver = FeatureResolver::builtin();
        let org = hospital();
        let repo = MemoryOrganizationRepository::with_organizations([org.clone()]);

        let mut session = EditingSession::new();
        session.select(org.clone());
        session.toggle(&resolver, &key(keys::IMAGING)).unwrap();

        let saved = session.save(&resolver, &repo).await.unwrap();
        assert!(saved.features.is_enabled(keys::IMAGING));
        assert_eq!(session.state(), SessionState::Clean);
        assert_eq!(session.selected(), Some(&saved));

        let stored = repo.get(org.id).await.unwrap().unwrap();
        assert_eq!(stored.features, saved.features);
    }

    #[tokio::test]
    async fn test_invalid_map_blocks_save() {
        let resolver = FeatureResolver::builtin();
        let mut org = hospital();
        org.features.set(key(keys::ADVANCED_REPORTING), false);
        let repo = MemoryOrganizationRepository::with_organizations([org.clone()]);

        let mut session = EditingSession::new();
        session.select(org.clone());
        session.toggle(&resolver, &key(keys::IMAGING)).unwrap();
        assert!(!session.can_save(&resolver));

        let err = session.save(&resolver, &repo).await.unwrap_err();
        assert!(matches!(err, OrgError::Invalid { .. }));
        assert!(session.is_dirty());
        assert_eq!(repo.stats().await.updates, 0);
    }

    #[tokio::test]
    async fn test_save_with_type_change() {
        let resolver = FeatureResolver::builtin();
        let org = hospital();
        let repo = MemoryOrganizationRepository::with_organizations([org.clone()]);

        let mut session = EditingSession::new();
        session.select(org.clone());
        session.change_type(&resolver, "clinic").unwrap();

        let saved = session.save(&resolver, &repo).await.unwrap();
        assert_eq!(saved.org_type, "clinic");
        assert_eq!(saved.features, org.features);
        assert_eq!(repo.get(org.id).await.unwrap().unwrap().org_type, "clinic");
        assert_eq!(session.state(), SessionState::Clean);
    }

    #[tokio::test]
    async fn test_repository_failure_keeps_edits() {
        let resolver = FeatureResolver::builtin();
        let repo = MemoryOrganizationRepository::new();

        let mut session = EditingSession::new();
        session.select(hospital());
        session.toggle(&resolver, &key(keys::IMAGING)).unwrap();

        let err = session.save(&resolver, &repo).await.unwrap_err();
        assert!(matches!(err, OrgError::OrganizationNotFound(_)));
        assert!(session.is_dirty());
    }
}
