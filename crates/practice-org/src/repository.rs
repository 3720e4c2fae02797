//! Organization repository
//!
//! This module provides the storage abstraction the editing session persists
//! through, along with the in-memory implementation the application ships
//! with. Concurrent writers are not coordinated: the last write wins.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::error::{OrgError, OrgResult};
use crate::features::FeatureMap;
use crate::organization::Organization;

/// Storage for organizations and their feature maps.
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Fetch one organization.
    async fn get(&self, id: Uuid) -> OrgResult<Option<Organization>>;

    /// All organizations, ordered by creation time.
    async fn list(&self) -> OrgResult<Vec<Organization>>;

    /// Store a new organization.
    async fn insert(&self, organization: Organization) -> OrgResult<Organization>;

    /// Replace an organization's feature map.
    async fn save_features(&self, id: Uuid, features: FeatureMap) -> OrgResult<Organization>;

    /// Change an organization's type together with its feature map.
    async fn update_type(
        &self,
        id: Uuid,
        org_type: String,
        features: FeatureMap,
    ) -> OrgResult<Organization>;
}

/// Repository statistics.
#[derive(Debug, Clone, Default)]
pub struct RepositoryStats {
    /// Organizations inserted
    pub inserts: u64,
    /// Feature map or type updates
    pub updates: u64,
}

/// In-memory organization repository.
///
/// Suitable for single-process deployments and tests.
#[derive(Clone, Default)]
pub struct MemoryOrganizationRepository {
    /// Organizations by id
    organizations: Arc<RwLock<HashMap<Uuid, Organization>>>,
    /// Statistics
    stats: Arc<RwLock<RepositoryStats>>,
}

impl std::fmt::Debug for MemoryOrganizationRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryOrganizationRepository").finish()
    }
}

impl MemoryOrganizationRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with organizations.
    pub fn with_organizations(organizations: impl IntoIterator<Item = Organization>) -> Self {
        let organizations = organizations
            .into_iter()
            .map(|org| (org.id, org))
            .collect();
        Self {
            organizations: Arc::new(RwLock::new(organizations)),
            stats: Arc::new(RwLock::new(RepositoryStats::default())),
        }
    }

    /// Get repository stats.
    pub async fn stats(&self) -> RepositoryStats {
        self.stats.read().await.clone()
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> OrgResult<Organization>
    where
        F: FnOnce(&mut Organization) + Send,
    {
        let updated = {
            let mut organizations = self.organizations.write().await;
            let org = organizations
                .get_mut(&id)
                .ok_or(OrgError::OrganizationNotFound(id))?;
            apply(org);
            org.updated_at = Utc::now();
            org.clone()
        };
        self.stats.write().await.updates += 1;
        Ok(updated)
    }
}

#[async_trait]
impl OrganizationRepository for MemoryOrganizationRepository {
    async fn get(&self, id: Uuid) -> OrgResult<Option<Organization>> {
        Ok(self.organizations.read().await.get(&id).cloned())
    }

    async fn list(&self) -> OrgResult<Vec<Organization>> {
        let mut organizations: Vec<Organization> =
            self.organizations.read().await.values().cloned().collect();
        organizations.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(organizations)
    }

    #[instrument(skip(self, organization), fields(org_id = %organization.id))]
    async fn insert(&self, organization: Organization) -> OrgResult<Organization> {
        {
            let mut organizations = self.organizations.write().await;
            if organizations.contains_key(&organization.id) {
                return Err(OrgError::DuplicateOrganization(organization.id));
            }
            organizations.insert(organization.id, organization.clone());
        }
        self.stats.write().await.inserts += 1;
        debug!(org_type = %organization.org_type, "Inserted organization");
        Ok(organization)
    }

    #[instrument(skip(self, features), fields(org_id = %id))]
    async fn save_features(&self, id: Uuid, features: FeatureMap) -> OrgResult<Organization> {
        let updated = self.update(id, |org| org.features = features).await?;
        debug!(
            enabled = updated.features.enabled_keys().count(),
            "Saved feature map"
        );
        Ok(updated)
    }

    #[instrument(skip(self, features), fields(org_id = %id, org_type = %org_type))]
    async fn update_type(
        &self,
        id: Uuid,
        org_type: String,
        features: FeatureMap,
    ) -> OrgResult<Organization> {
        let updated = self
            .update(id, |org| {
                org.org_type = org_type;
                org.features = features;
            })
            .await?;
        debug!("Updated organization type");
        Ok(updated)
    }
}
