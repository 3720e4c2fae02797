//! # Practice Organization Features
//!
//! This crate provides organization feature configuration for the practice
//! management platform: which capabilities each organization has switched on,
//! which of those its organization type requires, and how edits to that
//! configuration are validated and saved.
//!
//! ## Overview
//!
//! The practice-org crate handles:
//! - **Catalog**: Organization types (family practice, hospital, laboratory, ...)
//!   with their default, required and optional features
//! - **Features**: Open feature keys and per-organization feature maps
//! - **Resolver**: Classification, toggle rules, bulk enable and validation
//! - **Organizations**: Tenant entities owning one feature map
//! - **Sessions**: Explicit editing state (clean/dirty) for one organization
//! - **Repository**: Organization storage with an in-memory implementation
//! - **Config**: Catalog override and defaults resolved at startup
//!
//! ## Architecture
//!
//! ```text
//! OrganizationTypeCatalog
//!   └─ FeatureResolver (pure rules)
//!        └─ EditingSession (selected org, working copy, clean/dirty)
//!             └─ OrganizationRepository (persist on save)
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use practice_org::{
//!     EditingSession, FeatureKey, FeatureResolver, MemoryOrganizationRepository,
//!     Organization, OrganizationRepository,
//! };
//!
//! async fn example() -> practice_org::OrgResult<()> {
//!     let resolver = FeatureResolver::builtin();
//!     let repo = MemoryOrganizationRepository::new();
//!
//!     // Create an organization with its type's default features
//!     let org = Organization::create("General Hospital", "hospital", resolver.catalog());
//!     repo.insert(org.clone()).await?;
//!
//!     // Edit and save
//!     let mut session = EditingSession::new();
//!     session.select(org);
//!     session.toggle(&resolver, &FeatureKey::parse("pharmacy")?)?;
//!     session.save(&resolver, &repo).await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod features;
pub mod organization;
pub mod repository;
pub mod resolver;
pub mod session;

// Re-export main types for convenience
pub use catalog::{CatalogInconsistency, CategoryGroup, OrganizationTypeCatalog, OrganizationTypeDefinition};
pub use config::OrgConfig;
pub use error::{OrgError, OrgResult};
pub use features::{keys, FeatureChange, FeatureKey, FeatureMap};
pub use organization::{Organization, OrganizationSummary};
pub use repository::{MemoryOrganizationRepository, OrganizationRepository, RepositoryStats};
pub use resolver::{FeatureClass, FeatureResolver, FeatureRow, ToggleOutcome};
pub use session::{EditingSession, SessionState};
