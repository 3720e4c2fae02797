//! # Practice Modules
//!
//! This crate decides which application modules of the practice platform an
//! organization sees, based on the feature map managed by `practice-org`.
//!
//! ## Overview
//!
//! The practice-modules crate handles:
//! - **Modules**: Every screen group of the application and its route
//! - **Gates**: The feature condition each module is shown under
//! - **Module Sets**: The visible modules for a feature map, used by the
//!   navigation shell and route guards
//!
//! ## Architecture
//!
//! ```text
//! Organization.features ──→ Gate (per module) ──→ ModuleSet ──→ nav / route guard
//!
//! Examples:
//!   Patients      all of [patientManagement]
//!   Visits        all of [patientManagement, visits]
//!   LabResults    any of [labResults, labTestManagement]
//!   Dashboard     always
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use practice_modules::{ClinicalModule, ModuleAccess};
//! use practice_org::{Organization, OrganizationTypeCatalog};
//!
//! let org = Organization::create("General Hospital", "hospital", OrganizationTypeCatalog::builtin());
//! let visible = ModuleAccess::for_organization(&org);
//!
//! for module in visible.iter() {
//!     println!("{} -> {}", module.display_name(), module.route());
//! }
//! assert!(visible.contains(ClinicalModule::Departments));
//! ```
//!
//! ## Integration with practice-org
//!
//! Module visibility reads the persisted feature map. While a feature editing
//! session is dirty, `ModuleAccess::lost_modules` previews which screens a
//! save would hide.

pub mod access;
pub mod modules;

// Re-export main types for convenience
pub use access::{ModuleAccess, ModuleSet};
pub use modules::{ClinicalModule, Gate, ModuleArea};
