//! Error types for organization feature configuration
//!
//! Lookups of unknown organization types and rejected toggles are not errors:
//! they come back as `Option::None`, empty maps, or
//! [`ToggleOutcome::Rejected`](crate::resolver::ToggleOutcome). The variants
//! here cover the conditions a caller has to act on, such as a feature map
//! that fails validation or a missing organization in the store.

use thiserror::Error;
use uuid::Uuid;

use crate::features::FeatureKey;

/// Organization configuration error types.
#[derive(Debug, Error)]
pub enum OrgError {
    /// Feature key is malformed (empty, too long, or has invalid characters)
    #[error("Invalid feature key: {0:?}")]
    InvalidFeatureKey(String),

    /// Feature map does not enable every required feature of its type
    #[error("Feature map is invalid for {type_id}: missing required features [{}]", join_keys(.missing))]
    Invalid {
        /// Organization type the map was checked against.
        type_id: String,
        /// Required features that are absent or disabled.
        missing: Vec<FeatureKey>,
    },

    /// Organization type is not in the catalog
    #[error("Unknown organization type: {0}")]
    UnknownType(String),

    /// Catalog declares the same type id twice
    #[error("Duplicate organization type: {0}")]
    DuplicateType(String),

    /// Catalog override could not be read or parsed
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// Organization does not exist in the repository
    #[error("Organization not found: {0}")]
    OrganizationNotFound(Uuid),

    /// Organization id already exists in the repository
    #[error("Organization already exists: {0}")]
    DuplicateOrganization(Uuid),

    /// Editing session has no organization selected
    #[error("No organization selected")]
    NoSelection,

    /// Invalid configuration value
    #[error("Invalid configuration value for {key}: {message}")]
    Config {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Result type for organization configuration operations.
pub type OrgResult<T> = Result<T, OrgError>;

impl OrgError {
    /// Check if this error was caused by user input rather than the
    /// deployment (catalog data, configuration).
    ///
    /// User errors are shown as warnings in the UI; the rest are logged.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            OrgError::InvalidFeatureKey(_)
                | OrgError::Invalid { .. }
                | OrgError::UnknownType(_)
                | OrgError::NoSelection
        )
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            OrgError::InvalidFeatureKey(_) => "INVALID_FEATURE_KEY",
            OrgError::Invalid { .. } => "INVALID_FEATURE_MAP",
            OrgError::UnknownType(_) => "UNKNOWN_ORGANIZATION_TYPE",
            OrgError::DuplicateType(_) => "DUPLICATE_ORGANIZATION_TYPE",
            OrgError::Catalog(_) => "CATALOG_ERROR",
            OrgError::OrganizationNotFound(_) => "ORGANIZATION_NOT_FOUND",
            OrgError::DuplicateOrganization(_) => "DUPLICATE_ORGANIZATION",
            OrgError::NoSelection => "NO_SELECTION",
            OrgError::Config { .. } => "CONFIG_ERROR",
        }
    }
}

fn join_keys(keys: &[FeatureKey]) -> String {
    keys.iter()
        .map(FeatureKey::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
