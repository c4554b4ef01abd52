//! Error types for LeafMap

use thiserror::Error;

/// How an error is surfaced to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Logged and listed as a non-blocking notice; state stays at last-known-good
    Logged,
    /// Blocking alert; the triggering action is aborted
    Alert,
}

#[derive(Debug, Error)]
pub enum LeafError {
    // Location errors
    #[error("District not found: {name}")]
    DistrictNotFound { name: String },

    #[error("Block '{block}' not found in district '{district}'")]
    BlockNotFound { district: String, block: String },

    #[error("Gram panchayat '{gp}' not found in block '{block}'")]
    GpNotFound { block: String, gp: String },

    #[error("District '{district}' has no gram-panchayat data")]
    GpDataUnavailable { district: String },

    #[error("Feature not found: {feature_id}")]
    FeatureNotFound { feature_id: String },

    // Filter errors
    #[error("Filter for column '{column}' already exists")]
    DuplicateFilter { column: String },

    #[error("No filter for column '{column}'")]
    FilterNotFound { column: String },

    #[error("The {bound} bound of '{column}' is locked by its preference")]
    BoundLocked { column: String, bound: &'static str },

    #[error("Invalid range for '{column}': min {min} is greater than max {max}")]
    InvalidRange { column: String, min: f64, max: f64 },

    // Intervention errors
    #[error("No intervention selected. Choose an intervention before configuring filters")]
    InterventionNotSelected,

    #[error("Intervention not found: {name}")]
    InterventionNotFound { name: String },

    #[error("Malformed intervention configuration: {reason}")]
    MalformedConfig { reason: String },

    // URL errors
    #[error("Invalid dashboard path '{path}': {reason}")]
    InvalidUrl { path: String, reason: String },

    // Remote errors
    #[error("Request to {endpoint} failed: {reason}")]
    Transport { endpoint: String, reason: String },

    #[error("Request to {endpoint} timed out after {secs}s")]
    Timeout { endpoint: String, secs: u64 },

    #[error("Scoring service error ({status}): {message}")]
    Backend { status: u16, message: String },

    #[error("Operation not supported by this scoring service: {operation}")]
    Unsupported { operation: String },

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl LeafError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LeafError::InterventionNotSelected
            | LeafError::InterventionNotFound { .. }
            | LeafError::MalformedConfig { .. }
            | LeafError::ConfigMissing { .. }
            | LeafError::ConfigInvalid { .. } => ErrorSeverity::Alert,
            _ => ErrorSeverity::Logged,
        }
    }

    /// Transport-level failures: the remote call never produced a usable answer
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            LeafError::Transport { .. }
                | LeafError::Timeout { .. }
                | LeafError::Backend { .. }
                | LeafError::Unsupported { .. }
        )
    }
}

impl From<serde_json::Error> for LeafError {
    fn from(err: serde_json::Error) -> Self {
        LeafError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, LeafError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors_are_alerts() {
        assert_eq!(LeafError::InterventionNotSelected.severity(), ErrorSeverity::Alert);
        assert_eq!(
            LeafError::MalformedConfig { reason: "x".into() }.severity(),
            ErrorSeverity::Alert
        );
    }

    #[test]
    fn test_transport_errors_are_logged() {
        let err = LeafError::Timeout { endpoint: "/locations".into(), secs: 5 };
        assert_eq!(err.severity(), ErrorSeverity::Logged);
        assert!(err.is_remote());
        assert!(!LeafError::DistrictNotFound { name: "X".into() }.is_remote());
    }
}
