use thiserror::Error;

impl From<serde_json::Error> for GovernanceError {
    fn from(err: serde_json::Error) -> Self {
        Self::ValidationError(format!("JSON serialization error: {}", err))
    }
}

impl From<sqlx::Error> for GovernanceError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(format!("Database error: {}", err))
    }
}

impl From<sqlx::migrate::MigrateError> for GovernanceError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::DatabaseError(format!("Migration error: {}", err))
    }
}

impl From<reqwest::Error> for GovernanceError {
    fn from(err: reqwest::Error) -> Self {
        Self::ExternalServiceError(format!("HTTP error: {}", err))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GovernanceError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    StateError(String),

    #[error("Permission denied: {0}")]
    PermissionError(String),

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

pub type Result<T, E = GovernanceError> = std::result::Result<T, E>;

impl GovernanceError {
    pub fn resolution_not_found(id: &str) -> Self {
        Self::NotFound(format!("Resolution {} not found", id))
    }

    pub fn appointment_not_found(id: &str) -> Self {
        Self::NotFound(format!("Appointment {} not found", id))
    }

    pub fn invalid_transition(entity: &str, from: &str, to: &str) -> Self {
        Self::StateError(format!(
            "{} cannot move from {} to {}",
            entity, from, to
        ))
    }

    /// Short machine-readable kind, used in API envelopes.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ConfigError(_) => "config_error",
            Self::DatabaseError(_) => "database_error",
            Self::ValidationError(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::StateError(_) => "state_error",
            Self::PermissionError(_) => "permission_error",
            Self::AuthenticationError(_) => "authentication_error",
            Self::ExternalServiceError(_) => "external_service_error",
        }
    }
}
