pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::GovernanceError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database_url: String,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub identity: IdentityConfig,
    pub email: EmailConfig,
    pub audit: AuditConfig,
    pub portal_url: String,
    pub quorum_rule: QuorumRuleKind,
    pub external_call_timeout_secs: u64,
    pub templates_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    Http,
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub mode: StorageMode,
    pub base_url: String,
    pub api_key: String,
    pub local_dir: String,
    pub public_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub base_url: String,
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    pub enabled: bool,
    pub log_path: String,
    pub server_id: String,
}

/// How PENDING_VOTE resolutions are decided from the tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuorumRuleKind {
    /// Only the privileged adopt/reject commands decide a resolution.
    Manual,
    Majority,
}

impl AppConfig {
    /// Load configuration from `governance.{toml,yaml}` (optional) and
    /// `GOVERNANCE__*` environment variables.
    pub fn load() -> Result<Self, GovernanceError> {
        Self::load_from("governance")
    }

    pub fn load_from(file_stem: &str) -> Result<Self, GovernanceError> {
        let settings = config::Config::builder()
            .set_default("server.host", "0.0.0.0")
            .and_then(|b| b.set_default("server.port", 3000))
            .and_then(|b| b.set_default("database_url", "sqlite://governance.db"))
            .and_then(|b| b.set_default("auth.jwt_secret", "change-me"))
            .and_then(|b| b.set_default("storage.mode", "local"))
            .and_then(|b| b.set_default("storage.base_url", "http://localhost:54321"))
            .and_then(|b| b.set_default("storage.api_key", ""))
            .and_then(|b| b.set_default("storage.local_dir", "./storage"))
            .and_then(|b| b.set_default("storage.public_base_url", "http://localhost:3000/files"))
            .and_then(|b| b.set_default("identity.base_url", "http://localhost:54321/auth/v1"))
            .and_then(|b| b.set_default("identity.api_key", ""))
            .and_then(|b| b.set_default("email.api_url", "https://api.resend.com/emails"))
            .and_then(|b| b.set_default("email.api_key", ""))
            .and_then(|b| b.set_default("email.from_address", "governance@example.com"))
            .and_then(|b| b.set_default("audit.enabled", true))
            .and_then(|b| b.set_default("audit.log_path", "./audit/governance.jsonl"))
            .and_then(|b| b.set_default("audit.server_id", "governance-01"))
            .and_then(|b| b.set_default("portal_url", "http://localhost:3000/portal"))
            .and_then(|b| b.set_default("quorum_rule", "manual"))
            .and_then(|b| b.set_default("external_call_timeout_secs", 30))
            .map_err(|e| GovernanceError::ConfigError(format!("Invalid default: {}", e)))?
            .add_source(config::File::with_name(file_stem).required(false))
            .add_source(
                config::Environment::with_prefix("GOVERNANCE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| {
                GovernanceError::ConfigError(format!("Failed to build configuration: {}", e))
            })?;

        let config: AppConfig = settings
            .try_deserialize()
            .map_err(|e| {
                GovernanceError::ConfigError(format!("Failed to parse configuration: {}", e))
            })?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), GovernanceError> {
        if self.external_call_timeout_secs == 0 {
            return Err(GovernanceError::ConfigError(
                "external_call_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.auth.jwt_secret.is_empty() {
            return Err(GovernanceError::ConfigError(
                "auth.jwt_secret must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn external_call_timeout(&self) -> Duration {
        Duration::from_secs(self.external_call_timeout_secs)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load_without_file() {
        let config = AppConfig::load_from("does-not-exist").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.quorum_rule, QuorumRuleKind::Manual);
        assert_eq!(config.storage.mode, StorageMode::Local);
        assert_eq!(config.external_call_timeout(), Duration::from_secs(30));
    }
}
