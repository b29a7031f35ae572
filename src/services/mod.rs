//! External collaborators: object storage, account identity and email.

pub mod email;
pub mod identity;
pub mod storage;

use std::sync::Arc;

use crate::config::{AppConfig, StorageMode};
use crate::error::GovernanceError;

pub use email::{EmailMessage, HttpEmailSender, Notifier};
pub use identity::{HttpIdentityService, IdentityService, UserAccount};
pub use storage::{HttpObjectStorage, LocalObjectStorage, ObjectStorage};

/// Collaborators built from configuration, shared behind trait objects.
#[derive(Clone)]
pub struct Services {
    pub storage: Arc<dyn ObjectStorage>,
    pub identity: Arc<dyn IdentityService>,
    pub notifier: Arc<dyn Notifier>,
}

impl Services {
    pub fn from_config(config: &AppConfig) -> Result<Self, GovernanceError> {
        let timeout = config.external_call_timeout();

        let storage: Arc<dyn ObjectStorage> = match config.storage.mode {
            StorageMode::Http => Arc::new(HttpObjectStorage::new(
                &config.storage.base_url,
                &config.storage.api_key,
                timeout,
            )?),
            StorageMode::Local => Arc::new(LocalObjectStorage::new(
                &config.storage.local_dir,
                &config.storage.public_base_url,
            )),
        };

        Ok(Self {
            storage,
            identity: Arc::new(HttpIdentityService::new(
                &config.identity.base_url,
                &config.identity.api_key,
                timeout,
            )?),
            notifier: Arc::new(HttpEmailSender::new(
                &config.email.api_url,
                &config.email.api_key,
                &config.email.from_address,
                timeout,
            )?),
        })
    }
}
