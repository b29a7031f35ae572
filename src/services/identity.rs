//! Account identity service: find-by-email and create-with-password.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::error::GovernanceError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: String,
    pub email: String,
}

#[async_trait]
pub trait IdentityService: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, GovernanceError>;

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<UserAccount, GovernanceError>;
}

/// Admin API of the auth service (`/admin/users`).
pub struct HttpIdentityService {
    base_url: String,
    api_key: String,
    http_client: Client,
}

#[derive(Deserialize)]
struct UserList {
    #[serde(default)]
    users: Vec<UserAccount>,
}

impl HttpIdentityService {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, GovernanceError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http_client,
        })
    }
}

#[async_trait]
impl IdentityService for HttpIdentityService {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, GovernanceError> {
        let url = format!("{}/admin/users", self.base_url);
        debug!("Looking up account for {}", email);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .query(&[("email", email)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GovernanceError::ExternalServiceError(format!(
                "Account lookup failed with {}",
                response.status()
            )));
        }

        let list: UserList = response.json().await?;
        Ok(list
            .users
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email)))
    }

    async fn create_user(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<UserAccount, GovernanceError> {
        let url = format!("{}/admin/users", self.base_url);
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "email_confirm": true,
                "user_metadata": {"full_name": full_name},
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GovernanceError::ExternalServiceError(format!(
                "Account creation for {} failed with {}: {}",
                email, status, text
            )));
        }

        let account: UserAccount = response.json().await?;
        info!("Created account {} for {}", account.id, email);
        Ok(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_find_by_email_matches_case_insensitively() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/users"))
            .and(query_param("email", "jane@example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "users": [{"id": "u-1", "email": "Jane@Example.com"}]
            })))
            .mount(&server)
            .await;

        let service = HttpIdentityService::new(&server.uri(), "k", Duration::from_secs(5)).unwrap();
        let found = service.find_by_email("jane@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some("u-1".to_string()));
    }

    #[tokio::test]
    async fn test_create_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/users"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "u-2", "email": "new@example.com"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let service = HttpIdentityService::new(&server.uri(), "k", Duration::from_secs(5)).unwrap();
        let account = service
            .create_user("new@example.com", "Temp#Passw0rd123", "New Officer")
            .await
            .unwrap();
        assert_eq!(account.id, "u-2");
    }
}
