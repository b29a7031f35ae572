use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::authorization::capabilities::{Actor, Role};
use crate::error::GovernanceError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    pub exp: usize,
}

/// Decodes an HS256 bearer token into an actor. Unknown role names are
/// dropped rather than rejected.
pub fn decode_actor(token: &str, secret: &str) -> Result<Actor, GovernanceError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map_err(|e| GovernanceError::AuthenticationError(format!("Invalid token: {}", e)))?;

    let claims = data.claims;
    let roles = claims
        .roles
        .iter()
        .filter_map(|r| {
            let role = Role::from_str(r);
            if role.is_none() {
                warn!("Ignoring unknown role {} for {}", r, claims.sub);
            }
            role
        })
        .collect();

    debug!("Authenticated {}", claims.sub);
    Ok(Actor {
        user_id: claims.sub,
        email: claims.email,
        roles,
    })
}

pub fn issue_token(actor: &Actor, secret: &str, ttl_secs: i64) -> Result<String, GovernanceError> {
    let claims = Claims {
        sub: actor.user_id.clone(),
        email: actor.email.clone(),
        roles: actor.roles.iter().map(|r| r.as_str().to_string()).collect(),
        exp: (Utc::now().timestamp() + ttl_secs).max(0) as usize,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| GovernanceError::AuthenticationError(format!("Failed to sign token: {}", e)))
}
