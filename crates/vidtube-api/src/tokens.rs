use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use vidtube_types::api::{AccessClaims, RefreshClaims};

/// Secrets and lifetimes for the two token kinds. Access and refresh tokens
/// are signed with different secrets, so one can never pass as the other.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub access_ttl: Duration,
    pub refresh_secret: String,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    pub fn issue_access(&self, user_id: Uuid, username: &str) -> anyhow::Result<String> {
        let claims = AccessClaims {
            sub: user_id,
            username: username.to_string(),
            exp: (Utc::now() + self.access_ttl).timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.access_secret.as_bytes()),
        )?;

        Ok(token)
    }

    pub fn issue_refresh(&self, user_id: Uuid) -> anyhow::Result<String> {
        let claims = RefreshClaims {
            sub: user_id,
            jti: Uuid::new_v4(),
            exp: (Utc::now() + self.refresh_ttl).timestamp() as usize,
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.refresh_secret.as_bytes()),
        )?;

        Ok(token)
    }

    pub fn verify_access(&self, token: &str) -> Option<AccessClaims> {
        decode::<AccessClaims>(
            token,
            &DecodingKey::from_secret(self.access_secret.as_bytes()),
            &Validation::default(),
        )
        .ok()
        .map(|data| data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Option<RefreshClaims> {
        decode::<RefreshClaims>(
            token,
            &DecodingKey::from_secret(self.refresh_secret.as_bytes()),
            &Validation::default(),
        )
        .ok()
        .map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TokenConfig {
        TokenConfig {
            access_secret: "access".into(),
            access_ttl: Duration::minutes(15),
            refresh_secret: "refresh".into(),
            refresh_ttl: Duration::hours(240),
        }
    }

    #[test]
    fn access_token_round_trips_claims() {
        let tokens = config();
        let id = Uuid::new_v4();
        let token = tokens.issue_access(id, "alice").unwrap();

        let claims = tokens.verify_access(&token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.username, "alice");
    }

    #[test]
    fn token_kinds_are_not_interchangeable() {
        let tokens = config();
        let id = Uuid::new_v4();

        assert!(tokens.verify_refresh(&tokens.issue_access(id, "alice").unwrap()).is_none());
        assert!(tokens.verify_access(&tokens.issue_refresh(id).unwrap()).is_none());
    }

    #[test]
    fn refresh_tokens_are_unique() {
        let tokens = config();
        let id = Uuid::new_v4();
        assert_ne!(tokens.issue_refresh(id).unwrap(), tokens.issue_refresh(id).unwrap());
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let mut tokens = config();
        tokens.access_ttl = Duration::minutes(-10);
        let token = tokens.issue_access(Uuid::new_v4(), "alice").unwrap();
        assert!(tokens.verify_access(&token).is_none());
    }
}
