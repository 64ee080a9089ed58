//! HS256 bearer tokens carrying the user id.

use chrono::{Duration, Utc};
use domains::{TokenError, TokenIssuer, TokenVerifier, UserId};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    user_id: UserId,
    iat: i64,
    exp: i64,
}

pub struct JwtTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtTokens {
    /// Tokens signed with `secret` that expire `ttl` after issue.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }
}

impl TokenIssuer for JwtTokens {
    fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| TokenError::Signing(err.to_string()))
    }
}

impl TokenVerifier for JwtTokens {
    fn verify(&self, token: &str) -> Result<UserId, TokenError> {
        match jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation) {
            Ok(data) => Ok(data.claims.user_id),
            Err(err) => {
                debug!(error = %err, "token rejected");
                match err.kind() {
                    ErrorKind::ExpiredSignature => Err(TokenError::Expired),
                    _ => Err(TokenError::Invalid(err.to_string())),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(secret: &str, ttl: Duration) -> JwtTokens {
        JwtTokens::new(secret.as_bytes(), ttl)
    }

    #[test]
    fn issued_token_verifies_to_the_same_user() {
        let jwt = tokens("secret", Duration::hours(12));
        let token = jwt.issue(42).unwrap();
        assert_eq!(jwt.verify(&token).unwrap(), 42);
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = tokens("secret", Duration::hours(-2));
        let token = jwt.issue(42).unwrap();
        assert_eq!(jwt.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn token_signed_with_another_secret_is_invalid() {
        let token = tokens("one", Duration::hours(1)).issue(42).unwrap();
        let err = tokens("two", Duration::hours(1)).verify(&token).unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn garbage_is_invalid() {
        let err = tokens("secret", Duration::hours(1))
            .verify("not-a-jwt")
            .unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }
}
