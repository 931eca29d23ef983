use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::{AuthError, Claims, UserRole, UserSession};

/// JWT service for issuing and validating session tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_expires_in: Duration,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("encoding_key", &"[REDACTED]")
            .field("decoding_key", &"[REDACTED]")
            .field("session_expires_in", &self.session_expires_in)
            .finish()
    }
}

impl JwtService {
    pub fn new(secret: &str, session_expires_in: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            session_expires_in,
        }
    }

    /// Create a session token for a user
    pub fn create_session_token(
        &self,
        user_id: Uuid,
        email: &str,
        role: UserRole,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now + self.session_expires_in;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            role,
            exp: exp.timestamp() as usize,
            iat: now.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AuthError::Jwt)
    }

    /// Validate and decode a token
    pub fn validate_token(&self, token: &str) -> Result<Claims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|token_data| token_data.claims)
            .map_err(|err| match err.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }

    /// Extract user session from token
    pub fn extract_user_session(&self, token: &str) -> Result<UserSession, AuthError> {
        let claims = self.validate_token(token)?;
        UserSession::from_claims(&claims).map_err(|_| AuthError::InvalidToken)
    }

    pub fn session_expires_in_seconds(&self) -> usize {
        self.session_expires_in.num_seconds() as usize
    }
}

/// Extract bearer token from authorization header
pub fn extract_bearer_token(auth_header: &str) -> Result<&str, AuthError> {
    match auth_header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::InvalidAuthHeaderFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn service() -> JwtService {
        JwtService::new("test_secret", Duration::hours(1))
    }

    #[test]
    fn test_jwt_creation_and_validation() {
        let jwt_service = service();
        let user_id = Uuid::new_v4();

        let token = jwt_service
            .create_session_token(user_id, "erna@example.com", UserRole::User)
            .unwrap();
        let claims = jwt_service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user_id.to_string());
        assert_eq!(claims.email, "erna@example.com");
        assert_eq!(claims.role, UserRole::User);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(extract_bearer_token("Bearer test_token").unwrap(), "test_token");
        assert!(extract_bearer_token("Invalid header").is_err());
        assert!(extract_bearer_token("Bearer ").is_err());
    }

    #[test]
    fn test_user_session_extraction() {
        let jwt_service = service();
        let user_id = Uuid::new_v4();

        let token = jwt_service
            .create_session_token(user_id, "admin@example.com", UserRole::Admin)
            .unwrap();
        let session = jwt_service.extract_user_session(&token).unwrap();

        assert_eq!(session.user_id, user_id);
        assert_eq!(session.role, UserRole::Admin);
        assert!(session.is_admin());
    }

    #[test]
    fn test_tokens_have_unique_ids() {
        let jwt_service = service();
        let user_id = Uuid::new_v4();
        let a = jwt_service.create_session_token(user_id, "a@b.de", UserRole::User).unwrap();
        let b = jwt_service.create_session_token(user_id, "a@b.de", UserRole::User).unwrap();

        let a = jwt_service.validate_token(&a).unwrap();
        let b = jwt_service.validate_token(&b).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_expired_and_foreign_tokens_are_rejected() {
        let expired = JwtService::new("test_secret", Duration::hours(-2));
        let token = expired
            .create_session_token(Uuid::new_v4(), "a@b.de", UserRole::User)
            .unwrap();
        assert_matches!(service().validate_token(&token), Err(AuthError::TokenExpired));

        let other = JwtService::new("other_secret", Duration::hours(1));
        let token = other
            .create_session_token(Uuid::new_v4(), "a@b.de", UserRole::User)
            .unwrap();
        assert_matches!(service().validate_token(&token), Err(AuthError::InvalidToken));
        assert_matches!(service().validate_token("garbage"), Err(AuthError::InvalidToken));
    }
}
