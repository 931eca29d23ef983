use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use crate::auth::password::{
    calculate_password_strength, hash_password, validate_password_strength, verify_password,
    PasswordPolicy,
};
use crate::auth::{
    AuthError, AuthResponse, JwtService, LoginRequest, PasswordStrengthResponse, RegisterRequest,
    UserRole, UserSession,
};
use crate::error::AppError;
use crate::models::{normalize_email, validate_email, validate_name, User, UserResponse};
use crate::services::gamification_service::LocalCalendar;
use crate::store::{Store, StoreError};

#[derive(Clone)]
pub struct AuthService {
    jwt_service: JwtService,
    store: Arc<dyn Store>,
    password_policy: PasswordPolicy,
    bcrypt_cost: u32,
    calendar: LocalCalendar,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("jwt_service", &self.jwt_service)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    pub fn new(
        store: Arc<dyn Store>,
        jwt_secret: &str,
        session_ttl: Duration,
        bcrypt_cost: u32,
        calendar: LocalCalendar,
    ) -> Self {
        Self {
            jwt_service: JwtService::new(jwt_secret, session_ttl),
            store,
            password_policy: PasswordPolicy::default(),
            bcrypt_cost,
            calendar,
        }
    }

    pub fn session_ttl_seconds(&self) -> i64 {
        self.jwt_service.session_expires_in_seconds() as i64
    }

    /// Scores a password and checks it against the registration policy.
    pub fn check_password(&self, password: &str) -> PasswordStrengthResponse {
        let verdict = validate_password_strength(password, &self.password_policy);
        PasswordStrengthResponse {
            score: calculate_password_strength(password),
            acceptable: verdict.is_ok(),
            message: verdict.err().map(|err| err.message_de()),
        }
    }

    /// Register a new user and open a session for them
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, AppError> {
        validate_email(&request.email)?;
        validate_name(&request.name)?;
        validate_password_strength(&request.password, &self.password_policy)
            .map_err(AuthError::from)?;

        let email = normalize_email(&request.email);
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailAlreadyExists.into());
        }

        let password_hash =
            hash_password(&request.password, self.bcrypt_cost).map_err(AuthError::from)?;
        let user = User::new(&email, &request.name, password_hash, UserRole::User, Utc::now());

        // Two registrations can pass the lookup at once; the unique index decides.
        self.store.insert_user(&user).await.map_err(|err| match err {
            StoreError::Conflict(_) => AppError::from(AuthError::EmailAlreadyExists),
            other => AppError::from(other),
        })?;

        tracing::info!(user_id = %user.id, "user registered");
        self.issue_session(&user)
    }

    /// Login user
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AppError> {
        let email = normalize_email(&request.email);
        let mut user = match self.store.find_user_by_email(&email).await? {
            Some(user) => user,
            None => {
                tracing::warn!("login for unknown email");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !verify_password(&request.password, &user.password_hash).map_err(AuthError::from)? {
            tracing::warn!(user_id = %user.id, "login with wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        user.last_login_at = Some(Utc::now());
        self.store.update_user(&user).await?;

        tracing::info!(user_id = %user.id, "user logged in");
        self.issue_session(&user)
    }

    /// Revoke the session until the moment it would have expired anyway
    pub async fn logout(&self, session: &UserSession) -> Result<(), AuthError> {
        let expires_at = DateTime::<Utc>::from_timestamp(session.expires_at, 0)
            .unwrap_or_else(|| Utc::now() + Duration::seconds(self.session_ttl_seconds()));

        self.store.revoke_token(&session.jti, expires_at).await?;
        tracing::info!(user_id = %session.user_id, "session revoked");
        Ok(())
    }

    /// Check signature, expiry and revocation, then refresh the role from the store
    pub async fn validate_session(&self, token: &str) -> Result<UserSession, AuthError> {
        let mut session = self.jwt_service.extract_user_session(token)?;

        if self.store.is_token_revoked(&session.jti).await? {
            return Err(AuthError::InvalidToken);
        }

        let user = self
            .store
            .find_user(session.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        session.role = user.role;
        session.email = user.email;

        Ok(session)
    }

    /// Current user for a session
    pub async fn me(&self, session: &UserSession) -> Result<UserResponse, AuthError> {
        let user = self
            .store
            .find_user(session.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok(UserResponse::from_user(&user, self.calendar.today()))
    }

    fn issue_session(&self, user: &User) -> Result<AuthResponse, AppError> {
        let token = self
            .jwt_service
            .create_session_token(user.id, &user.email, user.role)?;

        Ok(AuthResponse {
            token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.session_expires_in_seconds(),
            user: UserResponse::from_user(user, self.calendar.today()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use assert_matches::assert_matches;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryStore::new()),
            "test_secret",
            Duration::hours(1),
            4,
            LocalCalendar::default(),
        )
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.to_string(),
            password: "sicher123".to_string(),
            name: "Erika".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_email_and_rejects_duplicates() {
        let service = service();
        let response = service
            .register(register_request("  Erika@Example.COM "))
            .await
            .unwrap();
        assert_eq!(response.user.email, "erika@example.com");
        assert_eq!(response.token_type, "Bearer");

        let duplicate = service.register(register_request("erika@example.com")).await;
        assert_matches!(duplicate, Err(AppError::Auth(AuthError::EmailAlreadyExists)));
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let mut request = register_request("weak@example.com");
        request.password = "short".to_string();

        assert_matches!(
            service().register(request).await,
            Err(AppError::Auth(AuthError::PasswordHashing(_)))
        );
    }

    #[test]
    fn test_check_password_reports_policy_and_score() {
        let service = service();

        let weak = service.check_password("kurz");
        assert!(!weak.acceptable);
        assert_eq!(
            weak.message.as_deref(),
            Some("Das Passwort muss mindestens 8 Zeichen lang sein.")
        );

        let ok = service.check_password("sicher123");
        assert!(ok.acceptable);
        assert_eq!(ok.message, None);

        let strong = service.check_password("Sonnen-Blume_2024!");
        assert!(strong.acceptable);
        assert!(strong.score > ok.score);
        assert!(ok.score > weak.score);
    }

    #[tokio::test]
    async fn test_login_checks_password() {
        let service = service();
        service.register(register_request("a@example.com")).await.unwrap();

        let wrong = service
            .login(LoginRequest {
                email: "a@example.com".to_string(),
                password: "falsch123".to_string(),
            })
            .await;
        assert_matches!(wrong, Err(AppError::Auth(AuthError::InvalidCredentials)));

        let unknown = service
            .login(LoginRequest {
                email: "nobody@example.com".to_string(),
                password: "sicher123".to_string(),
            })
            .await;
        assert_matches!(unknown, Err(AppError::Auth(AuthError::InvalidCredentials)));

        let ok = service
            .login(LoginRequest {
                email: "A@example.com".to_string(),
                password: "sicher123".to_string(),
            })
            .await
            .unwrap();
        assert!(ok.user.last_login_at.is_some());
    }

    #[tokio::test]
    async fn test_logout_revokes_session() {
        let service = service();
        let response = service.register(register_request("b@example.com")).await.unwrap();

        let session = service.validate_session(&response.token).await.unwrap();
        service.logout(&session).await.unwrap();

        assert_matches!(
            service.validate_session(&response.token).await,
            Err(AuthError::InvalidToken)
        );
    }
}
