use log::info;
use uuid::Uuid;

use super::jwt;
use super::password::{hash_password, validate_password, verify_password};
use super::AuthError;
use crate::config::JwtConfig;
use crate::database::models::{User, UserDto, ROLE_ADMIN, ROLE_USER};
use crate::database::Database;

const BOOTSTRAP_ADMIN_USERNAME: &str = "admin";

/// Registration, login, token issuance, and permission management.
#[derive(Clone)]
pub struct AuthService {
    db: Database,
    jwt: JwtConfig,
}

impl AuthService {
    pub fn new(db: Database, jwt: JwtConfig) -> Self {
        Self { db, jwt }
    }

    /// Create an account and return its first access token.
    ///
    /// New users can view documents but not upload; admins get both flags.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        is_admin: bool,
    ) -> Result<String, AuthError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AuthError::Validation("Username cannot be empty.".to_string()));
        }
        validate_password(password)?;

        if self.db.find_user_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: hash_password(password)?,
            role: if is_admin { ROLE_ADMIN } else { ROLE_USER }.to_string(),
            can_view_documents: true,
            can_upload_documents: is_admin,
        };

        self.db.insert_user(user.clone()).await?;
        info!("Registered new {} account: {}", user.role, user.username);

        self.issue_token(&user)
    }

    /// Authenticate and return a fresh token. Unknown usernames and wrong
    /// passwords fail identically.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let user = self
            .db
            .find_user_by_username(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_token(&user)
    }

    pub fn validate_token(&self, token: &str) -> Result<jwt::Claims, AuthError> {
        jwt::validate_token(token, &self.jwt.secret)
    }

    /// Returns false when the user does not exist.
    pub async fn update_permissions(
        &self,
        user_id: &str,
        can_view_documents: bool,
        can_upload_documents: bool,
    ) -> Result<bool, AuthError> {
        Ok(self
            .db
            .update_user_permissions(user_id, can_view_documents, can_upload_documents)
            .await?)
    }

    pub async fn list_users(&self) -> Result<Vec<UserDto>, AuthError> {
        let users = self.db.list_users().await?;
        Ok(users.into_iter().map(UserDto::from).collect())
    }

    /// Create the bootstrap admin account if it is missing. Returns true when
    /// an account was created.
    pub async fn seed_admin(&self, password: &str) -> Result<bool, AuthError> {
        if self
            .db
            .find_user_by_username(BOOTSTRAP_ADMIN_USERNAME)
            .await?
            .is_some()
        {
            return Ok(false);
        }

        let admin = User {
            id: Uuid::new_v4().to_string(),
            username: BOOTSTRAP_ADMIN_USERNAME.to_string(),
            password_hash: hash_password(password)?,
            role: ROLE_ADMIN.to_string(),
            can_view_documents: true,
            can_upload_documents: true,
        };
        self.db.insert_user(admin).await?;

        info!("Bootstrap admin account created");
        Ok(true)
    }

    fn issue_token(&self, user: &User) -> Result<String, AuthError> {
        jwt::issue_token(user, &self.jwt.secret, self.jwt.expire_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn service() -> (AuthService, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(dir.path().join("auth-test.db")).await.unwrap();
        let jwt = JwtConfig {
            secret: "unit-test-secret".to_string(),
            expire_days: 1,
        };
        (AuthService::new(db, jwt), dir)
    }

    #[tokio::test]
    async fn register_then_login() {
        let (auth, _dir) = service().await;

        let token = auth.register("alice", "hunter22", false).await.unwrap();
        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.name, "alice");
        assert_eq!(claims.role, ROLE_USER);
        assert!(claims.can_view_documents);
        assert!(!claims.can_upload_documents);

        let token = auth.login("alice", "hunter22").await.unwrap();
        assert!(auth.validate_token(&token).is_ok());
    }

    #[tokio::test]
    async fn duplicate_usernames_are_rejected() {
        let (auth, _dir) = service().await;
        auth.register("alice", "hunter22", false).await.unwrap();
        assert!(matches!(
            auth.register("alice", "other-password", false).await,
            Err(AuthError::UsernameTaken)
        ));
    }

    #[tokio::test]
    async fn bad_credentials_fail_uniformly() {
        let (auth, _dir) = service().await;
        auth.register("alice", "hunter22", false).await.unwrap();

        assert!(matches!(
            auth.login("alice", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody", "hunter22").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn admin_registration_grants_both_flags() {
        let (auth, _dir) = service().await;
        let token = auth.register("root", "hunter22", true).await.unwrap();
        let claims = auth.validate_token(&token).unwrap();
        assert_eq!(claims.role, ROLE_ADMIN);
        assert!(claims.can_upload_documents);
    }

    #[tokio::test]
    async fn seed_admin_is_idempotent() {
        let (auth, _dir) = service().await;
        assert!(auth.seed_admin("bootpass").await.unwrap());
        assert!(!auth.seed_admin("bootpass").await.unwrap());
        assert!(auth.login("admin", "bootpass").await.is_ok());
    }

    #[tokio::test]
    async fn permission_updates_show_up_in_listing() {
        let (auth, _dir) = service().await;
        auth.register("alice", "hunter22", false).await.unwrap();

        let users = auth.list_users().await.unwrap();
        let alice = users.iter().find(|u| u.username == "alice").unwrap();
        assert!(!alice.can_upload_documents);

        assert!(auth
            .update_permissions(&alice.id, true, true)
            .await
            .unwrap());

        let users = auth.list_users().await.unwrap();
        let alice = users.iter().find(|u| u.username == "alice").unwrap();
        assert!(alice.can_upload_documents);

        assert!(!auth.update_permissions("missing-id", true, true).await.unwrap());
    }
}
