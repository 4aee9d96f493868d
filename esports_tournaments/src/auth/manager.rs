//! Authentication manager implementation.

use super::{
    errors::{AuthError, AuthResult},
    models::{
        AccessToken, AccessTokenClaims, Actor, AuthConfig, LoginRequest, NewUser,
        RegisterRequest, Role, SeedAccounts, User,
    },
};
use crate::db::UserRepository;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use log::{info, warn};
use std::sync::Arc;

const USERNAME_MIN_CHARS: usize = 3;
const USERNAME_MAX_CHARS: usize = 50;
const EMAIL_MAX_CHARS: usize = 255;
const PASSWORD_MIN_CHARS: usize = 8;

/// Verified against on unknown usernames. Must keep the default Argon2id
/// parameters so both failure paths hash at the same cost.
const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Authentication manager
#[derive(Clone)]
pub struct AuthManager {
    users: Arc<dyn UserRepository>,
    config: AuthConfig,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `users` - Credential store
    /// * `config` - Signing secret, pepper and token lifetime
    pub fn new(users: Arc<dyn UserRepository>, config: AuthConfig) -> Self {
        Self { users, config }
    }

    /// Register a new player account
    ///
    /// # Errors
    ///
    /// * `AuthError::UsernameTaken` - Username already exists
    /// * `AuthError::EmailTaken` - Email already exists
    /// * `AuthError::InvalidUsername` - Username format invalid
    /// * `AuthError::InvalidEmail` - Email format invalid
    /// * `AuthError::WeakPassword` - Password too weak
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<User> {
        validate_username(&request.username)?;
        validate_email(&request.email)?;
        validate_password(&request.password)?;

        let user = self
            .create_user_with_role(&request.username, &request.email, &request.password, Role::Player)
            .await?;

        info!("Registered user {} (id {})", user.username, user.id);
        Ok(user)
    }

    /// Create an account with an explicit role, skipping the public format checks.
    ///
    /// Uniqueness is still enforced.
    pub async fn create_user_with_role(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> AuthResult<User> {
        if self.users.find_by_username(username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.hash_password(password)?;
        self.users
            .create_user(&NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                role,
            })
            .await
    }

    /// Login a user
    ///
    /// Unknown usernames, wrong passwords and inactive accounts all fail with
    /// `AuthError::InvalidCredentials`.
    pub async fn login(&self, request: LoginRequest) -> AuthResult<(User, AccessToken)> {
        let Some(credentials) = self.users.find_by_username(&request.username).await? else {
            let _ = self.verify_password(&request.password, DUMMY_PASSWORD_HASH);
            warn!("Login failed: unknown user {}", request.username);
            return Err(AuthError::InvalidCredentials);
        };

        if self
            .verify_password(&request.password, &credentials.password_hash)
            .is_err()
        {
            warn!("Login failed: wrong password for {}", request.username);
            return Err(AuthError::InvalidCredentials);
        }

        if !credentials.user.is_active {
            warn!("Login failed: inactive account {}", request.username);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_token(&credentials.user)?;
        info!("User {} logged in", credentials.user.username);

        Ok((credentials.user, token))
    }

    /// Sign an access token for `user`
    pub fn issue_token(&self, user: &User) -> AuthResult<AccessToken> {
        let now = Utc::now();
        let ttl = self.config.access_token_ttl;
        let claims = AccessTokenClaims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            exp: (now + ttl).timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )?;

        Ok(AccessToken {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: ttl.num_seconds(),
        })
    }

    /// Verify an access token
    ///
    /// # Returns
    ///
    /// * `AuthResult<AccessTokenClaims>` - Decoded claims or error
    pub fn verify_access_token(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        let token_data = decode::<AccessTokenClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }

    /// Resolve a bearer token to the user it was issued for.
    ///
    /// The user is re-read so that deactivation and role changes apply to
    /// tokens issued earlier.
    pub async fn current_user(&self, token: &str) -> AuthResult<User> {
        let claims = self.verify_access_token(token)?;

        match self.users.find_by_id(claims.sub).await? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(AuthError::InvalidToken),
        }
    }

    /// Resolve a bearer token to an [`Actor`]
    pub async fn authenticate(&self, token: &str) -> AuthResult<Actor> {
        self.current_user(token).await.map(|user| Actor::from(&user))
    }

    /// Ensure the bootstrap accounts exist.
    ///
    /// Creates `admin` and, when a demo password is configured, `organizer1..2`
    /// and `player1..4`. Existing accounts are left untouched.
    ///
    /// # Returns
    ///
    /// * `AuthResult<usize>` - Number of accounts created
    pub async fn seed_accounts(&self, seed: &SeedAccounts) -> AuthResult<usize> {
        let mut accounts = vec![("admin".to_string(), Role::Admin, seed.admin_password.as_str())];
        if let Some(demo_password) = seed.demo_password.as_deref() {
            accounts.extend((1..=2).map(|i| (format!("organizer{i}"), Role::Organizer, demo_password)));
            accounts.extend((1..=4).map(|i| (format!("player{i}"), Role::Player, demo_password)));
        }

        let mut created = 0;
        for (username, role, password) in accounts {
            if self.users.find_by_username(&username).await?.is_some() {
                continue;
            }
            let email = format!("{username}@example.com");
            self.create_user_with_role(&username, &email, password, role)
                .await?;
            created += 1;
        }

        if created > 0 {
            info!("Seeded {} account(s)", created);
        }
        Ok(created)
    }

    /// Hash password with Argon2id + pepper
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        let peppered = format!("{}{}", password, self.config.password_pepper);
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        Ok(argon2
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Verify password against hash
    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<()> {
        let peppered = format!("{}{}", password, self.config.password_pepper);
        let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
        let argon2 = Argon2::default();

        argon2
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)
    }
}

/// Validate username format
fn validate_username(username: &str) -> AuthResult<()> {
    let len = username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&len) {
        return Err(AuthError::InvalidUsername(format!(
            "Username must be {USERNAME_MIN_CHARS}-{USERNAME_MAX_CHARS} characters"
        )));
    }

    if !username.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(AuthError::InvalidUsername(
            "Username can only contain letters, numbers, and underscores".to_string(),
        ));
    }

    Ok(())
}

/// Validate email shape: one `@`, a non-empty local part and a dotted domain
fn validate_email(email: &str) -> AuthResult<()> {
    let invalid = |reason: &str| Err(AuthError::InvalidEmail(reason.to_string()));

    if email.chars().count() > EMAIL_MAX_CHARS {
        return invalid("Email is too long");
    }
    if email.chars().any(char::is_whitespace) {
        return invalid("Email cannot contain whitespace");
    }

    let Some((local, domain)) = email.split_once('@') else {
        return invalid("Email must contain '@'");
    };
    if local.is_empty() || domain.contains('@') {
        return invalid("Email must have exactly one '@' with a name before it");
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return invalid("Email domain must look like example.com");
    }

    Ok(())
}

/// Validate password strength
fn validate_password(password: &str) -> AuthResult<()> {
    if password.chars().count() < PASSWORD_MIN_CHARS {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {PASSWORD_MIN_CHARS} characters"
        )));
    }

    // At least one number, one uppercase, one lowercase
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());

    if !has_digit || !has_uppercase || !has_lowercase {
        return Err(AuthError::WeakPassword(
            "Password must contain at least one number, one uppercase and one lowercase letter"
                .to_string(),
        ));
    }

    Ok(())
}
