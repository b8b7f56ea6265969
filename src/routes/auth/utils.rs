use anyhow::Context;
use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use chrono::{Duration, Utc};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use super::errors::AuthError;
use super::models::{PasswordResetModel, UserAccountModel};
use super::schemas::{
    AuthData, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    UserAccount,
};
use crate::configuration::JWTSettings;
use crate::constants::{DUMMY_PASSWORD_HASH, PASSWORD_RESET_TOKEN_TTL_HOURS};
use crate::email_client::GenericEmailService;
use crate::email_templates::{password_reset_email, welcome_email};
use crate::repository::Repository;
use crate::utils::{
    generate_jwt_token_for_user, generate_reset_token, hash_token, spawn_blocking_with_tracing,
};

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn compute_password_hash(password: SecretString) -> Result<SecretString, anyhow::Error> {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| anyhow::anyhow!("Failed to encode salt: {}", e))?;
    let params =
        Params::new(15000, 2, 1, None).map_err(|e| anyhow::anyhow!("Invalid params: {}", e))?;
    let password_hash = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();
    Ok(SecretString::from(password_hash))
}

#[tracing::instrument(name = "Hash password", skip(password))]
pub async fn hash_password(password: SecretString) -> Result<SecretString, anyhow::Error> {
    spawn_blocking_with_tracing(move || compute_password_hash(password))
        .await
        .context("Failed to spawn blocking task.")?
}

#[tracing::instrument(
    name = "Validate credentials",
    skip(expected_password_hash, password_candidate)
)]
fn verify_password_hash(
    expected_password_hash: SecretString,
    password_candidate: SecretString,
) -> Result<(), AuthError> {
    let expected_password_hash = PasswordHash::new(expected_password_hash.expose_secret())
        .map_err(|e| anyhow::anyhow!("Failed to parse hash in PHC string format: {}", e))?;

    Argon2::default()
        .verify_password(
            password_candidate.expose_secret().as_bytes(),
            &expected_password_hash,
        )
        .map_err(|e| AuthError::InvalidCredentials(anyhow::anyhow!("Invalid password: {}", e)))
}

/// Unknown users are verified against a dummy hash so both failure paths cost the same.
#[tracing::instrument(name = "Verify password", skip(password, stored_hash))]
pub async fn verify_password(
    password: SecretString,
    stored_hash: Option<String>,
) -> Result<(), AuthError> {
    let user_known = stored_hash.is_some();
    let expected_password_hash =
        SecretString::from(stored_hash.unwrap_or_else(|| DUMMY_PASSWORD_HASH.to_string()));

    spawn_blocking_with_tracing(move || verify_password_hash(expected_password_hash, password))
        .await
        .context("Failed to spawn blocking task.")??;
    if !user_known {
        return Err(AuthError::InvalidCredentials(anyhow::anyhow!("Unknown email")));
    }
    Ok(())
}

pub fn get_auth_data(user: UserAccountModel, jwt: &JWTSettings) -> Result<AuthData, AuthError> {
    let token = generate_jwt_token_for_user(user.id, jwt.expiry, &jwt.secret)?;
    Ok(AuthData {
        token: token.expose_secret().to_string(),
        user: UserAccount::from(user),
    })
}

#[tracing::instrument(name = "Register user", skip(repository, body), fields(email = %body.email))]
pub async fn register_user(
    repository: &dyn Repository,
    body: RegisterRequest,
) -> Result<UserAccountModel, AuthError> {
    let email = normalize_email(&body.email);
    if repository.find_user_by_email(&email).await?.is_some() {
        return Err(AuthError::DuplicateUser);
    }
    let password_hash = hash_password(SecretString::from(body.password)).await?;
    let now = Utc::now();
    let user = UserAccountModel {
        id: Uuid::new_v4(),
        email,
        password_hash: password_hash.expose_secret().to_string(),
        name: body.name.trim().to_string(),
        role: body.role.unwrap_or_default(),
        is_verified: false,
        otp: None,
        otp_expires_at: None,
        created_at: now,
        updated_at: now,
    };
    repository.create_user(&user).await?;
    Ok(user)
}

#[tracing::instrument(name = "Authenticate user", skip(repository, body), fields(email = %body.email))]
pub async fn authenticate_user(
    repository: &dyn Repository,
    body: LoginRequest,
) -> Result<UserAccountModel, AuthError> {
    let user = repository
        .find_user_by_email(&normalize_email(&body.email))
        .await?;
    verify_password(
        SecretString::from(body.password),
        user.as_ref().map(|u| u.password_hash.clone()),
    )
    .await?;
    user.ok_or_else(|| AuthError::InvalidCredentials(anyhow::anyhow!("Unknown email")))
}

#[tracing::instrument(name = "Send welcome email", skip(email_client, user), fields(user_id = %user.id))]
pub async fn send_welcome_email(email_client: &dyn GenericEmailService, user: &UserAccountModel) {
    let email = welcome_email(&user.name);
    if let Err(e) = email_client
        .send_html_email(&user.email, &email.subject, email.html, email.text)
        .await
    {
        tracing::error!("Failed to send welcome email: {:?}", e);
    }
}

/// Issues a reset token when the account exists. Callers answer with the same copy either way.
#[tracing::instrument(
    name = "Request password reset",
    skip(repository, email_client, body),
    fields(attempts = tracing::field::Empty)
)]
pub async fn request_password_reset(
    repository: &dyn Repository,
    email_client: &dyn GenericEmailService,
    frontend_url: &str,
    body: ForgotPasswordRequest,
) -> Result<(), AuthError> {
    let email = normalize_email(&body.email);
    let now = Utc::now();
    let attempts = repository.record_password_reset_attempt(&email, now).await?;
    tracing::Span::current().record("attempts", attempts);

    let user = match repository.find_user_by_email(&email).await? {
        Some(user) => user,
        None => {
            tracing::info!("Password reset requested for unknown email");
            return Ok(());
        }
    };

    let token = generate_reset_token();
    let reset = PasswordResetModel {
        id: Uuid::new_v4(),
        user_id: user.id,
        token_hash: hash_token(token.expose_secret()),
        expires_at: now + Duration::hours(PASSWORD_RESET_TOKEN_TTL_HOURS),
        used: false,
        created_at: now,
    };
    repository.create_password_reset(&reset).await?;

    let reset_link = format!(
        "{}/reset-password?token={}",
        frontend_url,
        token.expose_secret()
    );
    let message = password_reset_email(&user.name, &reset_link, PASSWORD_RESET_TOKEN_TTL_HOURS);
    if let Err(e) = email_client
        .send_html_email(&user.email, &message.subject, message.html, message.text)
        .await
    {
        tracing::error!("Failed to send password reset email: {:?}", e);
    }
    Ok(())
}

#[tracing::instrument(name = "Reset password", skip(repository, body))]
pub async fn reset_password(
    repository: &dyn Repository,
    body: ResetPasswordRequest,
) -> Result<(), AuthError> {
    let reset = repository
        .find_password_reset_by_token_hash(&hash_token(body.token.trim()))
        .await?
        .filter(|reset| reset.is_usable(Utc::now()))
        .ok_or(AuthError::InvalidResetToken)?;
    let password_hash = hash_password(SecretString::from(body.password)).await?;
    let consumed = repository
        .consume_password_reset(reset.id, reset.user_id, password_hash.expose_secret())
        .await?;
    if !consumed {
        return Err(AuthError::InvalidResetToken);
    }
    Ok(())
}
