use actix_web::dev::ServiceRequest;
use actix_web::http;
use actix_web::rt::task::JoinHandle;
use blake2::{Blake2b512, Digest};
use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm as JWTAlgorithm, DecodingKey, EncodingKey, Header, Validation,
};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use crate::constants::{CUSTOM_ORDER_ID_PREFIX, PASSWORD_RESET_TOKEN_BYTES};
use crate::errors::CustomJWTTokenError;
use crate::schemas::JWTClaims;

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

pub fn spawn_blocking_with_tracing<F, R>(f: F) -> JoinHandle<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let current_span = tracing::Span::current();
    actix_web::rt::task::spawn_blocking(move || current_span.in_scope(f))
}

#[tracing::instrument(name = "Generate JWT token for user", skip(secret))]
pub fn generate_jwt_token_for_user(
    user_id: Uuid,
    expiry_time: i64,
    secret: &SecretString,
) -> Result<SecretString, anyhow::Error> {
    let issued_at = Utc::now();
    let expiration = issued_at
        .checked_add_signed(Duration::hours(expiry_time))
        .ok_or_else(|| anyhow::anyhow!("Invalid token expiry"))?;
    let claims: JWTClaims = JWTClaims {
        sub: user_id,
        exp: expiration.timestamp() as usize,
        iat: issued_at.timestamp() as usize,
    };
    let header = Header::new(JWTAlgorithm::HS256);
    let encoding_key = EncodingKey::from_secret(secret.expose_secret().as_bytes());
    let token: String = encode(&header, &claims, &encoding_key)?;
    Ok(SecretString::from(token))
}

#[tracing::instrument(name = "Decode JWT token", skip(token, secret))]
pub fn decode_token<T: Into<String>>(
    token: T,
    secret: &SecretString,
) -> Result<Uuid, CustomJWTTokenError> {
    let decoding_key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
    let decoded = decode::<JWTClaims>(
        &token.into(),
        &decoding_key,
        &Validation::new(JWTAlgorithm::HS256),
    );
    match decoded {
        Ok(token) => Ok(token.claims.sub),
        Err(e) => match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(CustomJWTTokenError::Expired),
            _ => Err(CustomJWTTokenError::Invalid("Invalid Token".to_string())),
        },
    }
}

pub fn get_header_value(req: &ServiceRequest, header_name: &str) -> Option<String> {
    req.headers()
        .get(header_name)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.to_string())
}

pub fn get_bearer_token(req: &ServiceRequest) -> Option<String> {
    get_header_value(req, http::header::AUTHORIZATION.as_str()).and_then(|value| {
        let (scheme, token) = value.split_once(' ')?;
        let token = token.trim();
        if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
            Some(token.to_string())
        } else {
            None
        }
    })
}

/// `ORD-<unix millis>-<8 hex chars>`: collision resistant within a process, not globally unique.
pub fn generate_custom_order_id() -> String {
    let mut suffix = [0u8; 4];
    rand::rng().fill_bytes(&mut suffix);
    format!(
        "{}-{}-{}",
        CUSTOM_ORDER_ID_PREFIX,
        Utc::now().timestamp_millis(),
        hex::encode(suffix)
    )
}

pub fn generate_reset_token() -> SecretString {
    let mut bytes = [0u8; PASSWORD_RESET_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    SecretString::from(hex::encode(bytes))
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Blake2b512::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
