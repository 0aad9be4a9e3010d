//! Identity tokens
//!
//! Turns a bearer token into a verified [`Identity`] using the `jsonwebtoken` crate.

use chat_core::{Identity, UserId};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Display name bound to the connection
    pub username: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Get the user ID
    ///
    /// # Errors
    /// Returns an error if the subject is not a positive integer
    pub fn user_id(&self) -> Result<UserId, AppError> {
        self.sub
            .parse::<UserId>()
            .ok()
            .filter(UserId::is_valid)
            .ok_or(AppError::InvalidToken)
    }

    /// Convert the claims into the identity bound at admission
    ///
    /// # Errors
    /// Returns an error if the subject is malformed or the username is empty
    pub fn identity(&self) -> Result<Identity, AppError> {
        let user_id = self.user_id()?;
        if self.username.trim().is_empty() {
            return Err(AppError::InvalidToken);
        }
        Ok(Identity::new(user_id, self.username.clone()))
    }

    /// Check if the token is expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// JWT service for verifying (and, for tooling, issuing) identity tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry: i64,
}

impl JwtService {
    /// Default lifetime of issued tokens (24 hours)
    pub const DEFAULT_EXPIRY_SECS: i64 = 86_400;

    /// Create a new JWT service with the given secret
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self::with_expiry(secret, Self::DEFAULT_EXPIRY_SECS)
    }

    /// Create a new JWT service with a custom token lifetime
    #[must_use]
    pub fn with_expiry(secret: &str, token_expiry: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_expiry,
        }
    }

    /// Issue a token for an identity
    ///
    /// # Errors
    /// Returns an error if token encoding fails
    pub fn issue(&self, identity: &Identity) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: identity.user_id.to_string(),
            username: identity.username.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.token_expiry)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to encode JWT")))
    }

    /// Decode and validate a JWT token
    ///
    /// # Errors
    /// Returns an error if the token is invalid or expired
    pub fn decode_token(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::default();

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::InvalidToken,
            }
        })?;

        Ok(token_data.claims)
    }

    /// Verify a token and return the identity it carries
    ///
    /// # Errors
    /// Returns an error if the token is missing claims, invalid, or expired
    pub fn verify(&self, token: &str) -> Result<Identity, AppError> {
        if token.is_empty() {
            return Err(AppError::MissingAuth);
        }
        self.decode_token(token)?.identity()
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("token_expiry", &self.token_expiry)
            .finish_non_exhaustive()
    }
}
