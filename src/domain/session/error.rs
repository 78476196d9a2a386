//! Session token errors

use thiserror::Error;

use crate::domain::DomainError;

/// Message returned to clients for every rejected credential
///
/// The specific check that failed is only ever written to internal logs so
/// callers cannot probe which part of a guessed token was wrong.
pub const REAUTHENTICATE_MESSAGE: &str = "Authentication required. Please sign in again.";

/// Errors raised while issuing, verifying, or rotating session tokens
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Access token is malformed: {message}")]
    TokenMalformed { message: String },

    #[error("Access token signature is invalid")]
    SignatureInvalid,

    #[error("Access token has expired")]
    TokenExpired,

    #[error("Refresh token not found")]
    RefreshTokenNotFound,

    #[error("Refresh token has been revoked")]
    RefreshTokenRevoked,

    #[error("Refresh token has expired")]
    RefreshTokenExpired,

    #[error("Token not found")]
    NotFound,

    #[error("User {user_id} is no longer allowed to hold a session")]
    UserNotFound { user_id: i64 },

    #[error(transparent)]
    Store(#[from] DomainError),
}

impl TokenError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::TokenMalformed {
            message: message.into(),
        }
    }

    /// Stable label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::TokenMalformed { .. } => "token_malformed",
            Self::SignatureInvalid => "signature_invalid",
            Self::TokenExpired => "token_expired",
            Self::RefreshTokenNotFound => "refresh_token_not_found",
            Self::RefreshTokenRevoked => "refresh_token_revoked",
            Self::RefreshTokenExpired => "refresh_token_expired",
            Self::NotFound => "not_found",
            Self::UserNotFound { .. } => "user_not_found",
            Self::Store(_) => "store",
        }
    }

    /// True when the caller has to sign in again rather than retry
    pub fn requires_reauthentication(&self) -> bool {
        !matches!(self, Self::Configuration { .. } | Self::Store(_))
    }

    /// Message safe to show to an end user
    pub fn public_message(&self) -> &'static str {
        if self.requires_reauthentication() {
            REAUTHENTICATE_MESSAGE
        } else {
            "Authentication service unavailable"
        }
    }
}
