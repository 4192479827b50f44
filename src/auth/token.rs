//! Bearer token scopes and plaintext checks.

use std::fmt;

/// Length of a plaintext token: 16 random bytes encoded as unpadded base32.
pub const TOKEN_PLAINTEXT_LEN: usize = 26;

/// Purpose a token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Authentication,
    Activation,
}

impl Scope {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Authentication => "authentication",
            Scope::Activation => "activation",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a plaintext token was rejected before lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenFormatError {
    #[error("token must be provided")]
    Empty,
    #[error("token must be {} bytes long", TOKEN_PLAINTEXT_LEN)]
    Length(usize),
}

/// Check the format of a plaintext token.
pub fn validate_plaintext(token: &str) -> Result<(), TokenFormatError> {
    if token.is_empty() {
        return Err(TokenFormatError::Empty);
    }
    if token.len() != TOKEN_PLAINTEXT_LEN {
        return Err(TokenFormatError::Length(token.len()));
    }
    Ok(())
}

/// Extract the token from an `Authorization` value of the form `Bearer <token>`.
///
/// The value is split on single spaces and must yield exactly two parts.
pub fn parse_bearer(value: &str) -> Option<&str> {
    let mut parts = value.split(' ');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("Bearer"), Some(token), None) => Some(token),
        _ => None,
    }
}
