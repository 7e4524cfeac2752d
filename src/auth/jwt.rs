//! HS256 token signing and validation, assembled directly over HMAC-SHA256.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::AuthError;
use crate::database::models::{User, ROLE_ADMIN};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
struct JwtHeader {
    alg: String,
    typ: String,
}

impl Default for JwtHeader {
    fn default() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Claims carried by every access token: identity, role, and the two
/// document-capability flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Username
    pub name: String,
    /// "Admin" or "User"
    pub role: String,
    pub can_view_documents: bool,
    pub can_upload_documents: bool,
    /// Issued at (Unix timestamp)
    pub iat: u64,
    /// Expiration (Unix timestamp)
    pub exp: u64,
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Admins can always view, regardless of the flag.
    pub fn can_view(&self) -> bool {
        self.can_view_documents || self.is_admin()
    }

    /// Admins can always upload, regardless of the flag.
    pub fn can_upload(&self) -> bool {
        self.can_upload_documents || self.is_admin()
    }
}

/// Sign a token for the user, valid for `expire_days` from now.
pub fn issue_token(user: &User, secret: &str, expire_days: i64) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let exp = now + expire_days * 24 * 60 * 60;
    let claims = Claims {
        sub: user.id.clone(),
        name: user.username.clone(),
        role: user.role.clone(),
        can_view_documents: user.can_view_documents,
        can_upload_documents: user.can_upload_documents,
        iat: now as u64,
        exp: exp.max(0) as u64,
    };

    let header_json =
        serde_json::to_string(&JwtHeader::default()).map_err(|e| AuthError::Hash(e.to_string()))?;
    let payload_json =
        serde_json::to_string(&claims).map_err(|e| AuthError::Hash(e.to_string()))?;

    let header_b64 = URL_SAFE_NO_PAD.encode(header_json.as_bytes());
    let payload_b64 = URL_SAFE_NO_PAD.encode(payload_json.as_bytes());
    let signing_input = format!("{}.{}", header_b64, payload_b64);

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    mac.update(signing_input.as_bytes());
    let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", signing_input, signature_b64))
}

/// Validate signature, algorithm, and expiry, returning the claims.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AuthError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        return Err(AuthError::InvalidToken("malformed token".to_string()));
    }

    let signing_input = format!("{}.{}", parts[0], parts[1]);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AuthError::Hash(e.to_string()))?;
    mac.update(signing_input.as_bytes());

    let expected_signature = URL_SAFE_NO_PAD
        .decode(parts[2])
        .map_err(|_| AuthError::InvalidToken("bad signature encoding".to_string()))?;
    mac.verify_slice(&expected_signature)
        .map_err(|_| AuthError::InvalidToken("signature mismatch".to_string()))?;

    let header_bytes = URL_SAFE_NO_PAD
        .decode(parts[0])
        .map_err(|_| AuthError::InvalidToken("bad header encoding".to_string()))?;
    let header: JwtHeader = serde_json::from_slice(&header_bytes)
        .map_err(|_| AuthError::InvalidToken("bad header".to_string()))?;
    if header.alg != "HS256" {
        return Err(AuthError::InvalidToken("unsupported algorithm".to_string()));
    }

    let payload_bytes = URL_SAFE_NO_PAD
        .decode(parts[1])
        .map_err(|_| AuthError::InvalidToken("bad payload encoding".to_string()))?;
    let claims: Claims = serde_json::from_slice(&payload_bytes)
        .map_err(|_| AuthError::InvalidToken("bad payload".to_string()))?;

    if claims.exp < Utc::now().timestamp() as u64 {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims)
}

/// Pull the token out of an `Authorization: Bearer ...` header value.
pub fn extract_bearer_token(auth_header: Option<&str>) -> Option<&str> {
    auth_header
        .filter(|h| h.starts_with("Bearer "))
        .map(|h| &h["Bearer ".len()..])
}
