//! Session token issuance and verification.
//!
//! Wire form is `base64(JSON payload).hex(HMAC-SHA256 signature)`. Tokens
//! are tamper-evident without any server-side storage: verification
//! recomputes the MAC under the shared secret and checks expiry.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Token verification failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Wrong wire shape, undecodable payload, or unparseable JSON.
    #[error("malformed token")]
    Malformed,

    /// Signature does not recompute from the payload bytes.
    #[error("bad token signature")]
    BadSignature,

    /// Expiry is not strictly in the future.
    #[error("token expired")]
    Expired,
}

/// Signed token payload.
///
/// A missing `exp` deserializes to 0 and therefore always verifies as
/// expired. `rand` makes two tokens issued in the same second differ.
#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    username: String,
    #[serde(default)]
    exp: i64,
    #[serde(default)]
    rand: String,
}

/// Issues and verifies signed session tokens.
#[derive(Clone)]
pub struct TokenService {
    secret: String,
    expiry_secs: i64,
}

impl TokenService {
    /// Create a token service with the given signing secret and lifetime.
    pub fn new(secret: impl Into<String>, expiry_secs: i64) -> Self {
        Self {
            secret: secret.into(),
            expiry_secs,
        }
    }

    /// Issue a fresh token for a username.
    pub fn issue(&self, username: &str) -> String {
        let mut nonce = [0u8; 16];
        rand::rng().fill_bytes(&mut nonce);

        let payload = TokenPayload {
            username: username.to_string(),
            exp: Utc::now().timestamp() + self.expiry_secs,
            rand: hex::encode(nonce),
        };

        let json = serde_json::to_vec(&payload).expect("token payload serializes");
        let data = BASE64.encode(json);
        let signature = hex::encode(self.mac(data.as_bytes()));

        format!("{data}.{signature}")
    }

    /// Verify a token and return the embedded username.
    ///
    /// The caller is responsible for matching the username against any
    /// expected identity.
    pub fn verify(&self, token: &str) -> Result<String, TokenError> {
        let parts: Vec<&str> = token.split('.').collect();
        let [data, signature] = parts.as_slice() else {
            return Err(TokenError::Malformed);
        };

        // Constant-time comparison via Mac::verify_slice; a non-hex
        // signature can never match either.
        let supplied = hex::decode(signature).map_err(|_| TokenError::BadSignature)?;
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(data.as_bytes());
        mac.verify_slice(&supplied)
            .map_err(|_| TokenError::BadSignature)?;

        let raw = BASE64.decode(data).map_err(|_| TokenError::Malformed)?;
        let payload: TokenPayload =
            serde_json::from_slice(&raw).map_err(|_| TokenError::Malformed)?;

        if payload.exp <= Utc::now().timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(payload.username)
    }

    fn mac(&self, data: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(data);
        mac.finalize().into_bytes().to_vec()
    }
}
