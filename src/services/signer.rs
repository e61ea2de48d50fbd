//! bitcoin.de request signing
//!
//! Every authenticated call carries `X-API-SIGNATURE`, an HMAC-SHA256 over
//! `METHOD#URL#API_KEY#NONCE#MD5(canonical query)` keyed with the API secret.
//! See <https://www.bitcoin.de/de/api/tapi/v2/docu>.

use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha2::Sha256;

use crate::services::bitcoin_de::ApiError;

type HmacSha256 = Hmac<Sha256>;

/// API key pair supplied by the user
#[derive(Clone)]
pub struct ApiCredentials {
    pub public_key: String,
    pub private_key: String,
}

impl ApiCredentials {
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
        }
    }
}

impl std::fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Render `key=value` pairs, sort them and join with `?`.
///
/// No parameters yields the empty string, which is still hashed.
pub fn canonical_query_string(params: &[(&str, &str)]) -> String {
    let mut rendered: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect();
    rendered.sort();
    rendered.join("?")
}

#[derive(Debug, Clone)]
pub struct RequestSigner {
    credentials: ApiCredentials,
}

impl RequestSigner {
    pub fn new(credentials: ApiCredentials) -> Self {
        Self { credentials }
    }

    pub fn public_key(&self) -> &str {
        &self.credentials.public_key
    }

    /// Compute the hex encoded `X-API-SIGNATURE` value
    pub fn sign(
        &self,
        method: &str,
        url: &str,
        nonce: &str,
        params: &[(&str, &str)],
    ) -> Result<String, ApiError> {
        let query_string = canonical_query_string(params);
        let hashed_query_string = hex::encode(Md5::digest(query_string.as_bytes()));

        let message = format!(
            "{}#{}#{}#{}#{}",
            method, url, self.credentials.public_key, nonce, hashed_query_string
        );
        tracing::debug!(message = %message, "Signing bitcoin.de request");

        let mut mac = HmacSha256::new_from_slice(self.credentials.private_key.as_bytes())
            .map_err(|e| ApiError::Signing(e.to_string()))?;
        mac.update(message.as_bytes());

        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}
