//! bitcoin.de trading API client (v2)
//!
//! Authenticated requests are signed with [`RequestSigner`] and throttled by a
//! [`ThrottlePolicy`] that looks at the credits the server reported last.

use chrono::{DateTime, Utc};
use reqwest::{Client, Method, Url};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, DEFAULT_HTTP_TIMEOUT_SECS};
use crate::services::signer::{ApiCredentials, RequestSigner};
use crate::services::throttle::{FixedCooldown, ThrottlePolicy};

pub const TRADE_HISTORY_PATH: &str = "/trades/history";

/// Longest trading pair code the trades table accepts
const MAX_TRADING_PAIR_LEN: usize = 6;

/// Error types for bitcoin.de API calls
#[derive(Debug)]
pub enum ApiError {
    /// Network unreachable, timeout, connection reset
    Transport(String),
    /// Non-success HTTP status
    HttpStatus { status: u16, body: String },
    /// Body was not the JSON we expected
    Decode(String),
    /// Rejected before any request was sent
    InvalidRequest(String),
    Signing(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Transport(msg) => write!(f, "Transport error: {}", msg),
            ApiError::HttpStatus { status, body } => {
                write!(f, "HTTP error {}: {}", status, body)
            }
            ApiError::Decode(msg) => write!(f, "Decode error: {}", msg),
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::Signing(msg) => write!(f, "Signing error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

/// Response of `GET /trades/history`
#[derive(Debug, Clone, Deserialize)]
pub struct TradeHistory {
    pub trading_pair: String,
    #[serde(default)]
    pub trades: Vec<TradeRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TradeRecord {
    pub tid: i64,
    #[serde(deserialize_with = "deserialize_unix_timestamp")]
    pub date: DateTime<Utc>,
    pub price: Decimal,
    pub amount: Decimal,
}

/// Accepts integer, float or numeric string seconds since the epoch
fn deserialize_unix_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let seconds = match &raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| de::Error::custom(format!("invalid unix timestamp: {}", raw)))?;

    DateTime::from_timestamp_millis((seconds * 1000.0).round() as i64)
        .ok_or_else(|| de::Error::custom(format!("unix timestamp out of range: {}", raw)))
}

fn validate_trading_pair(trading_pair: &str) -> Result<(), ApiError> {
    let valid = !trading_pair.is_empty()
        && trading_pair.len() <= MAX_TRADING_PAIR_LEN
        && trading_pair.chars().all(|c| c.is_ascii_alphanumeric());

    if valid {
        Ok(())
    } else {
        Err(ApiError::InvalidRequest(format!(
            "trading_pair must be 1-{} ASCII letters or digits, got {:?}",
            MAX_TRADING_PAIR_LEN, trading_pair
        )))
    }
}

/// Signed, credit-aware bitcoin.de session
pub struct BitcoinDeClient {
    http: Client,
    base_url: String,
    signer: RequestSigner,
    credits: AtomicI64,
    last_nonce: AtomicI64,
    throttle: Arc<dyn ThrottlePolicy>,
}

impl BitcoinDeClient {
    pub fn new(
        credentials: ApiCredentials,
        base_url: impl Into<String>,
        api_credits: i64,
    ) -> Result<Self, ApiError> {
        Self::with_timeout(
            credentials,
            base_url,
            api_credits,
            Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        )
    }

    pub fn with_timeout(
        credentials: ApiCredentials,
        base_url: impl Into<String>,
        api_credits: i64,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            signer: RequestSigner::new(credentials),
            credits: AtomicI64::new(api_credits),
            last_nonce: AtomicI64::new(0),
            throttle: Arc::new(FixedCooldown::default()),
        })
    }

    pub fn from_config(config: &AppConfig, credentials: ApiCredentials) -> Result<Self, ApiError> {
        Ok(Self::with_timeout(
            credentials,
            config.bitcoin_de_api_url.clone(),
            config.initial_credits,
            config.http_timeout,
        )?
        .with_throttle(FixedCooldown::new(
            config.throttle_min_credits,
            config.throttle_cooldown,
        )))
    }

    pub fn with_throttle(mut self, policy: impl ThrottlePolicy + 'static) -> Self {
        self.throttle = Arc::new(policy);
        self
    }

    /// Credits left according to the last successful response
    pub fn credits(&self) -> i64 {
        self.credits.load(Ordering::SeqCst)
    }

    /// Current Unix time, bumped so that nonces never repeat within a session
    fn next_nonce(&self) -> String {
        let now = Utc::now().timestamp();
        let previous = match self
            .last_nonce
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            }) {
            Ok(prev) | Err(prev) => prev,
        };
        now.max(previous + 1).to_string()
    }

    /// Send a signed request and return the decoded JSON body.
    ///
    /// For GET the parameters become the query string and the signature covers
    /// them through the URL; for other methods they are sent form encoded and
    /// hashed into the signature.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        let credits = self.credits();
        match self.throttle.delay_before_request(credits) {
            Some(delay) => {
                warn!(
                    credits,
                    delay_ms = delay.as_millis() as u64,
                    "Not enough API credits (request frequency too high), sleeping"
                );
                tokio::time::sleep(delay).await;
            }
            None => debug!("We have at least {} API credits", credits),
        }

        let is_get = method == Method::GET;
        let target = if is_get && !params.is_empty() {
            Url::parse_with_params(url, params)
        } else {
            Url::parse(url)
        }
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid URL {}: {}", url, e)))?;
        let signed_params: &[(&str, &str)] = if is_get { &[] } else { params };

        let nonce = self.next_nonce();
        let signature = self
            .signer
            .sign(method.as_str(), target.as_str(), &nonce, signed_params)?;

        debug!(method = %method, url = %target, nonce = %nonce, "Sending bitcoin.de request");

        let mut builder = self
            .http
            .request(method, target)
            .header("X-API-KEY", self.signer.public_key())
            .header("X-API-NONCE", &nonce)
            .header("X-API-SIGNATURE", signature);
        if !is_get && !params.is_empty() {
            builder = builder.form(params);
        }

        let response = builder.send().await.map_err(|e| {
            error!(error = %e, "bitcoin.de request failed");
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "Error getting info from bitcoin.de");
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        let body: Value = serde_json::from_slice(&bytes).map_err(|e| {
            error!(error = %e, "Could not parse bitcoin.de response as JSON");
            ApiError::Decode(e.to_string())
        })?;

        match body.get("credits").and_then(Value::as_i64) {
            Some(credits) => {
                self.credits.store(credits, Ordering::SeqCst);
                info!("Credits left: {}", credits);
            }
            None => warn!("bitcoin.de response carried no credits field"),
        }

        Ok(body)
    }

    /// Public trade history, optionally only trades newer than `since_tid`.
    /// A mark of 0 means "from the beginning" and sends no filter.
    pub async fn trade_history(
        &self,
        trading_pair: &str,
        since_tid: Option<i64>,
    ) -> Result<TradeHistory, ApiError> {
        validate_trading_pair(trading_pair)?;

        let since_tid = match since_tid {
            Some(tid) if tid < 0 => {
                return Err(ApiError::InvalidRequest(format!(
                    "since_tid must not be negative, got {}",
                    tid
                )));
            }
            Some(tid) if tid > 0 => Some(tid.to_string()),
            _ => None,
        };

        let mut params = vec![("trading_pair", trading_pair)];
        if let Some(ref tid) = since_tid {
            debug!("since_tid = {}", tid);
            params.push(("since_tid", tid.as_str()));
        }

        let url = format!("{}{}", self.base_url, TRADE_HISTORY_PATH);
        let body = self.request(Method::GET, &url, &params).await?;

        serde_json::from_value(body).map_err(|e| {
            error!(error = %e, "Unexpected trade history payload");
            ApiError::Decode(e.to_string())
        })
    }
}
