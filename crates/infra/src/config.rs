//! Gateway configuration, read from the process environment.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_TOKEN_TTL: &str = "1h";
pub const DEFAULT_BROKER_CONNECT_TIMEOUT_MS: u64 = 5_000;
const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is required")]
    Missing { var: &'static str },

    #[error("{var} has an invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Runtime settings for the gateway binary.
#[derive(Clone)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    pub broker_connect_timeout: Duration,
    /// Postgres-backed client directory when set, in-memory otherwise.
    pub database_url: Option<String>,
    /// `MQGATE_DEV=true`: permits the insecure default JWT secret.
    pub dev_mode: bool,
}

impl core::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("broker_connect_timeout", &self.broker_connect_timeout)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("dev_mode", &self.dev_mode)
            .finish()
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let dev_mode = match get("MQGATE_DEV") {
            None => false,
            Some(v) => parse_bool(&v).ok_or_else(|| ConfigError::invalid("MQGATE_DEV", &v, "expected true or false"))?,
        };

        let bind_addr = match (get("BIND_ADDR"), get("PORT_APP")) {
            (Some(addr), _) => addr
                .parse::<SocketAddr>()
                .map_err(|e| ConfigError::invalid("BIND_ADDR", &addr, e.to_string()))?,
            (None, Some(port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|e| ConfigError::invalid("PORT_APP", &port, e.to_string()))?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
            (None, None) => DEFAULT_BIND_ADDR
                .parse::<SocketAddr>()
                .map_err(|e| ConfigError::invalid("BIND_ADDR", DEFAULT_BIND_ADDR, e.to_string()))?,
        };

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) => secret,
            None if dev_mode => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
            None => return Err(ConfigError::Missing { var: "JWT_SECRET" }),
        };

        let ttl_raw = get("TOKEN_EXPIRATION_TIME").unwrap_or_else(|| DEFAULT_TOKEN_TTL.to_string());
        let token_ttl = parse_ttl(&ttl_raw)
            .ok_or_else(|| ConfigError::invalid("TOKEN_EXPIRATION_TIME", &ttl_raw, "expected e.g. 30s, 15m, 1h, 2d or seconds"))?;
        if chrono::Utc::now().checked_add_signed(token_ttl).is_none() {
            return Err(ConfigError::invalid("TOKEN_EXPIRATION_TIME", &ttl_raw, "token expiry would overflow"));
        }

        let broker_connect_timeout = match get("BROKER_CONNECT_TIMEOUT_MS") {
            None => Duration::from_millis(DEFAULT_BROKER_CONNECT_TIMEOUT_MS),
            Some(v) => match v.parse::<u64>() {
                Ok(0) => return Err(ConfigError::invalid("BROKER_CONNECT_TIMEOUT_MS", &v, "must be positive")),
                Ok(ms) => Duration::from_millis(ms),
                Err(e) => return Err(ConfigError::invalid("BROKER_CONNECT_TIMEOUT_MS", &v, e.to_string())),
            },
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl,
            broker_connect_timeout,
            database_url: get("DATABASE_URL"),
            dev_mode,
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// `30s`, `15m`, `1h`, `2d`, or a bare number of seconds. Must be positive.
pub fn parse_ttl(value: &str) -> Option<chrono::Duration> {
    let value = value.trim();
    let (digits, unit) = match value.char_indices().last()? {
        (i, c) if c.is_ascii_alphabetic() => (&value[..i], Some(c.to_ascii_lowercase())),
        _ => (value, None),
    };
    let amount: i64 = digits.trim().parse().ok().filter(|n| *n > 0)?;

    match unit {
        None | Some('s') => chrono::Duration::try_seconds(amount),
        Some('m') => chrono::Duration::try_minutes(amount),
        Some('h') => chrono::Duration::try_hours(amount),
        Some('d') => chrono::Duration::try_days(amount),
        Some(_) => None,
    }
}
