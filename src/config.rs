/*
 * Responsibility
 * - 環境変数の読み込み (PORT, DATABASE_URL, TOKEN_SECRET など)
 * - 設定値のバリデーション (不足・不正なら起動失敗)
 *
 * Notes
 * - TOKEN_SECRET が無ければ認証は無効 (use_auth = false)。ゲートは素通しになる
 * - AUTH_CALL_TIMEOUT_MS は REQUEST_TIMEOUT_SECONDS より短くなければならない
 */
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use chrono::TimeDelta;
use thiserror::Error;

use crate::middleware::http::HttpLimits;
use crate::services::auth::SessionPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Token signing secret; never printed.
#[derive(Clone)]
pub struct TokenSecret(String);

impl TokenSecret {
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenSecret(..)")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub database_url: String,
    pub database_max_connections: u32,

    pub token_secret: Option<TokenSecret>,
    pub session: SessionPolicy,

    pub http: HttpLimits,
    pub call_timeout: Duration,
}

impl Config {
    pub fn use_auth(&self) -> bool {
        self.token_secret.is_some()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source (environment in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(key) {
                None => Ok(default),
                Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
            }
        };
        let seconds = |key: &'static str, default: u64| -> Result<TimeDelta, ConfigError> {
            let secs = i64::try_from(number(key, default)?).map_err(|_| ConfigError::Invalid(key))?;
            TimeDelta::try_seconds(secs).ok_or(ConfigError::Invalid(key))
        };

        let port = u16::try_from(number("PORT", 3000)?).map_err(|_| ConfigError::Invalid("PORT"))?;
        let addr = SocketAddr::from(([0, 0, 0, 0], port));

        let app_env = AppEnv::parse(&lookup("APP_ENV").unwrap_or_default());

        let database_url = lookup("DATABASE_URL")
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let database_max_connections = u32::try_from(number("DATABASE_MAX_CONNECTIONS", 5)?)
            .map_err(|_| ConfigError::Invalid("DATABASE_MAX_CONNECTIONS"))?;

        let token_secret = lookup("TOKEN_SECRET")
            .filter(|s| !s.is_empty())
            .map(TokenSecret);

        let lifespan = seconds("AUTH_DURATION_SECONDS", 30 * 24 * 60 * 60)?;
        let inactivity = seconds("INACTIVITY_DURATION_SECONDS", 5 * 60)?;
        if lifespan <= TimeDelta::zero() {
            return Err(ConfigError::Invalid("AUTH_DURATION_SECONDS"));
        }
        if inactivity <= TimeDelta::zero() {
            return Err(ConfigError::Invalid("INACTIVITY_DURATION_SECONDS"));
        }

        let session = SessionPolicy {
            cookie_name: lookup("SESSION_COOKIE").unwrap_or_else(|| "session".to_string()),
            scheme: lookup("AUTH_SCHEME").unwrap_or_else(|| "oauth2".to_string()),
            lifespan,
            inactivity,
            secure_cookie: app_env.is_production(),
        };

        let http = HttpLimits {
            timeout: Duration::from_secs(number("REQUEST_TIMEOUT_SECONDS", 30)?),
            ..HttpLimits::default()
        };

        let call_timeout = Duration::from_millis(number("AUTH_CALL_TIMEOUT_MS", 5_000)?);
        if call_timeout.is_zero() || call_timeout >= http.timeout {
            return Err(ConfigError::Invalid("AUTH_CALL_TIMEOUT_MS"));
        }

        Ok(Self {
            addr,
            app_env,
            database_url,
            database_max_connections,
            token_secret,
            session,
            http,
            call_timeout,
        })
    }
}
