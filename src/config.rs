use anyhow::{bail, Context};
use jsonwebtoken::Algorithm;
use serde::Deserialize;

const DEFAULT_POLYGON_BASE_URL: &str = "https://api.polygon.io";
const DEFAULT_FINNHUB_BASE_URL: &str = "https://finnhub.io";
/// One year.
const MAX_TTL_MINUTES: i64 = 60 * 24 * 365;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub algorithm: Algorithm,
    pub ttl_minutes: i64,
}

/// Third-party market data endpoints. Keys are optional so the server can run
/// without them; provider routes fail until they are set.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    pub polygon_api_key: Option<String>,
    pub finnhub_api_key: Option<String>,
    pub polygon_base_url: String,
    pub finnhub_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub jwt: JwtConfig,
    pub providers: ProvidersConfig,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = match lookup("DATABASE_URL") {
            Some(url) => url,
            None => postgres_url_from_parts(&lookup)?,
        };

        let secret = lookup("JWT_SECRET_KEY").context("JWT_SECRET_KEY must be set")?;
        if secret.is_empty() {
            bail!("JWT_SECRET_KEY must not be empty");
        }
        let algorithm = parse_hmac_algorithm(
            lookup("JWT_ALGORITHM").as_deref().unwrap_or("HS256"),
        )?;
        let ttl_minutes = match lookup("JWT_ACCESS_TOKEN_EXPIRE_MINUTES") {
            Some(raw) => parse_ttl_minutes(&raw)?,
            None => 60,
        };

        let providers = ProvidersConfig {
            polygon_api_key: lookup("POLYGON_API_KEY").filter(|k| !k.is_empty()),
            finnhub_api_key: lookup("FINNHUB_API_KEY").filter(|k| !k.is_empty()),
            polygon_base_url: lookup("POLYGON_BASE_URL")
                .unwrap_or_else(|| DEFAULT_POLYGON_BASE_URL.into()),
            finnhub_base_url: lookup("FINNHUB_BASE_URL")
                .unwrap_or_else(|| DEFAULT_FINNHUB_BASE_URL.into()),
        };

        let port = match lookup("APP_PORT") {
            Some(p) => p.parse::<u16>().context("APP_PORT must be a port number")?,
            None => 8080,
        };

        Ok(Self {
            database_url,
            max_connections: lookup("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            jwt: JwtConfig {
                secret,
                algorithm,
                ttl_minutes,
            },
            providers,
            host: lookup("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
        })
    }
}

fn postgres_url_from_parts<F>(lookup: &F) -> anyhow::Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| {
        lookup(key).with_context(|| format!("DATABASE_URL or {key} must be set"))
    };
    Ok(format!(
        "postgres://{}:{}@{}:{}/{}",
        var("POSTGRES_USER")?,
        var("POSTGRES_PASSWORD")?,
        var("POSTGRES_HOST")?,
        var("POSTGRES_PORT")?,
        var("POSTGRES_DB")?,
    ))
}

fn parse_ttl_minutes(raw: &str) -> anyhow::Result<i64> {
    let minutes: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("JWT_ACCESS_TOKEN_EXPIRE_MINUTES {raw} is not a number"))?;
    if !(0..=MAX_TTL_MINUTES).contains(&minutes) {
        bail!("JWT_ACCESS_TOKEN_EXPIRE_MINUTES must be between 0 and {MAX_TTL_MINUTES}");
    }
    Ok(minutes)
}

// Tokens are signed with a shared secret, so only the HMAC family makes sense.
fn parse_hmac_algorithm(raw: &str) -> anyhow::Result<Algorithm> {
    let algorithm: Algorithm = raw
        .parse()
        .with_context(|| format!("unknown JWT_ALGORITHM {raw}"))?;
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => bail!("JWT_ALGORITHM {other:?} is not an HMAC algorithm"),
    }
}
