use std::{env, path::PathBuf};

use anyhow::{Context, Result, anyhow, bail};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_IMAGE_DIR: &str = "Images";
const DEFAULT_PAGE_SIZE: u32 = 5;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct SeedAdmin {
    pub username: String,
    pub password: String,
}

/// Process configuration, read once at startup from the environment (and `.env`).
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub max_connections: u32,
    pub image_dir: PathBuf,
    pub page_size: u32,
    pub max_upload_bytes: usize,
    pub seed_admin: Option<SeedAdmin>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let database_url = lookup("DATABASE_URL").context("DATABASE_URL env var is missing")?;

        let port = parse_or("PORT", &lookup, DEFAULT_PORT)?;
        let max_connections =
            parse_or("DATABASE_MAX_CONNECTIONS", &lookup, DEFAULT_MAX_CONNECTIONS)?;
        let page_size = parse_or("PAGE_SIZE", &lookup, DEFAULT_PAGE_SIZE)?;
        if page_size == 0 {
            bail!("PAGE_SIZE must be greater than zero");
        }
        let max_upload_bytes = parse_or("MAX_UPLOAD_BYTES", &lookup, DEFAULT_MAX_UPLOAD_BYTES)?;

        let image_dir = lookup("IMAGE_DIR")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_IMAGE_DIR));

        let seed_admin = match (lookup("SEED_ADMIN_USERNAME"), lookup("SEED_ADMIN_PASSWORD")) {
            (Some(username), Some(password)) if !username.trim().is_empty() => Some(SeedAdmin {
                username: username.trim().to_string(),
                password,
            }),
            (None, None) => None,
            _ => bail!("SEED_ADMIN_USERNAME and SEED_ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            database_url,
            port,
            max_connections,
            image_dir,
            page_size,
            max_upload_bytes,
            seed_admin,
        })
    }
}

fn parse_or<T>(key: &str, lookup: &impl Fn(&str) -> Option<String>, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|err| anyhow!("invalid value for {key}: {err}")),
        _ => Ok(default),
    }
}
