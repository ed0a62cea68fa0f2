use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use tracing::warn;

const DEFAULT_JWT_SECRET: &str = "dev-secret-change-me";

/// Super-admin account created at startup when its username is free.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub jwt_ttl_minutes: i64,
    pub admin: Option<AdminSeed>,
}

impl Config {
    /// Read `RIBBIT_*` variables. Call after `dotenvy::dotenv()`.
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = env::var("RIBBIT_JWT_SECRET").unwrap_or_else(|_| {
            warn!("RIBBIT_JWT_SECRET not set, using the development secret");
            DEFAULT_JWT_SECRET.into()
        });

        let port = var_or("RIBBIT_PORT", "3000")
            .parse()
            .context("RIBBIT_PORT must be a port number")?;
        let jwt_ttl_minutes = var_or("RIBBIT_JWT_TTL_MINUTES", "60")
            .parse()
            .context("RIBBIT_JWT_TTL_MINUTES must be an integer")?;

        let admin = match (
            env::var("RIBBIT_ADMIN_USERNAME"),
            env::var("RIBBIT_ADMIN_EMAIL"),
            env::var("RIBBIT_ADMIN_PASSWORD"),
        ) {
            (Ok(username), Ok(email), Ok(password)) => Some(AdminSeed {
                username,
                email,
                password,
            }),
            (Ok(_), _, _) => {
                warn!("RIBBIT_ADMIN_USERNAME set without email or password, skipping admin seed");
                None
            }
            _ => None,
        };

        Ok(Self {
            host: var_or("RIBBIT_HOST", "0.0.0.0"),
            port,
            db_path: PathBuf::from(var_or("RIBBIT_DB_PATH", "ribbit.db")),
            jwt_secret,
            jwt_ttl_minutes,
            admin,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.into())
}
