//! HTTP server configuration from the environment.

use std::env;
use std::net::SocketAddr;

use tracing::warn;

/// Runtime configuration for the server binary.
pub struct ServerConfig {
    /// Socket address to bind.
    pub bind_addr: SocketAddr,
    /// PostgreSQL connection string.
    pub database_url: String,
    /// Shared secret for token signing and verification.
    pub token_secret: Vec<u8>,
    /// Maximum pool size override.
    pub pool_max_size: Option<u32>,
}

impl ServerConfig {
    /// Read configuration from the environment.
    ///
    /// `DATABASE_URL` is required. `TOKEN_SECRET` is required in release
    /// builds; debug builds (or `TOKEN_ALLOW_EPHEMERAL=1`) fall back to
    /// a process-local secret, which breaks horizontal scaling and
    /// invalidates tokens on restart, so it warns loudly.
    pub fn from_env() -> std::io::Result<Self> {
        let bind_addr: SocketAddr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_owned())
            .parse()
            .map_err(|err| std::io::Error::other(format!("invalid BIND_ADDR: {err}")))?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| std::io::Error::other("DATABASE_URL is required"))?;

        let token_secret = match env::var("TOKEN_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret.into_bytes(),
            _ => {
                let allow_dev =
                    env::var("TOKEN_ALLOW_EPHEMERAL").ok().as_deref() == Some("1");
                if cfg!(debug_assertions) || allow_dev {
                    warn!("using ephemeral token secret (dev only)");
                    let mut secret = Vec::with_capacity(32);
                    secret.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
                    secret.extend_from_slice(uuid::Uuid::new_v4().as_bytes());
                    secret
                } else {
                    return Err(std::io::Error::other("TOKEN_SECRET is required"));
                }
            }
        };

        let pool_max_size = env::var("DB_POOL_MAX_SIZE")
            .ok()
            .and_then(|raw| raw.parse().ok());

        Ok(Self {
            bind_addr,
            database_url,
            token_secret,
            pool_max_size,
        })
    }
}
