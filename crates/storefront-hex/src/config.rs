use anyhow::Context;
use serde::Deserialize;
use std::env;

/// Runtime settings. `SERVER_PORT` falls back to 3000; a missing
/// `DATABASE_URL` selects the in-memory store.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: String,
    pub database_url: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let server_port = env::var("SERVER_PORT").unwrap_or_else(|_| "3000".into());
        server_port
            .parse::<u16>()
            .with_context(|| format!("SERVER_PORT is not a port number: {server_port}"))?;
        let database_url = env::var("DATABASE_URL").ok();
        Ok(Self {
            server_port,
            database_url,
        })
    }
}
