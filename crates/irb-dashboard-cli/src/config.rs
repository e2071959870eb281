use std::{
    collections::HashMap,
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use irb_dashboard_core::{LayoutOptions, ServeMode, StylePolicy};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub mode: ServeMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8050,
            mode: ServeMode::Dashboard,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Layered dashboard configuration: defaults, then an optional file, then
/// `IRB_DASHBOARD__*` variables, then `PORT`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub server: ServerConfig,
    /// Metrics document; the built-in sample is used when unset.
    pub metrics: Option<PathBuf>,
    pub layout: LayoutOptions,
    pub style: StylePolicy,
}

impl DashboardConfig {
    const ENV_PREFIX: &'static str = "IRB_DASHBOARD";
    const PORT_ENV: &'static str = "PORT";

    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_from(path, std::env::vars().collect())
    }

    fn load_from(path: Option<&Path>, vars: HashMap<String, String>) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(Self::ENV_PREFIX)
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.clone())),
        );
        if let Some(raw) = vars
            .get(Self::PORT_ENV)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
        {
            let port: u16 = raw.parse().with_context(|| {
                format!(
                    "environment variable {} must be a port number (got `{raw}`)",
                    Self::PORT_ENV
                )
            })?;
            builder = builder.set_override("server.port", i64::from(port))?;
        }

        let source = path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "environment".to_string());
        builder
            .build()
            .and_then(Config::try_deserialize)
            .with_context(|| format!("invalid dashboard configuration from {source}"))
    }
}
