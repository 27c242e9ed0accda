// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration for the Marquez client.
//!
//! The client is normally configured from a YAML file:
//!
//! ```yaml
//! marquez_host:
//!   hostname: http://localhost
//!   port: 5000
//! timeout_ms: 10000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ClientError, Result};

/// Path segment appended to `{hostname}:{port}` for every request.
pub const API_PATH: &str = "api/v1";

const DEFAULT_HOSTNAME: &str = "http://localhost";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Configuration for the MarquezClient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Service hostname, optionally with scheme (`http://marquez`).
    pub hostname: String,
    /// Service port.
    pub port: u16,
    /// Per-request timeout handed to the transport.
    pub request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    marquez_host: Option<HostDescriptor>,
    timeout_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct HostDescriptor {
    hostname: String,
    port: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            port: DEFAULT_PORT,
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl ClientConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration file.
    ///
    /// Fails with `ClientError::Config` if the path is empty, the file cannot be
    /// read or parsed, or it has no `marquez_host` descriptor.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(ClientError::Config(
                "a configuration file path is required".to_string(),
            ));
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;

        Self::from_yaml_str(&contents)
    }

    /// Parse a configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(yaml)?;

        let host = file.marquez_host.ok_or_else(|| {
            ClientError::Config("missing marquez_host attribute in the config".to_string())
        })?;

        if host.hostname.trim().is_empty() {
            return Err(ClientError::Config(
                "marquez_host.hostname must not be empty".to_string(),
            ));
        }

        Ok(Self {
            hostname: host.hostname,
            port: host.port,
            request_timeout: Duration::from_millis(file.timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)),
        })
    }

    /// Create a configuration from environment variables.
    ///
    /// Environment variables:
    /// - `MARQUEZ_CONFIG`: Path to a YAML config file (takes precedence when set)
    /// - `MARQUEZ_HOST`: Service hostname (default: "http://localhost")
    /// - `MARQUEZ_PORT`: Service port (default: 5000)
    /// - `MARQUEZ_TIMEOUT_MS`: Request timeout in milliseconds (default: 30000)
    pub fn from_env() -> Result<Self> {
        if let Ok(path) = std::env::var("MARQUEZ_CONFIG") {
            return Self::from_path(path);
        }

        let hostname =
            std::env::var("MARQUEZ_HOST").unwrap_or_else(|_| DEFAULT_HOSTNAME.to_string());

        let port: u16 = std::env::var("MARQUEZ_PORT")
            .unwrap_or_else(|_| DEFAULT_PORT.to_string())
            .parse()
            .map_err(|e| ClientError::Config(format!("invalid MARQUEZ_PORT: {}", e)))?;

        let timeout_ms: u64 = std::env::var("MARQUEZ_TIMEOUT_MS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_MS.to_string())
            .parse()
            .map_err(|e| ClientError::Config(format!("invalid MARQUEZ_TIMEOUT_MS: {}", e)))?;

        Ok(Self {
            hostname,
            port,
            request_timeout: Duration::from_millis(timeout_ms),
        })
    }

    /// Base URL in the form `{hostname}:{port}/api/v1`.
    pub fn base_url(&self) -> String {
        format!("{}:{}/{}", self.hostname, self.port, API_PATH)
    }

    /// Set the hostname.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
