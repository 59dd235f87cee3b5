// SPDX-License-Identifier: MIT
//
// Quantum Random Bit Service
// Copyright (c) 2025 Quantum Random Service Contributors

//! Configuration management for the bit service
//!
//! Built once at process start from the environment and then shared read-only
//! with every request. Nothing in the generation path reads the environment.

use crate::source::QubitWidth;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Entropy backend
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(try_from = "String", into = "String")]
pub enum Backend {
    /// Local state-vector simulation
    #[default]
    Simulator,
    /// Remote quantum device
    Hardware,
}

impl Backend {
    /// Label reported in the `X-Backend` header and health output
    pub fn label(&self) -> &'static str {
        match self {
            Self::Simulator => "sim",
            Self::Hardware => "qpu",
        }
    }
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sim" | "simulator" => Ok(Self::Simulator),
            "qpu" | "hardware" => Ok(Self::Hardware),
            other => Err(Error::Validation(format!(
                "unknown backend '{}', expected 'simulator' or 'hardware'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Backend {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Backend> for String {
    fn from(backend: Backend) -> Self {
        backend.label().to_string()
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How the simulator reports its shots
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// One outcome per shot, in execution order
    #[default]
    PerShot,
    /// Outcome frequency table; shot order is lost
    Counts,
}

/// Service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Qubits measured per shot
    #[serde(default = "default_n_qubits")]
    pub n_qubits: usize,

    /// Backend used when a request carries no hint
    #[serde(default)]
    pub backend: Backend,

    /// Shared secret expected in `X-API-Key`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Bind host for HTTP server
    #[serde(default = "default_host")]
    pub host: String,

    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,

    /// PEM certificate; TLS is enabled only when both files exist
    #[serde(default = "default_tls_cert_path")]
    pub tls_cert_path: PathBuf,

    /// PEM private key
    #[serde(default = "default_tls_key_path")]
    pub tls_key_path: PathBuf,

    /// Endpoint of the remote quantum device
    #[serde(default)]
    pub hardware_url: Option<String>,

    /// Upper bound on a single hardware call
    #[serde(default = "default_hardware_timeout_secs")]
    pub hardware_timeout_secs: u64,

    /// Simulator output shape
    #[serde(default)]
    pub sampling_mode: SamplingMode,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            n_qubits: default_n_qubits(),
            backend: Backend::default(),
            api_key: None,
            host: default_host(),
            port: default_port(),
            tls_cert_path: default_tls_cert_path(),
            tls_key_path: default_tls_key_path(),
            hardware_url: None,
            hardware_timeout_secs: default_hardware_timeout_secs(),
            sampling_mode: SamplingMode::default(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::from_iter(vars)
            .map_err(|e| Error::Config(format!("Failed to parse environment variables: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        QubitWidth::new(self.n_qubits)?;

        if let Some(url) = &self.hardware_url {
            Url::parse(url)
                .map_err(|e| Error::Config(format!("Invalid hardware_url '{}': {}", url, e)))?;
        }

        if self.hardware_timeout_secs == 0 {
            return Err(Error::Config("hardware_timeout_secs must be > 0".to_string()));
        }

        if self.host.trim().is_empty() {
            return Err(Error::Config("host cannot be empty".to_string()));
        }

        Ok(())
    }

    pub fn qubit_width(&self) -> Result<QubitWidth> {
        QubitWidth::new(self.n_qubits)
    }

    pub fn hardware_timeout(&self) -> Duration {
        Duration::from_secs(self.hardware_timeout_secs)
    }

    /// Configured API key, treating an empty value as unset
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }

    /// Socket address string for the listener
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Certificate and key paths, if both files are present
    pub fn tls_files(&self) -> Option<(PathBuf, PathBuf)> {
        if self.tls_cert_path.exists() && self.tls_key_path.exists() {
            Some((self.tls_cert_path.clone(), self.tls_key_path.clone()))
        } else {
            None
        }
    }
}

// Default value functions
fn default_n_qubits() -> usize {
    crate::DEFAULT_QUBIT_WIDTH
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9000
}

fn default_tls_cert_path() -> PathBuf {
    PathBuf::from("certs/cert.pem")
}

fn default_tls_key_path() -> PathBuf {
    PathBuf::from("certs/key.pem")
}

fn default_hardware_timeout_secs() -> u64 {
    crate::DEFAULT_HARDWARE_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_from_empty_environment() {
        let config = ServiceConfig::from_vars(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config.n_qubits, 4);
        assert_eq!(config.backend, Backend::Simulator);
        assert_eq!(config.port, 9000);
        assert_eq!(config.hardware_timeout(), Duration::from_secs(30));
        assert_eq!(config.sampling_mode, SamplingMode::PerShot);
        assert!(config.api_key().is_none());
        assert!(config.hardware_url.is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let config = ServiceConfig::from_vars(vars(&[
            ("N_QUBITS", "8"),
            ("BACKEND", "QPU"),
            ("API_KEY", "hogehoge"),
            ("PORT", "9001"),
            ("HARDWARE_URL", "https://qpu.example.com/random"),
            ("SAMPLING_MODE", "counts"),
        ]))
        .unwrap();

        assert_eq!(config.n_qubits, 8);
        assert_eq!(config.backend, Backend::Hardware);
        assert_eq!(config.api_key(), Some("hogehoge"));
        assert_eq!(config.listen_address(), "0.0.0.0:9001");
        assert_eq!(config.sampling_mode, SamplingMode::Counts);
    }

    #[test]
    fn test_empty_api_key_is_unset() {
        let config = ServiceConfig::from_vars(vars(&[("API_KEY", "")])).unwrap();
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(ServiceConfig::from_vars(vars(&[("N_QUBITS", "0")])).is_err());
        assert!(ServiceConfig::from_vars(vars(&[("BACKEND", "gpu")])).is_err());
        assert!(ServiceConfig::from_vars(vars(&[("HARDWARE_URL", "not a url")])).is_err());
        assert!(ServiceConfig::from_vars(vars(&[("HARDWARE_TIMEOUT_SECS", "0")])).is_err());
    }

    #[test]
    fn test_backend_aliases() {
        assert_eq!("sim".parse::<Backend>().unwrap(), Backend::Simulator);
        assert_eq!("Simulator".parse::<Backend>().unwrap(), Backend::Simulator);
        assert_eq!("hardware".parse::<Backend>().unwrap(), Backend::Hardware);
        assert_eq!("qpu".parse::<Backend>().unwrap(), Backend::Hardware);
        assert!("quantum".parse::<Backend>().is_err());
        assert_eq!(Backend::Hardware.to_string(), "qpu");
    }

    #[test]
    fn test_tls_disabled_without_files() {
        let config = ServiceConfig {
            tls_cert_path: PathBuf::from("/nonexistent/cert.pem"),
            tls_key_path: PathBuf::from("/nonexistent/key.pem"),
            ..Default::default()
        };
        assert!(config.tls_files().is_none());
    }
}
