// SPDX-License-Identifier: MIT
//
// Quantum Random Bit Service
// Copyright (c) 2025 Quantum Random Service Contributors

//! HTTP client for the remote quantum device
//!
//! The device already returns packed bytes, so a successful answer bypasses
//! the simulator, assembler and packer entirely. Every failure mode is an
//! error the generator recovers from by falling back to the simulator.

use crate::packer::{clear_unused_bits, packed_len};
use crate::{Error, Result};
use bytes::Bytes;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Configuration for the hardware client
#[derive(Debug, Clone)]
pub struct HardwareConfig {
    /// Device endpoint
    pub base_url: Url,
    /// Upper bound on one call, connection included
    pub timeout: Duration,
}

impl HardwareConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            timeout: Duration::from_secs(crate::DEFAULT_HARDWARE_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Client for the remote device
#[derive(Debug, Clone)]
pub struct HardwareClient {
    client: Client,
    config: HardwareConfig,
}

impl HardwareClient {
    pub fn new(config: HardwareConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .use_rustls_tls()
            .build()
            .map_err(Error::Network)?;

        Ok(Self { client, config })
    }

    /// Request `n_bits` packed bytes from the device
    ///
    /// Bounded by the configured timeout; no retries are made here.
    #[instrument(skip(self), fields(url = %self.config.base_url))]
    pub async fn fetch(&self, n_bits: usize) -> Result<Bytes> {
        match tokio::time::timeout(self.config.timeout, self.fetch_once(n_bits)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Hardware request exceeded {:?}", self.config.timeout);
                Err(Error::Timeout(self.config.timeout))
            }
        }
    }

    async fn fetch_once(&self, n_bits: usize) -> Result<Bytes> {
        let url = self.build_request_url(n_bits);

        debug!("Requesting {} bits from {}", n_bits, url);

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            warn!("Failed to reach device at {}: {}", url, e);
            if e.is_timeout() {
                Error::Timeout(self.config.timeout)
            } else {
                Error::Network(e)
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Device returned HTTP {}: {}", status, body);
            return Err(Error::Hardware(format!("HTTP {}: {}", status, body)));
        }

        let data = response.bytes().await.map_err(Error::Network)?;
        let data = self.validate_response(data, n_bits)?;

        debug!("Received {} bytes from device", data.len());
        Ok(data)
    }

    fn build_request_url(&self, n_bits: usize) -> Url {
        let mut url = self.config.base_url.clone();
        url.query_pairs_mut()
            .append_pair("n_bits", &n_bits.to_string());
        url
    }

    /// Enforce the packed length and clear padding bits in the last byte
    fn validate_response(&self, data: Bytes, n_bits: usize) -> Result<Bytes> {
        let expected = packed_len(n_bits);
        if data.len() != expected {
            return Err(Error::Hardware(format!(
                "device returned {} bytes, expected {}",
                data.len(),
                expected
            )));
        }

        let mut buf = data.to_vec();
        clear_unused_bits(&mut buf, n_bits);
        Ok(Bytes::from(buf))
    }

    pub fn config(&self) -> &HardwareConfig {
        &self.config
    }
}
