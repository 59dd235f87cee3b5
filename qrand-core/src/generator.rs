// SPDX-License-Identifier: MIT
//
// Quantum Random Bit Service
// Copyright (c) 2025 Quantum Random Service Contributors

//! Backend selection and fallback
//!
//! ```text
//!                 hint / default
//!                       │
//!          ┌────────────┴────────────┐
//!          ▼                         ▼
//!   ATTEMPT_HARDWARE ──error──▶ USE_SIMULATOR
//!          │                         │
//!        bytes                 source → assemble → pack
//! ```
//!
//! The hardware attempt returns a plain `Result`; this module alone decides
//! to fall back. There is exactly one hardware attempt per request and the
//! simulator is terminal. The reported backend is the one that produced the
//! bytes.

use crate::bits::assemble;
use crate::config::{Backend, ServiceConfig};
use crate::hardware::{HardwareClient, HardwareConfig};
use crate::packer::pack_lsb_first;
use crate::source::{shot_count, EntropySource, QubitWidth, SimulatorSource};
use crate::{Error, Result};
use bytes::Bytes;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// A request for random bits
#[derive(Debug, Clone, Deserialize)]
pub struct BitRequest {
    /// Signed so that non-positive counts reach validation instead of failing to parse
    pub n_bits: i64,
    #[serde(default)]
    pub backend: Option<Backend>,
}

impl BitRequest {
    pub fn new(n_bits: i64) -> Self {
        Self {
            n_bits,
            backend: None,
        }
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Checked bit count
    pub fn validate(&self) -> Result<usize> {
        if self.n_bits <= 0 {
            return Err(Error::Validation("n_bits must be positive".to_string()));
        }
        if self.n_bits > crate::MAX_BITS as i64 {
            return Err(Error::Validation(format!(
                "n_bits must be <= {}",
                crate::MAX_BITS
            )));
        }
        Ok(self.n_bits as usize)
    }
}

/// Result of one generation
#[derive(Debug, Clone)]
pub struct Generation {
    /// Packed output, `ceil(n_bits / 8)` bytes
    pub bytes: Bytes,
    pub n_bits: usize,
    /// Backend that actually produced `bytes`
    pub backend: Backend,
    /// Hardware error that caused a fallback, if any
    pub fallback_reason: Option<String>,
}

impl Generation {
    pub fn fell_back(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// Turns bit requests into packed bytes
#[derive(Clone)]
pub struct QuantumGenerator {
    width: QubitWidth,
    default_backend: Backend,
    source: Arc<dyn EntropySource>,
    hardware: Option<HardwareClient>,
}

impl QuantumGenerator {
    pub fn new(
        width: QubitWidth,
        default_backend: Backend,
        source: Arc<dyn EntropySource>,
        hardware: Option<HardwareClient>,
    ) -> Self {
        Self {
            width,
            default_backend,
            source,
            hardware,
        }
    }

    /// Simulator source plus, when a device URL is configured, a hardware client
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let width = config.qubit_width()?;
        let source = Arc::new(SimulatorSource::new(config.sampling_mode));

        let hardware = match &config.hardware_url {
            Some(url) => {
                let base_url = Url::parse(url)
                    .map_err(|e| Error::Config(format!("Invalid hardware_url '{}': {}", url, e)))?;
                let hw_config = HardwareConfig::new(base_url).with_timeout(config.hardware_timeout());
                Some(HardwareClient::new(hw_config)?)
            }
            None => None,
        };

        Ok(Self::new(width, config.backend, source, hardware))
    }

    pub fn width(&self) -> QubitWidth {
        self.width
    }

    pub fn default_backend(&self) -> Backend {
        self.default_backend
    }

    pub fn has_hardware(&self) -> bool {
        self.hardware.is_some()
    }

    /// Initial state: request hint, else configured default
    pub fn select_backend(&self, hint: Option<Backend>) -> Backend {
        hint.unwrap_or(self.default_backend)
    }

    /// Generate the requested bits, falling back to the simulator on any hardware error
    #[instrument(skip(self, request), fields(n_bits = request.n_bits, hint = ?request.backend))]
    pub async fn generate(&self, request: &BitRequest) -> Result<Generation> {
        let n_bits = request.validate()?;
        let selected = self.select_backend(request.backend);

        let mut fallback_reason = None;
        if selected == Backend::Hardware {
            match self.attempt_hardware(n_bits).await {
                Ok(bytes) => {
                    debug!("Hardware produced {} bytes", bytes.len());
                    return Ok(Generation {
                        bytes,
                        n_bits,
                        backend: Backend::Hardware,
                        fallback_reason: None,
                    });
                }
                Err(e) => {
                    warn!("Hardware backend failed, falling back to simulator: {}", e);
                    fallback_reason = Some(e.to_string());
                }
            }
        }

        let bytes = self.simulate(n_bits).await?;
        info!(
            bytes = bytes.len(),
            fallback = fallback_reason.is_some(),
            "Generated {} bits with simulator",
            n_bits
        );

        Ok(Generation {
            bytes,
            n_bits,
            backend: Backend::Simulator,
            fallback_reason,
        })
    }

    /// One hardware call, no retries
    pub async fn attempt_hardware(&self, n_bits: usize) -> Result<Bytes> {
        let client = self
            .hardware
            .as_ref()
            .ok_or_else(|| Error::Hardware("no hardware device configured".to_string()))?;
        client.fetch(n_bits).await
    }

    /// Run the simulator path on the blocking pool
    pub async fn simulate(&self, n_bits: usize) -> Result<Bytes> {
        let source = Arc::clone(&self.source);
        let width = self.width;
        tokio::task::spawn_blocking(move || extract_bytes(source.as_ref(), width, n_bits)).await?
    }
}

/// Source → assembler → packer for exactly `n_bits`
pub fn extract_bytes(source: &dyn EntropySource, width: QubitWidth, n_bits: usize) -> Result<Bytes> {
    if n_bits == 0 || n_bits > crate::MAX_BITS {
        return Err(Error::Validation(format!(
            "n_bits must be between 1 and {}",
            crate::MAX_BITS
        )));
    }

    let shots = shot_count(n_bits, width);
    let output = source.sample(shots, width)?;

    if output.shots() != shots as u64 {
        warn!(
            "Entropy source returned {} shots, expected {}",
            output.shots(),
            shots
        );
    }

    let bits = assemble(&output, n_bits);
    Ok(pack_lsb_first(&bits))
}
