// SPDX-License-Identifier: MIT
//
// Quantum Random Bit Service
// Copyright (c) 2025 Quantum Random Service Contributors

//! Quantum Random Bit Core Library
//!
//! Turns a request for `n` random bits into `ceil(n / 8)` packed bytes, drawn
//! either from a local quantum-circuit simulation or from a remote quantum
//! device, with transparent fallback to the simulator when the device fails.
//!
//! # Architecture
//!
//! The pipeline runs leaves first:
//! - `circuit`: Hadamard-register circuit and state-vector sampler
//! - `source`: entropy sources and their tagged per-shot / counts output
//! - `bits`: flattening shot output into an exact-length bit sequence
//! - `packer`: LSB-first byte packing
//! - `hardware`: bounded HTTP client for the remote device
//! - `generator`: backend selection and fallback policy
//!
//! Around it sit `config` (environment-sourced settings), `metrics`
//! (counters for the HTTP layer) and `error` (unified error types).

pub mod bits;
pub mod circuit;
pub mod config;
pub mod error;
pub mod generator;
pub mod hardware;
pub mod metrics;
pub mod packer;
pub mod source;

pub use config::{Backend, SamplingMode, ServiceConfig};
pub use error::{Error, Result};
pub use generator::{BitRequest, Generation, QuantumGenerator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Largest bit count a single request may ask for
pub const MAX_BITS: usize = 10_000;

/// Qubits measured per shot unless configured otherwise
pub const DEFAULT_QUBIT_WIDTH: usize = 4;

/// State-vector size limit (2^16 amplitudes)
pub const MAX_QUBITS: usize = 16;

/// Bound on one hardware call
pub const DEFAULT_HARDWARE_TIMEOUT_SECS: u64 = 30;
