// SPDX-License-Identifier: MIT
//
// Quantum Random Bit Service
// Copyright (c) 2025 Quantum Random Service Contributors

//! Entropy sources producing raw measurement outcomes
//!
//! An [`EntropySource`] answers a shot request with a [`ShotOutput`]. Only the
//! [`ShotOutput::PerShot`] shape preserves the order in which shots were
//! executed; [`ShotOutput::Counts`] groups equal outcomes together and should
//! be preferred only where a backend cannot report individual shots.

use crate::circuit::{Circuit, Simulator};
use crate::config::SamplingMode;
use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Number of qubits measured per shot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QubitWidth(usize);

impl QubitWidth {
    pub fn new(n_qubits: usize) -> Result<Self> {
        if n_qubits == 0 || n_qubits > crate::MAX_QUBITS {
            return Err(Error::Config(format!(
                "qubit width must be between 1 and {}, got {}",
                crate::MAX_QUBITS,
                n_qubits
            )));
        }
        Ok(Self(n_qubits))
    }

    pub fn get(&self) -> usize {
        self.0
    }
}

/// Shots needed to cover `n_bits` at the given width
pub fn shot_count(n_bits: usize, width: QubitWidth) -> usize {
    n_bits.div_ceil(width.get())
}

/// Bit string produced by one shot
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawOutcome(String);

impl RawOutcome {
    /// Parse a backend outcome, dropping whitespace between register groups
    pub fn parse(raw: &str, width: QubitWidth) -> Result<Self> {
        let clean: String = raw.chars().filter(|c| !c.is_whitespace()).collect();

        if let Some(bad) = clean.chars().find(|c| *c != '0' && *c != '1') {
            return Err(Error::Generation(format!(
                "outcome '{}' contains non-binary character '{}'",
                raw, bad
            )));
        }
        if clean.len() != width.get() {
            return Err(Error::Generation(format!(
                "outcome '{}' has {} bits, expected {}",
                raw,
                clean.len(),
                width.get()
            )));
        }

        Ok(Self(clean))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Bits left to right
    pub fn bits(&self) -> impl Iterator<Item = bool> + '_ {
        self.0.bytes().map(|b| b == b'1')
    }

    pub fn width(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for RawOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw output of an entropy source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShotOutput {
    /// One outcome per shot, in execution order
    PerShot(Vec<RawOutcome>),
    /// Occurrences of each distinct outcome; execution order is lost
    Counts(BTreeMap<RawOutcome, u64>),
}

impl ShotOutput {
    /// Total shots represented
    pub fn shots(&self) -> u64 {
        match self {
            Self::PerShot(outcomes) => outcomes.len() as u64,
            Self::Counts(counts) => counts.values().sum(),
        }
    }

    pub fn preserves_order(&self) -> bool {
        matches!(self, Self::PerShot(_))
    }
}

/// Anything that can run the measurement circuit
pub trait EntropySource: Send + Sync {
    fn sample(&self, shots: usize, width: QubitWidth) -> Result<ShotOutput>;
}

/// Local simulator source
///
/// Circuit and RNG are built per call, so concurrent callers never share
/// pseudo-random state.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulatorSource {
    mode: SamplingMode,
}

impl SimulatorSource {
    pub fn new(mode: SamplingMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> SamplingMode {
        self.mode
    }
}

impl EntropySource for SimulatorSource {
    fn sample(&self, shots: usize, width: QubitWidth) -> Result<ShotOutput> {
        let circuit = Circuit::hadamard_register(width.get())?;
        let mut rng = StdRng::from_entropy();

        let output = match self.mode {
            SamplingMode::PerShot => {
                let memory = Simulator.run_memory(&circuit, shots, &mut rng)?;
                let outcomes = memory
                    .iter()
                    .map(|m| RawOutcome::parse(m, width))
                    .collect::<Result<Vec<_>>>()?;
                ShotOutput::PerShot(outcomes)
            }
            SamplingMode::Counts => {
                let mut counts = BTreeMap::new();
                for (outcome, count) in Simulator.run_counts(&circuit, shots, &mut rng)? {
                    counts.insert(RawOutcome::parse(&outcome, width)?, count);
                }
                ShotOutput::Counts(counts)
            }
        };

        debug!(shots, qubits = width.get(), mode = ?self.mode, "Simulated shots");
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn width(n: usize) -> QubitWidth {
        QubitWidth::new(n).unwrap()
    }

    #[test]
    fn test_shot_count_rounds_up() {
        assert_eq!(shot_count(1, width(4)), 1);
        assert_eq!(shot_count(4, width(4)), 1);
        assert_eq!(shot_count(5, width(4)), 2);
        assert_eq!(shot_count(10_000, width(4)), 2500);
        assert_eq!(shot_count(5, width(2)), 3);
    }

    #[test]
    fn test_qubit_width_bounds() {
        assert!(QubitWidth::new(0).is_err());
        assert!(QubitWidth::new(crate::MAX_QUBITS + 1).is_err());
        assert_eq!(width(4).get(), 4);
    }

    #[test]
    fn test_outcome_strips_whitespace() {
        let outcome = RawOutcome::parse("01 10", width(4)).unwrap();
        assert_eq!(outcome.as_str(), "0110");
        assert_eq!(outcome.bits().collect::<Vec<_>>(), vec![false, true, true, false]);
    }

    #[test]
    fn test_outcome_rejects_bad_input() {
        assert!(RawOutcome::parse("012", width(3)).is_err());
        assert!(RawOutcome::parse("011", width(4)).is_err());
    }

    #[test]
    fn test_simulator_per_shot() {
        let output = SimulatorSource::new(SamplingMode::PerShot)
            .sample(7, width(4))
            .unwrap();
        assert!(output.preserves_order());
        assert_eq!(output.shots(), 7);
        match output {
            ShotOutput::PerShot(outcomes) => assert!(outcomes.iter().all(|o| o.width() == 4)),
            ShotOutput::Counts(_) => panic!("expected per-shot output"),
        }
    }

    #[test]
    fn test_simulator_counts() {
        let output = SimulatorSource::new(SamplingMode::Counts)
            .sample(300, width(3))
            .unwrap();
        assert!(!output.preserves_order());
        assert_eq!(output.shots(), 300);
    }
}
