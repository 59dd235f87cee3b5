// SPDX-License-Identifier: MIT
//
// Quantum Random Bit Service
// Copyright (c) 2025 Quantum Random Service Contributors

//! Minimal state-vector simulator for the entropy circuit
//!
//! Only what the service needs: Hadamard gates on a register starting in
//! |0...0>, followed by measurement of every qubit. The gate set is real, so
//! amplitudes are stored as `f64`.
//!
//! Outcome strings use the little-endian qubit convention: qubit 0 is the
//! rightmost character.

use crate::{Error, Result};
use rand::Rng;
use std::collections::BTreeMap;
use std::f64::consts::FRAC_1_SQRT_2;

/// Supported gates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Hadamard on the given qubit
    H(usize),
}

/// A circuit over `n_qubits` qubits
#[derive(Debug, Clone)]
pub struct Circuit {
    n_qubits: usize,
    gates: Vec<Gate>,
    measured: bool,
}

impl Circuit {
    pub fn new(n_qubits: usize) -> Self {
        Self {
            n_qubits,
            gates: Vec::new(),
            measured: false,
        }
    }

    /// Equal superposition over every basis state, measured
    pub fn hadamard_register(n_qubits: usize) -> Result<Self> {
        let mut circuit = Self::new(n_qubits);
        for qubit in 0..n_qubits {
            circuit.h(qubit)?;
        }
        circuit.measure_all();
        Ok(circuit)
    }

    pub fn h(&mut self, qubit: usize) -> Result<&mut Self> {
        if qubit >= self.n_qubits {
            return Err(Error::Generation(format!(
                "qubit {} out of range for {}-qubit circuit",
                qubit, self.n_qubits
            )));
        }
        self.gates.push(Gate::H(qubit));
        Ok(self)
    }

    pub fn measure_all(&mut self) -> &mut Self {
        self.measured = true;
        self
    }

    pub fn n_qubits(&self) -> usize {
        self.n_qubits
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn is_measured(&self) -> bool {
        self.measured
    }
}

/// Stateless executor; every run takes its own RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct Simulator;

impl Simulator {
    /// Execute `shots` measurements and return one outcome per shot, in order
    pub fn run_memory<R: Rng>(
        &self,
        circuit: &Circuit,
        shots: usize,
        rng: &mut R,
    ) -> Result<Vec<String>> {
        if !circuit.is_measured() {
            return Err(Error::Generation("circuit has no measurements".to_string()));
        }
        if circuit.n_qubits() == 0 || circuit.n_qubits() > crate::MAX_QUBITS {
            return Err(Error::Generation(format!(
                "cannot simulate {} qubits (max {})",
                circuit.n_qubits(),
                crate::MAX_QUBITS
            )));
        }

        let amplitudes = self.evolve(circuit);
        let cumulative = cumulative_probabilities(&amplitudes);
        let width = circuit.n_qubits();
        let last = cumulative.len() - 1;

        let memory = (0..shots)
            .map(|_| {
                let r: f64 = rng.gen();
                let index = cumulative.partition_point(|&p| p <= r).min(last);
                format!("{:0width$b}", index, width = width)
            })
            .collect();

        Ok(memory)
    }

    /// Execute `shots` measurements and aggregate outcomes into a frequency table
    pub fn run_counts<R: Rng>(
        &self,
        circuit: &Circuit,
        shots: usize,
        rng: &mut R,
    ) -> Result<BTreeMap<String, u64>> {
        let mut counts = BTreeMap::new();
        for outcome in self.run_memory(circuit, shots, rng)? {
            *counts.entry(outcome).or_insert(0) += 1;
        }
        Ok(counts)
    }

    fn evolve(&self, circuit: &Circuit) -> Vec<f64> {
        let mut amplitudes = vec![0.0; 1 << circuit.n_qubits()];
        amplitudes[0] = 1.0;

        for gate in circuit.gates() {
            match *gate {
                Gate::H(qubit) => apply_hadamard(&mut amplitudes, qubit),
            }
        }

        amplitudes
    }
}

fn apply_hadamard(amplitudes: &mut [f64], qubit: usize) {
    let mask = 1 << qubit;
    for i in 0..amplitudes.len() {
        if i & mask == 0 {
            let j = i | mask;
            let (a, b) = (amplitudes[i], amplitudes[j]);
            amplitudes[i] = (a + b) * FRAC_1_SQRT_2;
            amplitudes[j] = (a - b) * FRAC_1_SQRT_2;
        }
    }
}

fn cumulative_probabilities(amplitudes: &[f64]) -> Vec<f64> {
    let mut total = 0.0;
    amplitudes
        .iter()
        .map(|a| {
            total += a * a;
            total
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_hadamard_register_is_uniform() {
        let circuit = Circuit::hadamard_register(3).unwrap();
        let amplitudes = Simulator.evolve(&circuit);
        assert_eq!(amplitudes.len(), 8);
        for a in amplitudes {
            assert!((a * a - 0.125).abs() < 1e-12);
        }
    }

    #[test]
    fn test_double_hadamard_returns_to_zero() {
        let mut circuit = Circuit::new(1);
        circuit.h(0).unwrap().h(0).unwrap().measure_all();

        let mut rng = StdRng::seed_from_u64(7);
        let memory = Simulator.run_memory(&circuit, 50, &mut rng).unwrap();
        assert!(memory.iter().all(|m| m == "0"));
    }

    #[test]
    fn test_single_qubit_flip_is_rightmost() {
        // No gates on qubit 1, so it always reads 0 in the leftmost position.
        let mut circuit = Circuit::new(2);
        circuit.h(0).unwrap().measure_all();

        let mut rng = StdRng::seed_from_u64(11);
        let memory = Simulator.run_memory(&circuit, 200, &mut rng).unwrap();
        assert!(memory.iter().all(|m| m.starts_with('0')));
        assert!(memory.iter().any(|m| m == "01"));
        assert!(memory.iter().any(|m| m == "00"));
    }

    #[test]
    fn test_memory_shape() {
        let circuit = Circuit::hadamard_register(4).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let memory = Simulator.run_memory(&circuit, 25, &mut rng).unwrap();
        assert_eq!(memory.len(), 25);
        assert!(memory
            .iter()
            .all(|m| m.len() == 4 && m.chars().all(|c| c == '0' || c == '1')));
    }

    #[test]
    fn test_counts_sum_to_shots() {
        let circuit = Circuit::hadamard_register(2).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let counts = Simulator.run_counts(&circuit, 1000, &mut rng).unwrap();
        assert_eq!(counts.values().sum::<u64>(), 1000);
        assert!(counts.len() <= 4);
    }

    #[test]
    fn test_unmeasured_circuit_rejected() {
        let circuit = Circuit::new(2);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(Simulator.run_memory(&circuit, 1, &mut rng).is_err());
    }

    #[test]
    fn test_gate_out_of_range() {
        let mut circuit = Circuit::new(2);
        assert!(circuit.h(2).is_err());
    }
}
