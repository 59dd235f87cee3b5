// SPDX-License-Identifier: MIT
//
// Quantum Random Bit Service
// Copyright (c) 2025 Quantum Random Service Contributors

//! Bit stream assembly
//!
//! Flattens entropy source output into one ordered bit sequence of exactly
//! the requested length.

use crate::source::ShotOutput;
use std::fmt;

/// Ordered sequence of bits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitSequence(Vec<bool>);

impl BitSequence {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, bit: bool) {
        self.0.push(bit);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    pub fn ones(&self) -> usize {
        self.0.iter().filter(|&&b| b).count()
    }

    /// Truncate to `n_bits`, or right-pad with zeros if shorter
    pub fn fit(&mut self, n_bits: usize) {
        self.0.resize(n_bits, false);
    }
}

impl From<Vec<bool>> for BitSequence {
    fn from(bits: Vec<bool>) -> Self {
        Self(bits)
    }
}

impl FromIterator<bool> for BitSequence {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for BitSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.0 {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Flatten shot output into exactly `n_bits` bits
///
/// Per-shot output is concatenated in shot order. Counts output emits each
/// distinct outcome `count` times in map order, so equal outcomes end up
/// adjacent regardless of when they were measured.
pub fn assemble(output: &ShotOutput, n_bits: usize) -> BitSequence {
    let mut bits = BitSequence::with_capacity(n_bits);

    match output {
        ShotOutput::PerShot(outcomes) => {
            for outcome in outcomes {
                if bits.len() >= n_bits {
                    break;
                }
                outcome.bits().for_each(|b| bits.push(b));
            }
        }
        ShotOutput::Counts(counts) => {
            'outer: for (outcome, &count) in counts {
                for _ in 0..count {
                    if bits.len() >= n_bits {
                        break 'outer;
                    }
                    outcome.bits().for_each(|b| bits.push(b));
                }
            }
        }
    }

    bits.fit(n_bits);
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{QubitWidth, RawOutcome};
    use std::collections::BTreeMap;

    fn outcomes(raw: &[&str], width: usize) -> Vec<RawOutcome> {
        let width = QubitWidth::new(width).unwrap();
        raw.iter()
            .map(|r| RawOutcome::parse(r, width).unwrap())
            .collect()
    }

    #[test]
    fn test_per_shot_truncates_last_shot() {
        let output = ShotOutput::PerShot(outcomes(&["01", "10", "00"], 2));
        let bits = assemble(&output, 5);
        assert_eq!(bits.as_slice(), &[false, true, true, false, false]);
        assert_eq!(bits.to_string(), "01100");
    }

    #[test]
    fn test_per_shot_keeps_shot_order() {
        let output = ShotOutput::PerShot(outcomes(&["1000", "0001", "1000"], 4));
        assert_eq!(assemble(&output, 12).to_string(), "100000011000");
    }

    #[test]
    fn test_short_output_is_zero_padded() {
        let output = ShotOutput::PerShot(outcomes(&["11"], 2));
        assert_eq!(assemble(&output, 6).to_string(), "110000");

        let empty = ShotOutput::PerShot(Vec::new());
        assert_eq!(assemble(&empty, 3).to_string(), "000");
    }

    #[test]
    fn test_counts_groups_equal_outcomes() {
        let width = QubitWidth::new(2).unwrap();
        let mut counts = BTreeMap::new();
        counts.insert(RawOutcome::parse("11", width).unwrap(), 2);
        counts.insert(RawOutcome::parse("01", width).unwrap(), 1);

        // Lexicographic map order: "01" first, then "11" twice.
        let bits = assemble(&ShotOutput::Counts(counts), 6);
        assert_eq!(bits.to_string(), "011111");
    }

    #[test]
    fn test_counts_truncates() {
        let width = QubitWidth::new(3).unwrap();
        let mut counts = BTreeMap::new();
        counts.insert(RawOutcome::parse("101", width).unwrap(), 3);
        assert_eq!(assemble(&ShotOutput::Counts(counts), 7).to_string(), "1011011");
    }

    #[test]
    fn test_ones() {
        let bits: BitSequence = vec![true, false, true].into();
        assert_eq!(bits.ones(), 2);
        assert_eq!(bits.len(), 3);
    }
}
