// SPDX-License-Identifier: MIT
//
// Quantum Random Bit Service
// Copyright (c) 2025 Quantum Random Service Contributors

//! Byte packing
//!
//! Bits are packed LSB-first: the first bit of every 8-bit chunk becomes bit 0
//! of its byte. Deployed clients depend on this order, so it must not be
//! changed to MSB-first.

use crate::bits::BitSequence;
use bytes::Bytes;

/// Bytes needed to hold `n_bits`
pub fn packed_len(n_bits: usize) -> usize {
    n_bits.div_ceil(8)
}

/// Pack bits into bytes, LSB-first within each byte
///
/// The last byte is zero-filled above the final bit.
pub fn pack_lsb_first(bits: &BitSequence) -> Bytes {
    let packed: Vec<u8> = bits
        .as_slice()
        .chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |byte, (j, &bit)| byte | (u8::from(bit) << j))
        })
        .collect();

    Bytes::from(packed)
}

/// Inverse of [`pack_lsb_first`]
pub fn unpack_lsb_first(bytes: &[u8], n_bits: usize) -> BitSequence {
    let mut bits: BitSequence = bytes
        .iter()
        .flat_map(|&byte| (0..8).map(move |j| (byte >> j) & 1 == 1))
        .take(n_bits)
        .collect();
    bits.fit(n_bits);
    bits
}

/// Zero every bit position at or beyond `n_bits` in the final byte
pub fn clear_unused_bits(buf: &mut [u8], n_bits: usize) {
    let used = n_bits % 8;
    if used == 0 {
        return;
    }
    if let Some(last) = buf.last_mut() {
        *last &= (1u8 << used) - 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bits(s: &str) -> BitSequence {
        s.chars().map(|c| c == '1').collect()
    }

    #[test]
    fn test_lsb_first_order() {
        let packed = pack_lsb_first(&bits("10100000"));
        assert_eq!(&packed[..], &[0b0000_0101]);
        assert_ne!(packed[0], 160);
    }

    #[test]
    fn test_partial_last_byte() {
        // 10 bits: a full byte, then "11" landing in bits 0 and 1.
        let packed = pack_lsb_first(&bits("0000000111"));
        assert_eq!(&packed[..], &[0b1000_0000, 0b0000_0011]);
    }

    #[test]
    fn test_all_ones_partial() {
        let packed = pack_lsb_first(&bits("111"));
        assert_eq!(&packed[..], &[0b0000_0111]);
    }

    #[test]
    fn test_packed_len() {
        assert_eq!(packed_len(1), 1);
        assert_eq!(packed_len(8), 1);
        assert_eq!(packed_len(9), 2);
        assert_eq!(packed_len(10_000), 1250);
    }

    #[test]
    fn test_clear_unused_bits() {
        let mut buf = [0xFF, 0xFF];
        clear_unused_bits(&mut buf, 11);
        assert_eq!(buf, [0xFF, 0b0000_0111]);

        let mut full = [0xFF];
        clear_unused_bits(&mut full, 8);
        assert_eq!(full, [0xFF]);
    }

    #[test]
    fn test_unpack_restores_order() {
        assert_eq!(unpack_lsb_first(&[0b0000_0101], 3).to_string(), "101");
    }

    proptest! {
        #[test]
        fn prop_length_and_zero_high_bits(raw in proptest::collection::vec(any::<bool>(), 1..=10_000)) {
            let n_bits = raw.len();
            let packed = pack_lsb_first(&BitSequence::from(raw));
            prop_assert_eq!(packed.len(), packed_len(n_bits));

            let used = n_bits % 8;
            if used != 0 {
                let last = packed[packed.len() - 1];
                prop_assert_eq!(last >> used, 0);
            }
        }
    }
}
