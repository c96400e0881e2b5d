//! Non-cryptographic sums used for dirty detection and content identity.
//! Collisions are tolerated; both peers are trusted.

use bytemuck::Pod;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Sum of the buffer read as little-endian 32-bit words. A trailing partial
/// word is zero-padded.
pub fn checksum_bytes(bytes: &[u8]) -> u64 {
    let mut chunks = bytes.chunks_exact(4);
    let mut sum = chunks.by_ref().fold(0u64, |acc, chunk| {
        let word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        acc.wrapping_add(word as u64)
    });
    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut word = [0u8; 4];
        word[..tail.len()].copy_from_slice(tail);
        sum = sum.wrapping_add(u32::from_le_bytes(word) as u64);
    }
    sum
}

pub fn checksum_pod<T: Pod>(values: &[T]) -> u64 {
    checksum_bytes(bytemuck::cast_slice(values))
}

pub fn checksum_str(value: &str) -> u64 {
    checksum_bytes(value.as_bytes())
}

/// FNV-1a over the buffer.
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ *byte as u64).wrapping_mul(FNV_PRIME)
    })
}

pub fn hash_pod<T: Pod>(values: &[T]) -> u64 {
    hash_bytes(bytemuck::cast_slice(values))
}

/// Folds one more hash into an accumulated one.
pub fn hash_combine(seed: u64, value: u64) -> u64 {
    seed ^ value
        .wrapping_add(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_sums_words() {
        let bytes = [1u8, 0, 0, 0, 2, 0, 0, 0, 3];
        assert_eq!(checksum_bytes(&bytes), 6);
    }

    #[test]
    fn checksum_is_order_independent_but_hash_is_not() {
        let a = [1.0f32, 2.0];
        let b = [2.0f32, 1.0];
        assert_eq!(checksum_pod(&a), checksum_pod(&b));
        assert_ne!(hash_pod(&a), hash_pod(&b));
    }

    #[test]
    fn empty_inputs() {
        assert_eq!(checksum_bytes(&[]), 0);
        assert_eq!(hash_bytes(&[]), FNV_OFFSET);
    }
}
