//! Common types and byte helpers shared across modes, padding schemes and MACs.

/// Unified error type for all operations in this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Key material is unusable: too short, wrong length, or missing when
    /// re-using a previously derived key.
    #[error("invalid key: {0}")]
    InvalidKey(&'static str),
    /// A configuration value is out of range.
    #[error("illegal argument: {0}")]
    IllegalArgument(&'static str),
    /// The operation is not allowed in the current lifecycle state.
    #[error("illegal state: {0}")]
    IllegalState(&'static str),
    /// Padding bytes are inconsistent. Indicates corrupt or tampered data.
    #[error("wrong padding")]
    WrongPadding,
    /// The keystream segment has no blocks left.
    #[error("maximum blocks for segment reached")]
    LimitReached,
    /// An algorithm failed its known-answer or symmetry self-test.
    #[error("self-test failed: {0}")]
    SelfTestFailed(&'static str),
}

/// Direction of cipher operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encrypt,
    Decrypt,
}

/// XOR `keystream` into `src`, writing the result to `dst`.
///
/// All three slices must be at least `len` bytes long.
#[inline]
pub fn xor_into(dst: &mut [u8], src: &[u8], keystream: &[u8], len: usize) {
    for i in 0..len {
        dst[i] = src[i] ^ keystream[i];
    }
}

/// Increment a big-endian unsigned integer by one, wrapping on overflow.
#[inline]
pub fn increment_be(counter: &mut [u8]) {
    for byte in counter.iter_mut().rev() {
        let (sum, carry) = byte.overflowing_add(1);
        *byte = sum;
        if !carry {
            return;
        }
    }
}

/// Add `addend` into `acc`, both big-endian, modulo `256^acc.len()`.
///
/// `addend` is right-aligned against `acc` and shifted left by `shift`
/// bytes; bytes that would land above the most significant byte of `acc`
/// are discarded.
pub fn add_be_shifted(acc: &mut [u8], addend: &[u8], shift: usize) {
    let mut carry = 0u16;
    let mut pos = acc.len();
    if shift >= pos {
        return;
    }
    pos -= shift;

    for &b in addend.iter().rev() {
        if pos == 0 {
            return;
        }
        pos -= 1;
        let sum = acc[pos] as u16 + b as u16 + carry;
        acc[pos] = sum as u8;
        carry = sum >> 8;
    }

    while carry != 0 && pos > 0 {
        pos -= 1;
        let sum = acc[pos] as u16 + carry;
        acc[pos] = sum as u8;
        carry = sum >> 8;
    }
}

/// Length of a big-endian integer once leading zero bytes are stripped.
#[inline]
pub fn significant_len(value: &[u8]) -> usize {
    value.len() - value.iter().take_while(|&&b| b == 0).count()
}

/// Decode a hex literal used in vector tables.
pub(crate) fn unhex(s: &str) -> Vec<u8> {
    hex::decode(s).unwrap_or_default()
}
