//! The 32-byte entropy source behind every gradient.

use std::fmt;

use sha2::{Digest as _, Sha256};

use crate::error::GradientError;

pub const DIGEST_LEN: usize = 32;

/// Exactly 32 bytes, usually the SHA-256 of the caller's input string.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    pub const fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    /// Checked construction from an arbitrary slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, GradientError> {
        let array: [u8; DIGEST_LEN] = bytes
            .try_into()
            .map_err(|_| GradientError::DigestLength {
                actual: bytes.len(),
            })?;
        Ok(Self(array))
    }

    pub fn sha256(input: &[u8]) -> Self {
        Self(Sha256::digest(input).into())
    }

    pub fn of_str(input: &str) -> Self {
        Self::sha256(input.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }

    pub(crate) fn u64_at(&self, start: usize) -> u64 {
        let mut buf = [0_u8; 8];
        buf.copy_from_slice(&self.0[start..start + 8]);
        u64::from_be_bytes(buf)
    }

    pub(crate) fn u32_at(&self, start: usize) -> u32 {
        let mut buf = [0_u8; 4];
        buf.copy_from_slice(&self.0[start..start + 4]);
        u32::from_be_bytes(buf)
    }

    pub(crate) fn u16_at(&self, start: usize) -> u16 {
        u16::from_be_bytes([self.0[start], self.0[start + 1]])
    }

    pub(crate) fn byte(&self, index: usize) -> u8 {
        self.0[index]
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

impl TryFrom<&[u8]> for Digest {
    type Error = GradientError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(bytes)
    }
}

/// Reverses by Unicode scalar value, so multi-byte characters stay intact.
pub fn reverse_chars(input: &str) -> String {
    input.chars().rev().collect()
}
