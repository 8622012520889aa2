//! gnark-compatible compressed-point handling for BN254.
//!
//! The disperser returns KZG commitments in gnark's compressed form: the x
//! coordinate big-endian with a two-bit flag in the most significant bits of
//! the first byte selecting the point at infinity or one of the two y
//! candidates. Field and curve arithmetic come from arkworks; this crate owns
//! the flag convention, the coordinate byte order, and the lexicographic y
//! selection rule, none of which match arkworks' own serialization.

use ark_bn254::Fq;
use ark_ff::{BigInt, BigInteger, PrimeField};

mod g1;
mod g2;

pub use g1::{compress_g1, decompress_g1};
pub use g2::{compress_g2, decompress_g2};

/// Compressed G1 point size in bytes.
pub const G1_COMPRESSED_SIZE: usize = 32;
/// Compressed G2 point size in bytes.
pub const G2_COMPRESSED_SIZE: usize = 64;

/// Flag marking the point at infinity.
pub const COMPRESSED_INFINITY: u8 = 0x40;
/// Flag selecting the lexicographically smaller y candidate.
pub const COMPRESSED_SMALLEST: u8 = 0x80;
/// Flag selecting the lexicographically larger y candidate.
pub const COMPRESSED_LARGEST: u8 = 0xC0;
/// Mask covering the two flag bits.
pub const FLAG_MASK: u8 = 0xC0;

/// Errors from parsing or reconstructing compressed points.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PointError {
    /// input is not the compressed size for the group
    #[error("compressed point must be {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
    /// the two high bits are not a known gnark flag
    #[error("invalid compression flags {0:#04x}")]
    InvalidFlags(u8),
    /// infinity-flagged input carries nonzero coordinate bytes
    #[error("compressed point at infinity has nonzero coordinate bytes")]
    DirtyInfinity,
    /// a coordinate is not a canonical field element (>= the base prime)
    #[error("coordinate is not a canonical field element")]
    NonCanonicalCoordinate,
    /// x^3 + b is a non-residue, so no y exists for the given x
    #[error("no point on the curve has the given x coordinate")]
    NotOnCurve,
    /// the reconstructed point is outside the r-order subgroup
    #[error("point is not in the r-order subgroup")]
    NotInSubgroup,
}

/// Parse a 32-byte big-endian scalar, rejecting values >= the base prime.
pub(crate) fn fq_from_be_bytes(bytes: &[u8; 32]) -> Result<Fq, PointError> {
    let mut limbs = [0u64; 4];
    for (i, limb) in limbs.iter_mut().enumerate() {
        let start = 32 - 8 * (i + 1);
        let mut word = [0u8; 8];
        word.copy_from_slice(&bytes[start..start + 8]);
        *limb = u64::from_be_bytes(word);
    }
    Fq::from_bigint(BigInt::new(limbs)).ok_or(PointError::NonCanonicalCoordinate)
}

/// Canonical 32-byte big-endian encoding of a base-field element.
pub fn fq_to_be_bytes(value: &Fq) -> [u8; 32] {
    let bytes = value.into_bigint().to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// gnark's sign rule: an element is "larger" iff its canonical encoding is
/// lexicographically greater than that of its additive inverse, which for a
/// prime field reduces to value > (p - 1) / 2.
pub(crate) fn is_lexicographically_largest(value: &Fq) -> bool {
    value.into_bigint() > Fq::MODULUS_MINUS_ONE_DIV_TWO
}
