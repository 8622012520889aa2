//! G1 point compression and decompression.

use crate::{
    fq_from_be_bytes, fq_to_be_bytes, is_lexicographically_largest, PointError,
    COMPRESSED_INFINITY, COMPRESSED_LARGEST, COMPRESSED_SMALLEST, FLAG_MASK, G1_COMPRESSED_SIZE,
};
use ark_bn254::{g1, G1Affine};
use ark_ec::{short_weierstrass::SWCurveConfig, AffineRepr};
use ark_ff::Field;

/// Decompress a 32-byte gnark-encoded G1 point.
pub fn decompress_g1(compressed: &[u8]) -> Result<G1Affine, PointError> {
    let bytes: &[u8; G1_COMPRESSED_SIZE] = compressed
        .try_into()
        .map_err(|_| PointError::InvalidLength { expected: G1_COMPRESSED_SIZE, got: compressed.len() })?;

    let flags = bytes[0] & FLAG_MASK;
    let mut x_bytes = *bytes;
    x_bytes[0] &= !FLAG_MASK;

    if flags == COMPRESSED_INFINITY {
        if x_bytes.iter().any(|&b| b != 0) {
            return Err(PointError::DirtyInfinity);
        }
        return Ok(G1Affine::identity());
    }
    if flags != COMPRESSED_SMALLEST && flags != COMPRESSED_LARGEST {
        return Err(PointError::InvalidFlags(flags));
    }

    let x = fq_from_be_bytes(&x_bytes)?;
    let rhs = x.square() * x + g1::Config::COEFF_B;
    let y = rhs.sqrt().ok_or(PointError::NotOnCurve)?;

    let want_largest = flags == COMPRESSED_LARGEST;
    let y = if is_lexicographically_largest(&y) == want_largest { y } else { -y };

    let point = G1Affine::new_unchecked(x, y);
    if !point.is_on_curve() {
        return Err(PointError::NotOnCurve);
    }
    if !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(PointError::NotInSubgroup);
    }
    Ok(point)
}

/// Compress a G1 point into the 32-byte gnark encoding.
pub fn compress_g1(point: &G1Affine) -> [u8; G1_COMPRESSED_SIZE] {
    let mut out = [0u8; G1_COMPRESSED_SIZE];
    match point.xy() {
        None => out[0] = COMPRESSED_INFINITY,
        Some((x, y)) => {
            out = fq_to_be_bytes(&x);
            out[0] |= if is_lexicographically_largest(&y) {
                COMPRESSED_LARGEST
            } else {
                COMPRESSED_SMALLEST
            };
        }
    }
    out
}
