//! G2 point compression and decompression.
//!
//! The compressed form is 64 bytes: the imaginary x component (c1) big-endian
//! carrying the flag bits, followed by the real component (c0).

use crate::{
    fq_from_be_bytes, fq_to_be_bytes, is_lexicographically_largest, PointError,
    COMPRESSED_INFINITY, COMPRESSED_LARGEST, COMPRESSED_SMALLEST, FLAG_MASK, G2_COMPRESSED_SIZE,
};
use ark_bn254::{g2, Fq2, G2Affine};
use ark_ec::{short_weierstrass::SWCurveConfig, AffineRepr};
use ark_ff::{Field, Zero};

/// Decompress a 64-byte gnark-encoded G2 point.
pub fn decompress_g2(compressed: &[u8]) -> Result<G2Affine, PointError> {
    let bytes: &[u8; G2_COMPRESSED_SIZE] = compressed
        .try_into()
        .map_err(|_| PointError::InvalidLength { expected: G2_COMPRESSED_SIZE, got: compressed.len() })?;

    let flags = bytes[0] & FLAG_MASK;
    let mut c1_bytes = [0u8; 32];
    c1_bytes.copy_from_slice(&bytes[..32]);
    c1_bytes[0] &= !FLAG_MASK;
    let mut c0_bytes = [0u8; 32];
    c0_bytes.copy_from_slice(&bytes[32..]);

    if flags == COMPRESSED_INFINITY {
        if c1_bytes.iter().chain(c0_bytes.iter()).any(|&b| b != 0) {
            return Err(PointError::DirtyInfinity);
        }
        return Ok(G2Affine::identity());
    }
    if flags != COMPRESSED_SMALLEST && flags != COMPRESSED_LARGEST {
        return Err(PointError::InvalidFlags(flags));
    }

    let x = Fq2::new(fq_from_be_bytes(&c0_bytes)?, fq_from_be_bytes(&c1_bytes)?);
    let rhs = x.square() * x + g2::Config::COEFF_B;
    let y = rhs.sqrt().ok_or(PointError::NotOnCurve)?;

    let want_largest = flags == COMPRESSED_LARGEST;
    let y = if fq2_lexicographically_largest(&y) == want_largest { y } else { -y };

    let point = G2Affine::new_unchecked(x, y);
    if !point.is_on_curve() {
        return Err(PointError::NotOnCurve);
    }
    if !point.is_in_correct_subgroup_assuming_on_curve() {
        return Err(PointError::NotInSubgroup);
    }
    Ok(point)
}

/// Compress a G2 point into the 64-byte gnark encoding.
pub fn compress_g2(point: &G2Affine) -> [u8; G2_COMPRESSED_SIZE] {
    let mut out = [0u8; G2_COMPRESSED_SIZE];
    match point.xy() {
        None => out[0] = COMPRESSED_INFINITY,
        Some((x, y)) => {
            out[..32].copy_from_slice(&fq_to_be_bytes(&x.c1));
            out[32..].copy_from_slice(&fq_to_be_bytes(&x.c0));
            out[0] |= if fq2_lexicographically_largest(&y) {
                COMPRESSED_LARGEST
            } else {
                COMPRESSED_SMALLEST
            };
        }
    }
    out
}

/// gnark's sign rule on Fp2: decide on the imaginary component unless it is
/// zero, then on the real component.
fn fq2_lexicographically_largest(value: &Fq2) -> bool {
    if value.c1.is_zero() {
        is_lexicographically_largest(&value.c0)
    } else {
        is_lexicographically_largest(&value.c1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_round_trip() {
        let generator = G2Affine::generator();
        let compressed = compress_g2(&generator);
        assert_eq!(decompress_g2(&compressed).unwrap(), generator);
    }

    #[test]
    fn coordinate_order_is_c1_then_c0() {
        let generator = G2Affine::generator();
        let compressed = compress_g2(&generator);

        let mut c1 = fq_to_be_bytes(&generator.x.c1);
        c1[0] |= compressed[0] & FLAG_MASK;
        assert_eq!(&compressed[..32], &c1);
        assert_eq!(&compressed[32..], &fq_to_be_bytes(&generator.x.c0));
    }

    #[test]
    fn smallest_and_largest_flags_negate() {
        let generator = G2Affine::generator();
        let mut smallest = compress_g2(&generator);
        smallest[0] = (smallest[0] & !FLAG_MASK) | COMPRESSED_SMALLEST;
        let mut largest = smallest;
        largest[0] = (largest[0] & !FLAG_MASK) | COMPRESSED_LARGEST;

        let a = decompress_g2(&smallest).unwrap();
        let b = decompress_g2(&largest).unwrap();
        assert_eq!(a.x, b.x);
        assert_eq!(a.y, -b.y);
    }

    #[test]
    fn infinity_round_trip() {
        let compressed = compress_g2(&G2Affine::identity());
        assert_eq!(compressed[0], COMPRESSED_INFINITY);
        assert!(decompress_g2(&compressed).unwrap().is_zero());
    }

    #[test]
    fn wrong_length_rejected() {
        for len in [0usize, 32, 63, 65, 128] {
            let bytes = vec![0u8; len];
            assert_eq!(
                decompress_g2(&bytes),
                Err(PointError::InvalidLength { expected: G2_COMPRESSED_SIZE, got: len })
            );
        }
    }

    #[test]
    fn random_multiples_round_trip() {
        let mut point = G2Affine::generator();
        for _ in 0..8 {
            point = (point + G2Affine::generator()).into();
            let compressed = compress_g2(&point);
            assert_eq!(decompress_g2(&compressed).unwrap(), point);
        }
    }
}
