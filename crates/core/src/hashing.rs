//! Canonical ABI encoding of blob headers and blob-key derivation.
//!
//! The blob key must be bit-for-bit identical to the one the disperser
//! derives, so the encoding here mirrors the reference layout exactly: the
//! header is packed as a single ABI tuple `(uint16, bytes, commitments,
//! bytes32)` where the quorum list is a tightly packed `bytes` value (one
//! byte per quorum, sorted) and G2 coordinates use the Ethereum pair order
//! `[imaginary, real]`.

use crate::types::{BlobHeader, BlobKey, PaymentHeader};
use alloy::{
    primitives::{keccak256, B256, U256},
    sol,
    sol_types::SolValue,
};
use ark_bn254::{Fq, G1Affine, G2Affine};
use ark_ec::AffineRepr;
use eigenda_bn254::fq_to_be_bytes;

sol! {
    struct G1PointSol {
        uint256 x;
        uint256 y;
    }

    struct G2PointSol {
        uint256[2] x;
        uint256[2] y;
    }

    struct BlobCommitmentsSol {
        G1PointSol commitment;
        G2PointSol lengthCommitment;
        G2PointSol lengthProof;
        uint32 dataLength;
    }

    struct BlobHeaderSol {
        uint16 version;
        bytes quorumNumbers;
        BlobCommitmentsSol commitment;
        bytes32 paymentMetadataHash;
    }

    struct PaymentMetadataSol {
        address accountID;
        int64 timestamp;
        uint256 cumulativePayment;
    }
}

fn fq_to_u256(value: &Fq) -> U256 {
    U256::from_be_bytes(fq_to_be_bytes(value))
}

fn g1_point(point: &G1Affine) -> G1PointSol {
    match point.xy() {
        Some((x, y)) => G1PointSol { x: fq_to_u256(&x), y: fq_to_u256(&y) },
        None => G1PointSol { x: U256::ZERO, y: U256::ZERO },
    }
}

fn g2_point(point: &G2Affine) -> G2PointSol {
    match point.xy() {
        Some((x, y)) => G2PointSol {
            x: [fq_to_u256(&x.c1), fq_to_u256(&x.c0)],
            y: [fq_to_u256(&y.c1), fq_to_u256(&y.c0)],
        },
        None => G2PointSol { x: [U256::ZERO; 2], y: [U256::ZERO; 2] },
    }
}

/// keccak of the ABI-encoded payment metadata tuple
/// `(address, int64, uint256)`. The cumulative payment enters as its integer
/// value, not the stripped wire bytes.
pub fn hash_payment_metadata(header: &PaymentHeader) -> B256 {
    let encoded = PaymentMetadataSol {
        accountID: header.account_id,
        timestamp: header.timestamp_ns,
        cumulativePayment: header.cumulative_payment,
    }
    .abi_encode();
    keccak256(&encoded)
}

/// Derive the blob key: keccak of the ABI-encoded header tuple.
pub fn compute_blob_key(header: &BlobHeader) -> BlobKey {
    let mut quorums = header.quorum_numbers.clone();
    quorums.sort_unstable();

    let encoded = BlobHeaderSol {
        version: header.version,
        quorumNumbers: quorums.into(),
        commitment: BlobCommitmentsSol {
            commitment: g1_point(&header.commitment.commitment),
            lengthCommitment: g2_point(&header.commitment.length_commitment),
            lengthProof: g2_point(&header.commitment.length_proof),
            dataLength: header.commitment.length,
        },
        paymentMetadataHash: hash_payment_metadata(&header.payment_header),
    }
    .abi_encode();

    BlobKey(keccak256(&encoded).0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlobCommitments;
    use alloy::primitives::{address, Address};

    fn fixture_header() -> BlobHeader {
        BlobHeader {
            version: 0,
            quorum_numbers: vec![0, 1],
            commitment: BlobCommitments {
                commitment: G1Affine::generator(),
                length_commitment: G2Affine::generator(),
                length_proof: G2Affine::generator(),
                length: 1,
            },
            payment_header: PaymentHeader {
                account_id: address!("1234567890123456789012345678901234567890"),
                timestamp_ns: 1_700_000_000_000_000_000,
                cumulative_payment: U256::ZERO,
            },
        }
    }

    #[test]
    fn payment_metadata_encoding_layout() {
        let header = PaymentHeader {
            account_id: address!("1234567890123456789012345678901234567890"),
            timestamp_ns: 1_234_567_890,
            cumulative_payment: U256::from(0x01020304u32),
        };
        let encoded = PaymentMetadataSol {
            accountID: header.account_id,
            timestamp: header.timestamp_ns,
            cumulativePayment: header.cumulative_payment,
        }
        .abi_encode();

        // Three static words: padded address, sign-extended timestamp,
        // cumulative payment.
        assert_eq!(encoded.len(), 96);
        assert!(encoded[..12].iter().all(|&b| b == 0));
        assert_eq!(&encoded[12..32], header.account_id.as_slice());
        assert!(encoded[32..56].iter().all(|&b| b == 0));
        assert_eq!(&encoded[56..64], &1_234_567_890i64.to_be_bytes());
        assert_eq!(&encoded[64..96], &header.cumulative_payment.to_be_bytes::<32>());
    }

    #[test]
    fn payment_metadata_hash_is_deterministic() {
        let header = fixture_header().payment_header;
        assert_eq!(hash_payment_metadata(&header), hash_payment_metadata(&header));
    }

    #[test]
    fn header_encodes_as_single_offset_tuple() {
        // The header is packed as one dynamic tuple argument, so the
        // encoding must open with an offset word of 0x20.
        let header = fixture_header();
        let mut quorums = header.quorum_numbers.clone();
        quorums.sort_unstable();
        let encoded = BlobHeaderSol {
            version: header.version,
            quorumNumbers: quorums.into(),
            commitment: BlobCommitmentsSol {
                commitment: g1_point(&header.commitment.commitment),
                lengthCommitment: g2_point(&header.commitment.length_commitment),
                lengthProof: g2_point(&header.commitment.length_proof),
                dataLength: header.commitment.length,
            },
            paymentMetadataHash: hash_payment_metadata(&header.payment_header),
        }
        .abi_encode();

        let mut offset = [0u8; 32];
        offset[31] = 0x20;
        assert_eq!(&encoded[..32], &offset);
    }

    #[test]
    fn blob_key_is_deterministic() {
        let header = fixture_header();
        assert_eq!(compute_blob_key(&header), compute_blob_key(&header));
        assert_eq!(header.blob_key(), compute_blob_key(&header));
    }

    #[test]
    fn quorum_order_does_not_change_the_key() {
        let mut header = fixture_header();
        header.quorum_numbers = vec![2, 0, 1];
        let shuffled = compute_blob_key(&header);
        header.quorum_numbers = vec![0, 1, 2];
        assert_eq!(compute_blob_key(&header), shuffled);
    }

    #[test]
    fn every_field_perturbs_the_key() {
        let base = compute_blob_key(&fixture_header());

        let mut header = fixture_header();
        header.version = 1;
        assert_ne!(compute_blob_key(&header), base);

        let mut header = fixture_header();
        header.quorum_numbers = vec![0];
        assert_ne!(compute_blob_key(&header), base);

        let mut header = fixture_header();
        header.commitment.length = 2;
        assert_ne!(compute_blob_key(&header), base);

        let mut header = fixture_header();
        header.payment_header.timestamp_ns += 1;
        assert_ne!(compute_blob_key(&header), base);

        let mut header = fixture_header();
        header.payment_header.cumulative_payment = U256::from(1u64);
        assert_ne!(compute_blob_key(&header), base);

        let mut header = fixture_header();
        header.payment_header.account_id = Address::repeat_byte(0xAA);
        assert_ne!(compute_blob_key(&header), base);
    }

    #[test]
    fn g2_coordinates_use_ethereum_pair_order() {
        let point = g2_point(&G2Affine::generator());
        let generator = G2Affine::generator();
        assert_eq!(point.x[0], fq_to_u256(&generator.x.c1));
        assert_eq!(point.x[1], fq_to_u256(&generator.x.c0));
        assert_eq!(point.y[0], fq_to_u256(&generator.y.c1));
        assert_eq!(point.y[1], fq_to_u256(&generator.y.c0));
    }
}
