//! Data model shared across the dispersal pipeline.

use alloy::{
    hex,
    primitives::{Address, U256},
};
use ark_bn254::{G1Affine, G2Affine};
use eigenda_bn254::{compress_g1, compress_g2, decompress_g1, decompress_g2, PointError};
use std::fmt;

/// Identifier of a storage quorum.
pub type QuorumId = u8;

/// Blob format version understood by the disperser.
pub type BlobVersion = u16;

/// Errors from converting wire messages into core types.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// reply is missing the commitment message
    #[error("missing blob commitment")]
    MissingCommitment,
    /// header is missing the payment header message
    #[error("missing payment header")]
    MissingPaymentHeader,
    /// quorum number does not fit in a byte
    #[error("quorum number {0} out of range")]
    InvalidQuorum(u32),
    /// version does not fit the header version width
    #[error("blob version {0} out of range")]
    InvalidVersion(u32),
    /// account id is not a valid hex address
    #[error("invalid account id: {0}")]
    InvalidAccountId(String),
    /// a commitment point failed to decompress
    #[error(transparent)]
    Point(#[from] PointError),
}

/// The 32-byte keccak digest identifying a dispersed blob.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlobKey(pub [u8; 32]);

impl BlobKey {
    /// Parse from a hex string, with or without a `0x` prefix.
    pub fn from_hex(value: &str) -> Result<Self, hex::FromHexError> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(value.trim_start_matches("0x"), &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Lowercase hex, no prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobKey({})", self.to_hex())
    }
}

/// Status of a dispersed blob. Discriminants are wire-fixed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum BlobStatus {
    Unknown = 0,
    Queued = 1,
    Encoded = 2,
    GatheringSignatures = 3,
    Complete = 4,
    Failed = 5,
}

impl BlobStatus {
    /// Map a raw wire value; anything unrecognized is `Unknown`.
    pub const fn from_i32(value: i32) -> Self {
        match value {
            1 => Self::Queued,
            2 => Self::Encoded,
            3 => Self::GatheringSignatures,
            4 => Self::Complete,
            5 => Self::Failed,
            _ => Self::Unknown,
        }
    }

    /// Whether the disperser accepted the blob.
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Queued | Self::Encoded | Self::GatheringSignatures | Self::Complete)
    }
}

/// KZG commitment material for one blob, decompressed on receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobCommitments {
    /// G1 commitment to the blob polynomial.
    pub commitment: G1Affine,
    /// G2 commitment to the blob length.
    pub length_commitment: G2Affine,
    /// G2 proof for the length commitment.
    pub length_proof: G2Affine,
    /// Number of 32-byte symbols in the encoded blob.
    pub length: u32,
}

impl BlobCommitments {
    /// Decompress the commitment material from its wire form.
    pub fn from_protobuf(proto: &eigenda_proto::common::BlobCommitment) -> Result<Self, PointError> {
        Ok(Self {
            commitment: decompress_g1(&proto.commitment)?,
            length_commitment: decompress_g2(&proto.length_commitment)?,
            length_proof: decompress_g2(&proto.length_proof)?,
            length: proto.length,
        })
    }

    /// Re-compress into the wire form.
    pub fn to_protobuf(&self) -> eigenda_proto::common::BlobCommitment {
        eigenda_proto::common::BlobCommitment {
            commitment: compress_g1(&self.commitment).to_vec(),
            length_commitment: compress_g2(&self.length_commitment).to_vec(),
            length_proof: compress_g2(&self.length_proof).to_vec(),
            length: self.length,
        }
    }
}

/// Payment metadata for one dispersal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentHeader {
    pub account_id: Address,
    /// Dispersal timestamp, Unix nanoseconds.
    pub timestamp_ns: i64,
    /// New cumulative payment in wei. Zero when the dispersal rides a
    /// reservation; the wire then carries empty bytes.
    pub cumulative_payment: U256,
}

impl PaymentHeader {
    /// Wire form of the cumulative payment: big-endian, leading zeros
    /// stripped, empty for zero.
    pub fn cumulative_payment_bytes(&self) -> Vec<u8> {
        self.cumulative_payment.to_be_bytes_trimmed_vec()
    }

    pub fn to_protobuf(&self) -> eigenda_proto::common::v2::PaymentHeader {
        eigenda_proto::common::v2::PaymentHeader {
            account_id: self.account_id.to_checksum(None),
            timestamp: self.timestamp_ns,
            cumulative_payment: self.cumulative_payment_bytes(),
        }
    }

    pub fn from_protobuf(
        proto: &eigenda_proto::common::v2::PaymentHeader,
    ) -> Result<Self, ConversionError> {
        let account_id = proto
            .account_id
            .parse::<Address>()
            .map_err(|_| ConversionError::InvalidAccountId(proto.account_id.clone()))?;
        Ok(Self {
            account_id,
            timestamp_ns: proto.timestamp,
            cumulative_payment: U256::from_be_slice(&proto.cumulative_payment),
        })
    }
}

/// Header describing one dispersed blob.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobHeader {
    pub version: BlobVersion,
    /// Sorted, duplicate-free.
    pub quorum_numbers: Vec<QuorumId>,
    pub commitment: BlobCommitments,
    pub payment_header: PaymentHeader,
}

impl BlobHeader {
    /// Derive the canonical blob key for this header.
    pub fn blob_key(&self) -> BlobKey {
        crate::hashing::compute_blob_key(self)
    }

    pub fn to_protobuf(&self) -> eigenda_proto::common::v2::BlobHeader {
        eigenda_proto::common::v2::BlobHeader {
            version: u32::from(self.version),
            quorum_numbers: self.quorum_numbers.iter().map(|&q| u32::from(q)).collect(),
            commitment: Some(self.commitment.to_protobuf()),
            payment_header: Some(self.payment_header.to_protobuf()),
        }
    }

    pub fn from_protobuf(
        proto: &eigenda_proto::common::v2::BlobHeader,
    ) -> Result<Self, ConversionError> {
        let version: BlobVersion =
            proto.version.try_into().map_err(|_| ConversionError::InvalidVersion(proto.version))?;
        let quorum_numbers = proto
            .quorum_numbers
            .iter()
            .map(|&q| QuorumId::try_from(q).map_err(|_| ConversionError::InvalidQuorum(q)))
            .collect::<Result<Vec<_>, _>>()?;
        let commitment = proto.commitment.as_ref().ok_or(ConversionError::MissingCommitment)?;
        let payment_header =
            proto.payment_header.as_ref().ok_or(ConversionError::MissingPaymentHeader)?;
        Ok(Self {
            version,
            quorum_numbers,
            commitment: BlobCommitments::from_protobuf(commitment)?,
            payment_header: PaymentHeader::from_protobuf(payment_header)?,
        })
    }
}

/// A prepaid bandwidth allocation, valid over `[start_ns, end_ns)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub symbols_per_second: u64,
    pub start_ns: i64,
    pub end_ns: i64,
    pub quorum_numbers: Vec<QuorumId>,
    /// Percent split per quorum, parallel to `quorum_numbers`.
    pub quorum_splits: Vec<u8>,
}

impl Reservation {
    /// Whether the reservation covers the given instant.
    pub fn is_active(&self, timestamp_ns: i64) -> bool {
        self.start_ns <= timestamp_ns && timestamp_ns < self.end_ns
    }

    pub fn covers_quorum(&self, quorum: QuorumId) -> bool {
        self.quorum_numbers.contains(&quorum)
    }
}

/// Usage record for one reservation period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PeriodRecord {
    pub index: u32,
    pub usage_symbols: u64,
}
