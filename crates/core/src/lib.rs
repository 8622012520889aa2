//! Core types for the EigenDA v2 dispersal pipeline: blob headers, canonical
//! blob-key derivation, and request signing.

pub mod hashing;
pub mod signer;
pub mod types;

pub use signer::{BlobRequestSigner, SignerError};
pub use types::{
    BlobCommitments, BlobHeader, BlobKey, BlobStatus, BlobVersion, ConversionError, PaymentHeader,
    PeriodRecord, QuorumId, Reservation,
};
