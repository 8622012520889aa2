//! Client for the EigenDA v2 dispersal service.
//!
//! One dispersal runs the full pipeline: the raw payload is framed into
//! field-element-safe symbols, the disperser computes KZG commitments for the
//! framed bytes, the accountant decides whether the blob rides a prepaid
//! reservation or an on-demand payment, the canonical blob header is built
//! and hashed into the blob key, the key is signed with the account's
//! secp256k1 key, and the signed request is submitted over gRPC.

pub mod accountant;
pub mod config;
pub mod disperser;
pub mod error;
pub mod network;
pub mod retriever;

pub use accountant::{
    Accountant, AccountantError, Payment, PaymentParams, PaymentStateSnapshot,
    QuorumPaymentStateSnapshot,
};
pub use config::{ClientConfig, ConfigError};
pub use disperser::{DisperserClient, SUPPORTED_BLOB_VERSIONS};
pub use error::DisperserError;
pub use network::NetworkConfig;
pub use retriever::{RetrieverClient, RetrieverConfig, RetrieverError};
