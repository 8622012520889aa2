//! Error types for the dispersal client.

use crate::accountant::AccountantError;
use eigenda_bn254::PointError;
use eigenda_core::{BlobKey, BlobStatus, BlobVersion, ConversionError, SignerError};

/// Errors surfaced by [`crate::DisperserClient`].
#[derive(thiserror::Error, Debug)]
pub enum DisperserError {
    /// dispersal payload was empty
    #[error("payload must not be empty")]
    EmptyPayload,
    /// no quorums were requested
    #[error("at least one quorum must be requested")]
    NoQuorums,
    /// the quorum list contains a duplicate
    #[error("duplicate quorum {0} in request")]
    DuplicateQuorum(u8),
    /// the blob version is not in the supported set
    #[error("unsupported blob version {0}")]
    UnsupportedVersion(BlobVersion),
    /// the server returned a malformed commitment point
    #[error(transparent)]
    Point(#[from] PointError),
    /// a wire message could not be converted
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    /// neither a reservation nor the on-demand balance covers the blob
    #[error(transparent)]
    Accountant(#[from] AccountantError),
    /// signing failed
    #[error(transparent)]
    Signer(#[from] SignerError),
    /// the server derived a different blob key, indicating a codec or
    /// field-ordering divergence
    #[error("server returned blob key {server}, locally derived {local}")]
    BlobKeyMismatch { local: BlobKey, server: String },
    /// the server rejected the request signature
    #[error("request rejected as unauthenticated: {0}")]
    SignatureRejected(tonic::Status),
    /// the server did not accept the blob
    #[error("dispersal failed with server status {status:?}")]
    ServerFailure { status: BlobStatus },
    /// the configured endpoint is not a valid URI
    #[error("invalid disperser endpoint: {0}")]
    InvalidEndpoint(String),
    /// RPC failure, timeout, or disconnect
    #[error("transport error: {0}")]
    Transport(tonic::Status),
    /// channel construction failed
    #[error("connection setup failed: {0}")]
    Connection(#[from] tonic::transport::Error),
}

impl From<tonic::Status> for DisperserError {
    fn from(status: tonic::Status) -> Self {
        match status.code() {
            tonic::Code::Unauthenticated => Self::SignatureRejected(status),
            _ => Self::Transport(status),
        }
    }
}
