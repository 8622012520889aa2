//! Client for the retrieval service.
//!
//! Retrieval needs the blob header and reference block number from the
//! dispersal step; persisting those is the caller's responsibility. The
//! returned bytes are still framed; decode them with the payload's original
//! length.

use eigenda_core::{BlobHeader, QuorumId};
use eigenda_proto::retriever::v2::{retriever_client::RetrieverClient as RawRetrieverClient, BlobRequest};
use std::time::Duration;
use tonic::transport::{Channel, ClientTlsConfig};
use tracing::debug;

/// Errors surfaced by [`RetrieverClient`].
#[derive(thiserror::Error, Debug)]
pub enum RetrieverError {
    /// the configured endpoint is not a valid URI
    #[error("invalid retriever endpoint: {0}")]
    InvalidEndpoint(String),
    /// RPC failure, timeout, or disconnect
    #[error("transport error: {0}")]
    Transport(#[from] tonic::Status),
    /// channel construction failed
    #[error("connection setup failed: {0}")]
    Connection(#[from] tonic::transport::Error),
}

/// Connection settings for a retrieval node.
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    pub hostname: String,
    pub port: u16,
    pub use_secure_grpc: bool,
    /// Retrieval moves whole blobs, so the default deadline is generous.
    pub timeout: Duration,
}

impl RetrieverConfig {
    pub fn new(hostname: impl Into<String>, port: u16, use_secure_grpc: bool) -> Self {
        Self { hostname: hostname.into(), port, use_secure_grpc, timeout: Duration::from_secs(60) }
    }
}

/// Client for fetching blobs back from storage nodes.
#[derive(Debug, Clone)]
pub struct RetrieverClient {
    channel: Channel,
}

impl RetrieverClient {
    /// Build a client. The channel connects lazily on the first RPC.
    pub fn new(config: RetrieverConfig) -> Result<Self, RetrieverError> {
        let scheme = if config.use_secure_grpc { "https" } else { "http" };
        let uri = format!("{scheme}://{}:{}", config.hostname, config.port);
        let mut endpoint = Channel::from_shared(uri.clone())
            .map_err(|err| RetrieverError::InvalidEndpoint(format!("{uri}: {err}")))?
            .timeout(config.timeout)
            .connect_timeout(config.timeout);
        if config.use_secure_grpc {
            endpoint = endpoint.tls_config(ClientTlsConfig::new().with_native_roots())?;
        }
        Ok(Self { channel: endpoint.connect_lazy() })
    }

    /// Fetch the encoded blob described by a dispersal header.
    pub async fn retrieve_blob(
        &self,
        header: &BlobHeader,
        reference_block_number: u32,
        quorum_id: QuorumId,
    ) -> Result<Vec<u8>, RetrieverError> {
        let request = BlobRequest {
            blob_header: Some(header.to_protobuf()),
            reference_block_number,
            quorum_id: u32::from(quorum_id),
        };
        let reply = RawRetrieverClient::new(self.channel.clone()).get_blob(request).await?;
        let data = reply.into_inner().data;
        debug!(blob_key = %header.blob_key(), len = data.len(), "blob retrieved");
        Ok(data)
    }
}
