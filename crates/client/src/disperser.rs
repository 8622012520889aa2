//! The dispersal client.

use crate::{
    accountant::{
        Accountant, Payment, PaymentParams, PaymentStateSnapshot, QuorumPaymentStateSnapshot,
    },
    config::ClientConfig,
    error::DisperserError,
    network::NetworkConfig,
};
use alloy::primitives::Address;
use eigenda_codec::encode_payload;
use eigenda_core::{
    BlobCommitments, BlobHeader, BlobKey, BlobRequestSigner, BlobStatus, BlobVersion,
    ConversionError, PaymentHeader, QuorumId,
};
use eigenda_proto::disperser::v2::{
    disperser_client::DisperserClient as RawDisperserClient, BlobCommitmentRequest,
    BlobStatusRequest, DisperseBlobRequest, GetPaymentStateForAllQuorumsRequest,
    GetPaymentStateRequest,
};
use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};
use tokio::sync::Mutex;
use tonic::transport::{Channel, ClientTlsConfig};
use tracing::{debug, info};

/// Blob versions this client will submit.
pub const SUPPORTED_BLOB_VERSIONS: &[BlobVersion] = &[0];

/// Client for the disperser service. Cheap to clone; clones share the
/// channel and the accountant.
#[derive(Debug, Clone)]
pub struct DisperserClient {
    config: ClientConfig,
    network: NetworkConfig,
    signer: BlobRequestSigner,
    channel: Channel,
    accountant: Arc<Mutex<Accountant>>,
}

impl DisperserClient {
    /// Build a client. The channel connects lazily on the first RPC.
    pub fn new(config: ClientConfig, signer: BlobRequestSigner) -> Result<Self, DisperserError> {
        let network = NetworkConfig::for_disperser_host(&config.disperser_host);

        let scheme = if config.use_secure_grpc { "https" } else { "http" };
        let uri = format!("{scheme}://{}:{}", config.disperser_host, config.disperser_port);
        let mut endpoint = Channel::from_shared(uri.clone())
            .map_err(|err| DisperserError::InvalidEndpoint(format!("{uri}: {err}")))?
            .timeout(config.timeout)
            .connect_timeout(config.timeout);
        if config.use_secure_grpc {
            endpoint = endpoint.tls_config(ClientTlsConfig::new().with_native_roots())?;
        }
        let channel = endpoint.connect_lazy();

        let params = PaymentParams {
            price_per_symbol: network.price_per_symbol,
            min_num_symbols: network.min_num_symbols,
            reservation_period_interval: network.reservation_period_interval,
        };
        let accountant = if config.per_quorum_payments {
            Accountant::new_per_quorum(params)
        } else {
            Accountant::new_simple(params)
        };

        Ok(Self {
            config,
            network,
            signer,
            channel,
            accountant: Arc::new(Mutex::new(accountant)),
        })
    }

    /// The network this client resolved from its disperser host.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// The paying account.
    pub fn account_id(&self) -> Address {
        self.signer.account_id()
    }

    fn raw(&self) -> RawDisperserClient<Channel> {
        RawDisperserClient::new(self.channel.clone())
    }

    /// Disperse a raw payload to the given quorums.
    ///
    /// Runs the full pipeline: encode, fetch commitments, allocate payment,
    /// build and sign the header, submit, and verify the server derived the
    /// same blob key. The accountant lock is held from the payment-state
    /// sync until the server's verdict so concurrent dispersals observe
    /// strictly ordered payments.
    pub async fn disperse_blob(
        &self,
        data: &[u8],
        blob_version: BlobVersion,
        quorums: &[QuorumId],
    ) -> Result<(BlobStatus, BlobKey), DisperserError> {
        validate_request(data, quorums, blob_version)?;

        let encoded = encode_payload(data);
        let commitment = self.get_blob_commitment(&encoded).await?;
        debug!(
            payload_len = data.len(),
            encoded_len = encoded.len(),
            symbols = commitment.length,
            "blob commitment received"
        );

        let mut accountant = self.accountant.lock().await;
        self.sync_payment_state(&mut accountant).await?;

        let timestamp_ns = now_ns();
        let (payment, commit) = accountant.allocate(encoded.len(), quorums, timestamp_ns)?;

        let mut quorum_numbers = quorums.to_vec();
        quorum_numbers.sort_unstable();
        let header = BlobHeader {
            version: blob_version,
            quorum_numbers,
            commitment,
            payment_header: PaymentHeader {
                account_id: self.signer.account_id(),
                timestamp_ns,
                cumulative_payment: payment.cumulative_payment(),
            },
        };
        let blob_key = header.blob_key();

        let signature = match self.signer.sign_blob_key(&blob_key) {
            Ok(signature) => signature,
            Err(err) => {
                accountant.rollback(commit);
                return Err(err.into());
            }
        };

        let request = DisperseBlobRequest {
            blob: encoded,
            blob_header: Some(header.to_protobuf()),
            signature: signature.to_vec(),
        };
        let reply = match self.raw().disperse_blob(request).await {
            Ok(reply) => reply.into_inner(),
            Err(status) => {
                accountant.rollback(commit);
                return Err(status.into());
            }
        };

        if reply.blob_key.as_slice() != blob_key.as_bytes() {
            accountant.rollback(commit);
            return Err(DisperserError::BlobKeyMismatch {
                local: blob_key,
                server: alloy::hex::encode(&reply.blob_key),
            });
        }

        let status = BlobStatus::from_i32(reply.result);
        if !status.is_accepted() {
            accountant.rollback(commit);
            return Err(DisperserError::ServerFailure { status });
        }

        info!(
            %blob_key,
            ?status,
            reservation = matches!(payment, Payment::Reservation),
            "blob dispersed"
        );
        Ok((status, blob_key))
    }

    /// Fetch and decompress the commitments for an encoded payload.
    pub async fn get_blob_commitment(
        &self,
        encoded: &[u8],
    ) -> Result<BlobCommitments, DisperserError> {
        let reply = self
            .raw()
            .get_blob_commitment(BlobCommitmentRequest { blob: encoded.to_vec() })
            .await?
            .into_inner();
        let commitment = reply.blob_commitment.ok_or(ConversionError::MissingCommitment)?;
        Ok(BlobCommitments::from_protobuf(&commitment)?)
    }

    /// Poll the status of a dispersed blob.
    pub async fn get_blob_status(&self, blob_key: &BlobKey) -> Result<BlobStatus, DisperserError> {
        let reply = self
            .raw()
            .get_blob_status(BlobStatusRequest { blob_key: blob_key.as_bytes().to_vec() })
            .await?
            .into_inner();
        Ok(BlobStatus::from_i32(reply.status))
    }

    /// Fetch the server's view of this account's payment state without
    /// touching the accountant.
    pub async fn get_payment_state(&self) -> Result<PaymentStateSnapshot, DisperserError> {
        let (account_id, timestamp, signature) = self.payment_state_auth()?;
        let reply = self
            .raw()
            .get_payment_state(GetPaymentStateRequest { account_id, signature, timestamp })
            .await?
            .into_inner();
        Ok(PaymentStateSnapshot::from_protobuf(&reply))
    }

    /// Refresh the accountant from the server before an allocation.
    async fn sync_payment_state(
        &self,
        accountant: &mut Accountant,
    ) -> Result<(), DisperserError> {
        let (account_id, timestamp, signature) = self.payment_state_auth()?;

        if self.config.per_quorum_payments {
            let reply = self
                .raw()
                .get_payment_state_for_all_quorums(GetPaymentStateForAllQuorumsRequest {
                    account_id,
                    signature,
                    timestamp,
                })
                .await?
                .into_inner();
            accountant.sync_per_quorum(&QuorumPaymentStateSnapshot::from_protobuf(&reply));
        } else {
            let reply = self
                .raw()
                .get_payment_state(GetPaymentStateRequest { account_id, signature, timestamp })
                .await?
                .into_inner();
            accountant.sync(&PaymentStateSnapshot::from_protobuf(&reply));
        }
        Ok(())
    }

    fn payment_state_auth(&self) -> Result<(String, u64, Vec<u8>), DisperserError> {
        let timestamp = now_ns() as u64;
        let signature = self.signer.sign_payment_state_request(timestamp)?;
        Ok((self.signer.account_id().to_checksum(None), timestamp, signature.to_vec()))
    }
}

fn validate_request(
    data: &[u8],
    quorums: &[QuorumId],
    version: BlobVersion,
) -> Result<(), DisperserError> {
    if data.is_empty() {
        return Err(DisperserError::EmptyPayload);
    }
    if quorums.is_empty() {
        return Err(DisperserError::NoQuorums);
    }
    let mut seen = [false; 256];
    for &quorum in quorums {
        if seen[quorum as usize] {
            return Err(DisperserError::DuplicateQuorum(quorum));
        }
        seen[quorum as usize] = true;
    }
    if !SUPPORTED_BLOB_VERSIONS.contains(&version) {
        return Err(DisperserError::UnsupportedVersion(version));
    }
    Ok(())
}

fn now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_validation() {
        assert!(matches!(
            validate_request(&[], &[0], 0),
            Err(DisperserError::EmptyPayload)
        ));
        assert!(matches!(validate_request(b"data", &[], 0), Err(DisperserError::NoQuorums)));
        assert!(matches!(
            validate_request(b"data", &[0, 1, 0], 0),
            Err(DisperserError::DuplicateQuorum(0))
        ));
        assert!(matches!(
            validate_request(b"data", &[0, 1], 7),
            Err(DisperserError::UnsupportedVersion(7))
        ));
        assert!(validate_request(b"data", &[1, 0], 0).is_ok());
    }

    #[test]
    fn client_construction_resolves_the_network() {
        let signer = BlobRequestSigner::from_hex(
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80",
        )
        .unwrap();
        let config = ClientConfig {
            disperser_host: "127.0.0.1".to_string(),
            disperser_port: 50051,
            use_secure_grpc: false,
            ..ClientConfig::default()
        };

        let client = DisperserClient::new(config, signer).unwrap();
        assert_eq!(client.network().network_name, "Sepolia Testnet");
        assert_eq!(
            client.account_id().to_checksum(None),
            "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"
        );
    }
}
