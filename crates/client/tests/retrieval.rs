//! Retrieval round-trip against an in-process mock retriever node.

use ark_bn254::{G1Affine, G2Affine};
use ark_ec::AffineRepr;
use eigenda_client::{RetrieverClient, RetrieverConfig};
use eigenda_codec::{decode_payload, encode_payload};
use eigenda_core::{BlobCommitments, BlobHeader, PaymentHeader};
use eigenda_proto::retriever::v2::{
    retriever_server::{Retriever, RetrieverServer},
    BlobReply, BlobRequest,
};
use alloy::primitives::{Address, U256};
use std::net::SocketAddr;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::{Request, Response, Status};

/// Serves one stored blob, keyed by the header's blob key.
struct MockRetriever {
    blob_key: eigenda_core::BlobKey,
    encoded: Vec<u8>,
}

#[tonic::async_trait]
impl Retriever for MockRetriever {
    async fn get_blob(
        &self,
        request: Request<BlobRequest>,
    ) -> Result<Response<BlobReply>, Status> {
        let request = request.into_inner();
        let proto_header =
            request.blob_header.ok_or_else(|| Status::invalid_argument("missing header"))?;
        let header = BlobHeader::from_protobuf(&proto_header)
            .map_err(|err| Status::invalid_argument(err.to_string()))?;

        if header.blob_key() != self.blob_key {
            return Err(Status::not_found("no such blob"));
        }
        Ok(Response::new(BlobReply { data: self.encoded.clone() }))
    }
}

async fn spawn_mock(mock: MockRetriever) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        tonic::transport::Server::builder()
            .add_service(RetrieverServer::new(mock))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });
    addr
}

fn header_for(encoded_len: usize) -> BlobHeader {
    BlobHeader {
        version: 0,
        quorum_numbers: vec![0, 1],
        commitment: BlobCommitments {
            commitment: G1Affine::generator(),
            length_commitment: G2Affine::generator(),
            length_proof: G2Affine::generator(),
            length: (encoded_len / 32) as u32,
        },
        payment_header: PaymentHeader {
            account_id: Address::repeat_byte(0x42),
            timestamp_ns: 1_700_000_000_000_000_000,
            cumulative_payment: U256::ZERO,
        },
    }
}

#[tokio::test]
async fn retrieve_and_decode_round_trip() {
    let payload = b"the payload that went out through the disperser".to_vec();
    let encoded = encode_payload(&payload);
    let header = header_for(encoded.len());

    let addr = spawn_mock(MockRetriever { blob_key: header.blob_key(), encoded: encoded.clone() })
        .await;
    let client = RetrieverClient::new(RetrieverConfig::new(addr.ip().to_string(), addr.port(), false))
        .unwrap();

    let retrieved = client.retrieve_blob(&header, 100, 0).await.unwrap();
    assert_eq!(retrieved, encoded);
    assert_eq!(decode_payload(&retrieved, payload.len()).unwrap(), payload);
}

#[tokio::test]
async fn unknown_blob_surfaces_the_server_error() {
    let payload = b"stored".to_vec();
    let encoded = encode_payload(&payload);
    let header = header_for(encoded.len());

    let addr = spawn_mock(MockRetriever { blob_key: header.blob_key(), encoded }).await;
    let client = RetrieverClient::new(RetrieverConfig::new(addr.ip().to_string(), addr.port(), false))
        .unwrap();

    // Perturb the header so its key no longer matches the stored blob.
    let mut wrong = header.clone();
    wrong.payment_header.timestamp_ns += 1;
    let err = client.retrieve_blob(&wrong, 100, 0).await.unwrap_err();
    match err {
        eigenda_client::RetrieverError::Transport(status) => {
            assert_eq!(status.code(), tonic::Code::NotFound);
        }
        other => panic!("unexpected error: {other}"),
    }
}
