//! Request signing for dispersal and payment-state queries.

use crate::types::BlobKey;
use alloy::{
    hex,
    primitives::{keccak256, Address, PrimitiveSignature, B256},
    signers::{local::LocalSigner, SignerSync},
};
use k256::ecdsa::SigningKey;
use sha2::{Digest, Sha256};

type K256LocalSigner = LocalSigner<SigningKey>;

/// Errors from signer construction or signing.
#[derive(thiserror::Error, Debug)]
pub enum SignerError {
    /// private key was not valid hex
    #[error("private key was not valid hex")]
    InvalidPrivateKeyHex(#[from] hex::FromHexError),
    /// invalid private key
    #[error("invalid private key: {0}")]
    Ecdsa(#[from] k256::ecdsa::Error),
    /// error producing a signature
    #[error("signing failed: {0}")]
    Signature(#[from] alloy::signers::Error),
}

/// Signs dispersal requests and payment-state queries with the account's
/// secp256k1 key. Immutable once constructed; cheap to clone and share.
#[derive(Debug, Clone)]
pub struct BlobRequestSigner {
    signer: K256LocalSigner,
}

impl BlobRequestSigner {
    /// Build from a 32-byte private key in hex, with or without a `0x`
    /// prefix.
    pub fn from_hex(private_key: &str) -> Result<Self, SignerError> {
        let stripped = private_key.trim_start_matches("0x");
        let decoded = hex::decode(stripped)?;
        let signer = K256LocalSigner::from_slice(&decoded)?;
        Ok(Self { signer })
    }

    /// The account address derived from the private key.
    pub fn account_id(&self) -> Address {
        self.signer.address()
    }

    /// Sign a blob key. Returns 65 bytes `r || s || v` with `v` in {0, 1}.
    pub fn sign_blob_key(&self, blob_key: &BlobKey) -> Result<[u8; 65], SignerError> {
        let digest = B256::from(*blob_key.as_bytes());
        let signature = self.signer.sign_hash_sync(&digest)?;
        Ok(serialize_signature(&signature))
    }

    /// Sign a payment-state query for this account at the given timestamp.
    pub fn sign_payment_state_request(&self, timestamp_ns: u64) -> Result<[u8; 65], SignerError> {
        let digest = payment_state_request_digest(self.account_id(), timestamp_ns);
        let signature = self.signer.sign_hash_sync(&digest)?;
        Ok(serialize_signature(&signature))
    }
}

/// Digest a payment-state request the way the disperser verifies it:
/// `SHA256(keccak256(len_prefix(account) || be_u64(timestamp_ns)))`, where
/// the prefix is one byte holding the address length.
pub fn payment_state_request_digest(account_id: Address, timestamp_ns: u64) -> B256 {
    let mut message = Vec::with_capacity(1 + Address::len_bytes() + 8);
    message.push(Address::len_bytes() as u8);
    message.extend_from_slice(account_id.as_slice());
    message.extend_from_slice(&timestamp_ns.to_be_bytes());

    let wrapped = keccak256(&message);
    B256::from_slice(Sha256::digest(wrapped).as_slice())
}

/// Wire form of a recoverable signature: `r || s || v` with the recovery
/// byte 0 or 1, never the Ethereum 27/28 convention.
fn serialize_signature(signature: &PrimitiveSignature) -> [u8; 65] {
    let mut out = [0u8; 65];
    out[..32].copy_from_slice(&signature.r().to_be_bytes::<32>());
    out[32..64].copy_from_slice(&signature.s().to_be_bytes::<32>());
    out[64] = signature.v() as u8;
    out
}
