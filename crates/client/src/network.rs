//! Compiled-in network parameters.
//!
//! Each supported network maps the disperser host to the chain and payment
//! constants the client needs before its first payment-state sync. Lookup is
//! by disperser host; an unrecognized host falls back to the sepolia row with
//! the host substituted, so self-hosted dispersers work out of the box.

use alloy::primitives::{address, Address};
use eigenda_core::BlobKey;

/// Parameters for one EigenDA network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkConfig {
    pub network_name: &'static str,
    pub disperser_host: String,
    pub disperser_port: u16,
    pub chain_id: u64,
    pub payment_vault_address: Address,
    pub explorer_base_url: &'static str,
    /// Wei per symbol for on-demand payments.
    pub price_per_symbol: u64,
    /// Minimum symbols charged per blob.
    pub min_num_symbols: u64,
    /// Reservation period length in seconds.
    pub reservation_period_interval: u64,
}

impl NetworkConfig {
    pub fn mainnet() -> Self {
        Self {
            network_name: "Ethereum Mainnet",
            disperser_host: "disperser.eigenda.xyz".to_string(),
            disperser_port: 443,
            chain_id: 1,
            payment_vault_address: address!("b2e7ef419a2A399472ae22ef5cFcCb8bE97A4B05"),
            explorer_base_url: "https://blobs.eigenda.xyz",
            price_per_symbol: 447_000_000,
            min_num_symbols: 4096,
            reservation_period_interval: 300,
        }
    }

    pub fn holesky() -> Self {
        Self {
            network_name: "Holesky Testnet",
            disperser_host: "disperser-testnet-holesky.eigenda.xyz".to_string(),
            disperser_port: 443,
            chain_id: 17000,
            payment_vault_address: address!("4a7Fff191BCDa5806f1Bc8689afc1417c08C61AB"),
            explorer_base_url: "https://blobs-v2-testnet-holesky.eigenda.xyz",
            price_per_symbol: 447_000_000,
            min_num_symbols: 4096,
            reservation_period_interval: 300,
        }
    }

    pub fn sepolia() -> Self {
        Self {
            network_name: "Sepolia Testnet",
            disperser_host: "disperser-testnet-sepolia.eigenda.xyz".to_string(),
            disperser_port: 443,
            chain_id: 11155111,
            payment_vault_address: address!("2E1BDB221E7D6bD9B7b2365208d41A5FD70b24Ed"),
            explorer_base_url: "https://blobs-v2-testnet-sepolia.eigenda.xyz",
            price_per_symbol: 447_000_000,
            min_num_symbols: 4096,
            reservation_period_interval: 300,
        }
    }

    /// Resolve the network for a disperser host. Matching is
    /// case-insensitive and the caller's spelling is kept; unknown hosts get
    /// the sepolia parameters with the host substituted.
    pub fn for_disperser_host(host: &str) -> Self {
        for network in [Self::mainnet(), Self::holesky(), Self::sepolia()] {
            if host.eq_ignore_ascii_case(&network.disperser_host) {
                return Self { disperser_host: host.to_string(), ..network };
            }
        }
        Self { disperser_host: host.to_string(), ..Self::sepolia() }
    }

    /// Explorer page for a dispersed blob.
    pub fn explorer_url(&self, blob_key: &BlobKey) -> String {
        format!("{}/blobs/{}", self.explorer_base_url, blob_key.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_hosts_resolve_to_their_network() {
        let holesky = NetworkConfig::for_disperser_host("disperser-testnet-holesky.eigenda.xyz");
        assert_eq!(holesky.network_name, "Holesky Testnet");
        assert_eq!(
            holesky.payment_vault_address,
            address!("4a7Fff191BCDa5806f1Bc8689afc1417c08C61AB")
        );

        let mainnet = NetworkConfig::for_disperser_host("disperser.eigenda.xyz");
        assert_eq!(mainnet.network_name, "Ethereum Mainnet");
        assert_eq!(mainnet.chain_id, 1);

        let sepolia = NetworkConfig::for_disperser_host("disperser-testnet-sepolia.eigenda.xyz");
        assert_eq!(sepolia.network_name, "Sepolia Testnet");
        assert_eq!(
            sepolia.payment_vault_address,
            address!("2E1BDB221E7D6bD9B7b2365208d41A5FD70b24Ed")
        );
    }

    #[test]
    fn shared_payment_constants() {
        for network in
            [NetworkConfig::mainnet(), NetworkConfig::holesky(), NetworkConfig::sepolia()]
        {
            assert_eq!(network.disperser_port, 443);
            assert_eq!(network.price_per_symbol, 447_000_000);
            assert_eq!(network.min_num_symbols, 4096);
            assert_eq!(network.reservation_period_interval, 300);
        }
    }

    #[test]
    fn host_matching_is_case_insensitive() {
        let mainnet = NetworkConfig::for_disperser_host("DISPERSER.EIGENDA.XYZ");
        assert_eq!(mainnet.network_name, "Ethereum Mainnet");
        assert_eq!(mainnet.chain_id, 1);
        assert_eq!(
            mainnet.payment_vault_address,
            address!("b2e7ef419a2A399472ae22ef5cFcCb8bE97A4B05")
        );
        // The caller's spelling is preserved.
        assert_eq!(mainnet.disperser_host, "DISPERSER.EIGENDA.XYZ");

        let holesky = NetworkConfig::for_disperser_host("Disperser-Testnet-Holesky.EigenDA.xyz");
        assert_eq!(holesky.network_name, "Holesky Testnet");
        assert_eq!(holesky.chain_id, 17000);

        let sepolia = NetworkConfig::for_disperser_host("DISPERSER-TESTNET-SEPOLIA.EIGENDA.XYZ");
        assert_eq!(sepolia.network_name, "Sepolia Testnet");
    }

    #[test]
    fn unknown_host_falls_back_to_sepolia_parameters() {
        let custom = NetworkConfig::for_disperser_host("disperser.internal.example");
        assert_eq!(custom.disperser_host, "disperser.internal.example");
        assert_eq!(custom.network_name, "Sepolia Testnet");
        assert_eq!(custom.chain_id, 11155111);
    }

    #[test]
    fn explorer_url_embeds_the_blob_key() {
        let key = BlobKey([0xAB; 32]);

        let url = NetworkConfig::mainnet().explorer_url(&key);
        assert_eq!(url, format!("https://blobs.eigenda.xyz/blobs/{}", key.to_hex()));

        let url = NetworkConfig::holesky().explorer_url(&key);
        assert_eq!(
            url,
            format!("https://blobs-v2-testnet-holesky.eigenda.xyz/blobs/{}", key.to_hex())
        );

        let url = NetworkConfig::sepolia().explorer_url(&key);
        assert_eq!(
            url,
            format!("https://blobs-v2-testnet-sepolia.eigenda.xyz/blobs/{}", key.to_hex())
        );
    }
}
