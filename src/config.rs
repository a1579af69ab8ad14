use crate::domain::types::{Address, ChainId, TxHash};

/// Base Sepolia testnet.
pub const BASE_SEPOLIA_CHAIN_ID: ChainId = 84532;

/// Confidential USDC deployed on Base Sepolia.
pub const BASE_SEPOLIA_CUSDC: &str = "0x7bad07b6b6064dfb033207794625ffa4322cb392";

/// Tokens handled by the app use 9 decimals (GWEI style).
pub const DEFAULT_TOKEN_DECIMALS: u32 = 9;

/// Static per-network settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEntry {
    pub chain_id: ChainId,
    pub name: &'static str,
    pub default_token: &'static str,
    pub explorer_tx_url: &'static str,
}

/// Lookup table from chain id to network settings.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    entries: Vec<NetworkEntry>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            entries: vec![NetworkEntry {
                chain_id: BASE_SEPOLIA_CHAIN_ID,
                name: "Base Sepolia",
                default_token: BASE_SEPOLIA_CUSDC,
                explorer_tx_url: "https://sepolia.basescan.org/tx/",
            }],
        }
    }
}

impl NetworkConfig {
    pub fn new(entries: Vec<NetworkEntry>) -> Self {
        Self { entries }
    }

    pub fn entry(&self, chain_id: ChainId) -> Option<&NetworkEntry> {
        self.entries.iter().find(|e| e.chain_id == chain_id)
    }

    pub fn default_token(&self, chain_id: ChainId) -> Option<Address> {
        self.entry(chain_id).map(|e| Address::new(e.default_token))
    }

    /// A user-entered address wins over the network default.
    pub fn resolve_token(&self, explicit: Option<&str>, chain_id: ChainId) -> Option<Address> {
        Address::parse_optional(explicit).or_else(|| self.default_token(chain_id))
    }

    pub fn explorer_link(&self, chain_id: ChainId, hash: &TxHash) -> Option<String> {
        self.entry(chain_id)
            .map(|e| format!("{}{}", e.explorer_tx_url, hash))
    }
}
