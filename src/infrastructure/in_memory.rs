//! In-process simulated network: a wallet, an encryption client and a
//! confidential token ledger that share one sealing key.

use crate::config::DEFAULT_TOKEN_DECIMALS;
use crate::domain::ports::{EncryptionClient, TokenClient, Wallet};
use crate::domain::types::{
    Address, ChainId, Ciphertext, EncryptedHandle, Receipt, ReceiptStatus, TxHash,
};
use crate::error::{ChainError, EncryptionError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

const SEAL_KEY: &[u8] = b"comfypay-devnet-seal";

/// Executor fee charged per ciphertext on the simulated network, in wei.
pub const DEVNET_EXECUTOR_FEE: u128 = 1_000_000_000_000;

fn mask(bytes: &mut [u8]) {
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte ^= SEAL_KEY[i % SEAL_KEY.len()];
    }
}

/// Layout before masking: value (16 bytes, big endian), account length
/// (1 byte), account, contract.
fn seal(value: u128, account: &Address, contract: &Address) -> Ciphertext {
    let account = account.as_str().as_bytes();
    let contract = contract.as_str().as_bytes();
    let mut bytes = Vec::with_capacity(17 + account.len() + contract.len());
    bytes.extend_from_slice(&value.to_be_bytes());
    bytes.push(account.len() as u8);
    bytes.extend_from_slice(account);
    bytes.extend_from_slice(contract);
    mask(&mut bytes);
    Ciphertext(bytes)
}

struct Opened {
    value: u128,
    account: String,
    contract: String,
}

fn open(ciphertext: &Ciphertext) -> Option<Opened> {
    let mut bytes = ciphertext.as_bytes().to_vec();
    mask(&mut bytes);
    if bytes.len() < 17 {
        return None;
    }
    let value = u128::from_be_bytes(bytes[..16].try_into().ok()?);
    let account_len = bytes[16] as usize;
    let rest = &bytes[17..];
    if rest.len() < account_len {
        return None;
    }
    let (account, contract) = rest.split_at(account_len);
    Some(Opened {
        value,
        account: String::from_utf8(account.to_vec()).ok()?,
        contract: String::from_utf8(contract.to_vec()).ok()?,
    })
}

/// A wallet with a fixed account and network.
#[derive(Debug, Clone)]
pub struct InMemoryWallet {
    account: Option<Address>,
    chain_id: ChainId,
}

impl InMemoryWallet {
    pub fn connected(account: &str, chain_id: ChainId) -> Self {
        Self {
            account: Address::parse_optional(Some(account)),
            chain_id,
        }
    }

    pub fn disconnected(chain_id: ChainId) -> Self {
        Self {
            account: None,
            chain_id,
        }
    }
}

impl Wallet for InMemoryWallet {
    fn account(&self) -> Option<Address> {
        self.account.clone()
    }

    fn chain_id(&self) -> ChainId {
        self.chain_id
    }
}

/// Encryption client that seals values with the devnet key.
///
/// Must be initialized before use.
#[derive(Debug, Default)]
pub struct InMemoryEncryption {
    ready: AtomicBool,
}

impl InMemoryEncryption {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EncryptionClient for InMemoryEncryption {
    async fn initialize(&self) -> Result<(), EncryptionError> {
        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    async fn encrypt(
        &self,
        value: u128,
        account: &Address,
        contract: &Address,
    ) -> Result<Ciphertext, EncryptionError> {
        if !self.is_ready() {
            return Err(EncryptionError::NotInitialized);
        }
        if account.as_str().len() > u8::MAX as usize {
            return Err(EncryptionError::Failed(format!(
                "account address too long: {account}"
            )));
        }
        Ok(seal(value, account, contract))
    }

    async fn fee(&self) -> Result<u128, EncryptionError> {
        if !self.is_ready() {
            return Err(EncryptionError::NotInitialized);
        }
        Ok(DEVNET_EXECUTOR_FEE)
    }
}

/// A transfer accepted by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerTransfer {
    pub hash: TxHash,
    pub token: Address,
    pub from: Address,
    pub to: String,
    pub units: u128,
}

#[derive(Default)]
struct LedgerState {
    nonce: u64,
    receipts: HashMap<TxHash, Receipt>,
    transfers: Vec<LedgerTransfer>,
}

/// Confidential token ledger.
///
/// Transfers are finalized immediately. A transfer is reverted when the
/// ciphertext was sealed for another sender or contract, or when the
/// recipient is not a well-formed address.
#[derive(Clone)]
pub struct InMemoryTokenLedger {
    decimals: u32,
    state: Arc<RwLock<LedgerState>>,
}

impl Default for InMemoryTokenLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self {
            decimals: DEFAULT_TOKEN_DECIMALS,
            state: Arc::new(RwLock::new(LedgerState::default())),
        }
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    pub async fn transfers(&self) -> Vec<LedgerTransfer> {
        self.state.read().await.transfers.clone()
    }
}

#[async_trait]
impl TokenClient for InMemoryTokenLedger {
    async fn balance_of(
        &self,
        _token: &Address,
        owner: &Address,
    ) -> Result<EncryptedHandle, ChainError> {
        let state = self.state.read().await;
        let received = state
            .transfers
            .iter()
            .filter(|t| t.to == owner.as_str())
            .count();
        Ok(EncryptedHandle(format!("0x{received:064x}")))
    }

    async fn decimals(&self, _token: &Address) -> Result<u32, ChainError> {
        Ok(self.decimals)
    }

    async fn transfer(
        &self,
        token: &Address,
        from: &Address,
        to: &str,
        ciphertext: &Ciphertext,
    ) -> Result<TxHash, ChainError> {
        let opened = open(ciphertext)
            .ok_or_else(|| ChainError::Reverted("malformed ciphertext".to_string()))?;
        if opened.account != from.as_str() || opened.contract != token.as_str() {
            return Err(ChainError::Reverted(
                "ciphertext not valid for this account and contract".to_string(),
            ));
        }
        if !Address::new(to).is_well_formed() {
            return Err(ChainError::Reverted(format!("invalid recipient address: {to}")));
        }

        let mut state = self.state.write().await;
        state.nonce += 1;
        let hash = TxHash(format!("0x{:064x}", state.nonce));
        let receipt = Receipt {
            hash: hash.clone(),
            block_number: state.nonce,
            status: ReceiptStatus::Success,
        };
        state.receipts.insert(hash.clone(), receipt);
        state.transfers.push(LedgerTransfer {
            hash: hash.clone(),
            token: token.clone(),
            from: from.clone(),
            to: to.to_string(),
            units: opened.value,
        });
        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: &TxHash) -> Result<Receipt, ChainError> {
        let state = self.state.read().await;
        state
            .receipts
            .get(hash)
            .cloned()
            .ok_or_else(|| ChainError::UnknownTransaction(hash.to_string()))
    }
}
