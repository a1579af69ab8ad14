use super::types::{Address, ChainId, Ciphertext, EncryptedHandle, Receipt, TxHash};
use crate::error::{ChainError, EncryptionError};
use async_trait::async_trait;

/// The connected wallet as seen by the page.
pub trait Wallet: Send + Sync {
    /// Current account, or `None` when no wallet is connected.
    fn account(&self) -> Option<Address>;
    fn chain_id(&self) -> ChainId;
}

/// Read/write access to a confidential token contract.
#[async_trait]
pub trait TokenClient: Send + Sync {
    async fn balance_of(
        &self,
        token: &Address,
        owner: &Address,
    ) -> Result<EncryptedHandle, ChainError>;

    async fn decimals(&self, token: &Address) -> Result<u32, ChainError>;

    /// Submits `transfer(to, ciphertext)` signed by `from` and returns the
    /// transaction identifier without waiting for inclusion.
    async fn transfer(
        &self,
        token: &Address,
        from: &Address,
        to: &str,
        ciphertext: &Ciphertext,
    ) -> Result<TxHash, ChainError>;

    /// Suspends until the transaction is finalized.
    async fn wait_for_receipt(&self, hash: &TxHash) -> Result<Receipt, ChainError>;
}

/// Client for the confidentiality service that produces ciphertexts.
#[async_trait]
pub trait EncryptionClient: Send + Sync {
    async fn initialize(&self) -> Result<(), EncryptionError>;

    fn is_ready(&self) -> bool;

    /// Encrypts `value` for use by `account` against `contract` only.
    async fn encrypt(
        &self,
        value: u128,
        account: &Address,
        contract: &Address,
    ) -> Result<Ciphertext, EncryptionError>;

    /// Executor fee charged per ciphertext, in wei.
    async fn fee(&self) -> Result<u128, EncryptionError>;
}

pub type WalletBox = Box<dyn Wallet>;
pub type TokenClientBox = Box<dyn TokenClient>;
pub type EncryptionClientBox = Box<dyn EncryptionClient>;
