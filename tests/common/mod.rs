#![allow(dead_code)]

use async_trait::async_trait;
use comfypay::application::orchestrator::BatchOrchestrator;
use comfypay::config::{BASE_SEPOLIA_CHAIN_ID, NetworkConfig};
use comfypay::domain::payment::TransactionStatus;
use comfypay::domain::ports::{EncryptionClient, TokenClient};
use comfypay::domain::types::{Address, Ciphertext, EncryptedHandle, Receipt, ReceiptStatus, TxHash};
use comfypay::error::{ChainError, EncryptionError};
use comfypay::infrastructure::in_memory::{InMemoryEncryption, InMemoryTokenLedger, InMemoryWallet};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, watch};

pub const SENDER: &str = "0x9999999999999999999999999999999999999999";
pub const ALICE: &str = "0x1111111111111111111111111111111111111111";
pub const BOB: &str = "0x2222222222222222222222222222222222222222";
pub const CAROL: &str = "0x3333333333333333333333333333333333333333";

pub type EventLog = Arc<Mutex<Vec<String>>>;

/// Failures to inject, keyed by recipient (or by base units for encryption).
#[derive(Clone, Default)]
pub struct Script {
    pub fail_encrypt_units: HashSet<u128>,
    pub reject_transfer_to: HashSet<String>,
    pub revert_receipt_to: HashSet<String>,
    pub panic_transfer_to: HashSet<String>,
    pub gate: Option<Arc<Notify>>,
}

impl Script {
    pub fn reject(mut self, recipient: &str) -> Self {
        self.reject_transfer_to.insert(recipient.to_string());
        self
    }

    pub fn revert(mut self, recipient: &str) -> Self {
        self.revert_receipt_to.insert(recipient.to_string());
        self
    }

    pub fn panic_on(mut self, recipient: &str) -> Self {
        self.panic_transfer_to.insert(recipient.to_string());
        self
    }

    pub fn fail_encrypt(mut self, units: u128) -> Self {
        self.fail_encrypt_units.insert(units);
        self
    }

    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

pub struct ScriptedEncryption {
    inner: InMemoryEncryption,
    fail_units: HashSet<u128>,
    log: EventLog,
}

#[async_trait]
impl EncryptionClient for ScriptedEncryption {
    async fn initialize(&self) -> Result<(), EncryptionError> {
        self.inner.initialize().await
    }

    fn is_ready(&self) -> bool {
        self.inner.is_ready()
    }

    async fn encrypt(
        &self,
        value: u128,
        account: &Address,
        contract: &Address,
    ) -> Result<Ciphertext, EncryptionError> {
        self.log.lock().unwrap().push(format!("encrypt:{value}"));
        if self.fail_units.contains(&value) {
            return Err(EncryptionError::Failed("encryption service unavailable".into()));
        }
        self.inner.encrypt(value, account, contract).await
    }

    async fn fee(&self) -> Result<u128, EncryptionError> {
        self.inner.fee().await
    }
}

#[derive(Clone)]
pub struct ScriptedLedger {
    inner: InMemoryTokenLedger,
    script: Script,
    reverted: Arc<Mutex<HashSet<TxHash>>>,
    log: EventLog,
    observer: Arc<Mutex<Option<watch::Receiver<Vec<TransactionStatus>>>>>,
    snapshots: Arc<Mutex<Vec<Vec<TransactionStatus>>>>,
}

impl ScriptedLedger {
    /// Records the tracker contents every time a transfer is submitted.
    pub fn observe(&self, rx: watch::Receiver<Vec<TransactionStatus>>) {
        *self.observer.lock().unwrap() = Some(rx);
    }

    pub fn snapshots(&self) -> Vec<Vec<TransactionStatus>> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn inner(&self) -> &InMemoryTokenLedger {
        &self.inner
    }
}

#[async_trait]
impl TokenClient for ScriptedLedger {
    async fn balance_of(
        &self,
        token: &Address,
        owner: &Address,
    ) -> Result<EncryptedHandle, ChainError> {
        self.inner.balance_of(token, owner).await
    }

    async fn decimals(&self, token: &Address) -> Result<u32, ChainError> {
        self.inner.decimals(token).await
    }

    async fn transfer(
        &self,
        token: &Address,
        from: &Address,
        to: &str,
        ciphertext: &Ciphertext,
    ) -> Result<TxHash, ChainError> {
        self.log.lock().unwrap().push(format!("transfer:{to}"));
        {
            let observer = self.observer.lock().unwrap();
            if let Some(rx) = observer.as_ref() {
                self.snapshots.lock().unwrap().push(rx.borrow().clone());
            }
        }
        if let Some(gate) = &self.script.gate {
            gate.notified().await;
        }
        if self.script.panic_transfer_to.contains(to) {
            panic!("wallet connector crashed");
        }
        if self.script.reject_transfer_to.contains(to) {
            return Err(ChainError::Rejected("User rejected the request.".into()));
        }
        let hash = self.inner.transfer(token, from, to, ciphertext).await?;
        if self.script.revert_receipt_to.contains(to) {
            self.reverted.lock().unwrap().insert(hash.clone());
        }
        Ok(hash)
    }

    async fn wait_for_receipt(&self, hash: &TxHash) -> Result<Receipt, ChainError> {
        self.log.lock().unwrap().push(format!("receipt:{hash}"));
        let mut receipt = self.inner.wait_for_receipt(hash).await?;
        if self.reverted.lock().unwrap().contains(hash) {
            receipt.status = ReceiptStatus::Reverted;
        }
        Ok(receipt)
    }
}

pub struct Harness {
    pub orchestrator: BatchOrchestrator,
    pub ledger: ScriptedLedger,
    pub log: EventLog,
}

pub async fn harness(script: Script) -> Harness {
    build(script, Some(SENDER), true).await
}

pub async fn build(script: Script, account: Option<&str>, ready: bool) -> Harness {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    let encryption = ScriptedEncryption {
        inner: InMemoryEncryption::new(),
        fail_units: script.fail_encrypt_units.clone(),
        log: log.clone(),
    };
    if ready {
        encryption.initialize().await.unwrap();
    }
    let ledger = ScriptedLedger {
        inner: InMemoryTokenLedger::new(),
        script,
        reverted: Arc::new(Mutex::new(HashSet::new())),
        log: log.clone(),
        observer: Arc::new(Mutex::new(None)),
        snapshots: Arc::new(Mutex::new(Vec::new())),
    };
    let wallet = match account {
        Some(account) => InMemoryWallet::connected(account, BASE_SEPOLIA_CHAIN_ID),
        None => InMemoryWallet::disconnected(BASE_SEPOLIA_CHAIN_ID),
    };

    let orchestrator = BatchOrchestrator::new(
        Box::new(wallet),
        Box::new(ledger.clone()),
        Box::new(encryption),
        NetworkConfig::default(),
    );
    ledger.observe(orchestrator.tracker().subscribe());

    Harness {
        orchestrator,
        ledger,
        log,
    }
}

pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}
