use super::input::BatchInput;
use super::tracker::StatusTracker;
use crate::config::{DEFAULT_TOKEN_DECIMALS, NetworkConfig};
use crate::domain::amount::{DecimalsSource, to_base_units};
use crate::domain::payment::{PaymentRequest, PaymentState, Settlement, TransactionStatus};
use crate::domain::ports::{EncryptionClientBox, TokenClientBox, WalletBox};
use crate::domain::types::{Address, ChainId, Ciphertext, EncryptedHandle, ReceiptStatus, TxHash};
use crate::error::{BatchRejection, ChainError, EncryptionError};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

const GENERIC_FAILURE: &str = "Transaction failed";

/// Which step of a payment attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Amount,
    Encryption,
    Submission,
    Confirmation,
    Unexpected,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepKind::Amount => "amount",
            StepKind::Encryption => "encryption",
            StepKind::Submission => "submission",
            StepKind::Confirmation => "confirmation",
            StepKind::Unexpected => "unexpected",
        };
        f.write_str(name)
    }
}

/// A failed step, carrying the most specific message available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepError {
    pub kind: StepKind,
    pub message: String,
}

impl StepError {
    pub fn new(kind: StepKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            GENERIC_FAILURE.to_string()
        } else {
            message
        };
        Self { kind, message }
    }

    fn chain(kind: StepKind, err: ChainError) -> Self {
        Self::new(kind, err.short_message())
    }

    fn encryption(err: EncryptionError) -> Self {
        let message = match err {
            EncryptionError::Failed(msg) | EncryptionError::Fee(msg) => msg,
            other => other.to_string(),
        };
        Self::new(StepKind::Encryption, message)
    }
}

/// Progress of one recipient's payment.
///
/// `Pending -> Encrypting -> Submitting -> Confirming -> Succeeded`, with a
/// jump to `Failed` from any non-terminal phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipientPhase {
    Pending,
    Encrypting { units: u128 },
    Submitting { ciphertext: Ciphertext },
    Confirming { hash: TxHash },
    Succeeded { hash: TxHash },
    Failed(StepError),
}

impl RecipientPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RecipientPhase::Succeeded { .. } | RecipientPhase::Failed(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            RecipientPhase::Pending => "pending",
            RecipientPhase::Encrypting { .. } => "encrypting",
            RecipientPhase::Submitting { .. } => "submitting",
            RecipientPhase::Confirming { .. } => "confirming",
            RecipientPhase::Succeeded { .. } => "succeeded",
            RecipientPhase::Failed(_) => "failed",
        }
    }
}

/// Everything resolved once before the first submission.
#[derive(Debug, Clone)]
struct BatchContext {
    account: Address,
    token: Address,
    decimals: u32,
    chain_id: ChainId,
}

/// Returned when a batch has run to completion.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub statuses: Vec<TransactionStatus>,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchReport {
    fn from_statuses(statuses: Vec<TransactionStatus>) -> Self {
        let succeeded = statuses
            .iter()
            .filter(|s| s.status == PaymentState::Success)
            .count();
        let failed = statuses
            .iter()
            .filter(|s| s.status == PaymentState::Error)
            .count();
        Self {
            statuses,
            succeeded,
            failed,
        }
    }
}

struct Ports {
    wallet: WalletBox,
    token: TokenClientBox,
    encryption: EncryptionClientBox,
}

impl Ports {
    /// Advances a recipient by exactly one phase.
    async fn step(
        &self,
        ctx: &BatchContext,
        request: &PaymentRequest,
        phase: RecipientPhase,
    ) -> RecipientPhase {
        match phase {
            RecipientPhase::Pending => match to_base_units(&request.amount, ctx.decimals) {
                Ok(units) => RecipientPhase::Encrypting { units },
                Err(e) => RecipientPhase::Failed(StepError::new(StepKind::Amount, e.to_string())),
            },
            RecipientPhase::Encrypting { units } => {
                match self
                    .encryption
                    .encrypt(units, &ctx.account, &ctx.token)
                    .await
                {
                    Ok(ciphertext) => RecipientPhase::Submitting { ciphertext },
                    Err(e) => RecipientPhase::Failed(StepError::encryption(e)),
                }
            }
            RecipientPhase::Submitting { ciphertext } => {
                match self
                    .token
                    .transfer(&ctx.token, &ctx.account, &request.recipient, &ciphertext)
                    .await
                {
                    Ok(hash) => {
                        info!(index = request.index, %hash, "Transaction sent");
                        RecipientPhase::Confirming { hash }
                    }
                    Err(e) => RecipientPhase::Failed(StepError::chain(StepKind::Submission, e)),
                }
            }
            RecipientPhase::Confirming { hash } => match self.token.wait_for_receipt(&hash).await {
                Ok(receipt) if receipt.status == ReceiptStatus::Success => {
                    debug!(index = request.index, block = receipt.block_number, "Transaction confirmed");
                    RecipientPhase::Succeeded { hash }
                }
                Ok(_) => RecipientPhase::Failed(StepError::new(
                    StepKind::Confirmation,
                    "Transaction reverted",
                )),
                Err(e) => RecipientPhase::Failed(StepError::chain(StepKind::Confirmation, e)),
            },
            terminal => terminal,
        }
    }

    /// Drives one recipient until it reaches a terminal phase.
    async fn drive(&self, ctx: &BatchContext, request: &PaymentRequest) -> Settlement {
        let mut phase = RecipientPhase::Pending;
        loop {
            phase = match self.step(ctx, request, phase).await {
                RecipientPhase::Succeeded { hash } => return Settlement::Success { hash },
                RecipientPhase::Failed(err) => {
                    warn!(index = request.index, kind = %err.kind, error = %err.message, "Payment failed");
                    return Settlement::Error {
                        message: err.message,
                    };
                }
                next => next,
            };
            debug!(index = request.index, phase = phase.name(), "Payment advanced");
        }
    }
}

/// Clears the processing flag when a batch ends, however it ends.
struct ProcessingGuard<'a>(&'a AtomicBool);

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Sends one confidential payment per recipient, strictly in order.
///
/// Each recipient is attempted at most once and its outcome is recorded in the
/// [`StatusTracker`] before the next recipient starts. A failure never stops
/// the batch.
pub struct BatchOrchestrator {
    ports: Arc<Ports>,
    network: NetworkConfig,
    decimals: DecimalsSource,
    tracker: StatusTracker,
    processing: AtomicBool,
}

impl BatchOrchestrator {
    pub fn new(
        wallet: WalletBox,
        token: TokenClientBox,
        encryption: EncryptionClientBox,
        network: NetworkConfig,
    ) -> Self {
        Self {
            ports: Arc::new(Ports {
                wallet,
                token,
                encryption,
            }),
            network,
            decimals: DecimalsSource::Fixed(DEFAULT_TOKEN_DECIMALS),
            tracker: StatusTracker::new(),
            processing: AtomicBool::new(false),
        }
    }

    pub fn with_decimals(mut self, decimals: DecimalsSource) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn tracker(&self) -> &StatusTracker {
        &self.tracker
    }

    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::Acquire)
    }

    pub fn is_ready(&self) -> bool {
        self.ports.encryption.is_ready()
    }

    pub async fn initialize_encryption(&self) -> Result<(), EncryptionError> {
        self.ports.encryption.initialize().await?;
        info!("Encryption client initialized");
        Ok(())
    }

    /// Per-ciphertext executor fee, for display only.
    pub async fn executor_fee(&self) -> Result<u128, EncryptionError> {
        let fee = self.ports.encryption.fee().await?;
        info!(fee_wei = fee, "Executor fee per ciphertext");
        Ok(fee)
    }

    /// Reads the connected account's encrypted balance handle.
    ///
    /// Returns `Ok(None)` when there is no account or no token to query.
    pub async fn refresh_balance_handle(
        &self,
        token_address: Option<&str>,
    ) -> Result<Option<EncryptedHandle>, ChainError> {
        let Some(account) = self.ports.wallet.account() else {
            return Ok(None);
        };
        let chain_id = self.ports.wallet.chain_id();
        let Some(token) = self.network.resolve_token(token_address, chain_id) else {
            return Ok(None);
        };
        let handle = self.ports.token.balance_of(&token, &account).await?;
        debug!(%token, handle = %handle.0, "Balance handle");
        Ok(Some(handle))
    }

    /// Runs a whole batch.
    ///
    /// Returns a [`BatchRejection`] without touching the tracker if any
    /// precondition fails.
    pub async fn submit(&self, input: &BatchInput) -> Result<BatchReport, BatchRejection> {
        if self
            .processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BatchRejection::AlreadyProcessing);
        }
        let _guard = ProcessingGuard(&self.processing);

        let (ctx, requests) = self.prepare(input).await?;

        let count = requests.len();
        let total = format!("{:.2}", input.summary().total_amount);
        info!(recipients = count, %total, token = %ctx.token, "Starting confidential batch");

        self.tracker.initialize(&requests);

        for request in requests {
            let index = request.index;
            let recipient = Address::new(request.recipient.as_str()).abbreviated();
            info!(index, total = count, %recipient, "Processing payment");
            let settlement = self.settle_one(&ctx, request).await;
            if let Settlement::Success { hash } = &settlement {
                match self.network.explorer_link(ctx.chain_id, hash) {
                    Some(link) => info!(index, %recipient, %link, "Payment succeeded"),
                    None => info!(index, %recipient, %hash, "Payment succeeded"),
                }
            }
            if let Err(e) = self.tracker.mark_settled(index, settlement) {
                warn!(index, error = %e, "Status update ignored");
            }
        }

        let report = BatchReport::from_statuses(self.tracker.snapshot());
        info!(
            succeeded = report.succeeded,
            failed = report.failed,
            "All payments processed"
        );
        Ok(report)
    }

    /// Checks every precondition and resolves the batch context.
    async fn prepare(
        &self,
        input: &BatchInput,
    ) -> Result<(BatchContext, Vec<PaymentRequest>), BatchRejection> {
        if !self.ports.encryption.is_ready() {
            return Err(BatchRejection::NotReady);
        }
        let account = self
            .ports
            .wallet
            .account()
            .ok_or(BatchRejection::WalletNotConnected)?;

        let parsed = input.parse();
        if parsed.recipients.is_empty() {
            return Err(BatchRejection::NoRecipients);
        }
        if parsed.amounts.is_empty() {
            return Err(BatchRejection::NoAmounts);
        }
        if parsed.recipients.len() != parsed.amounts.len() {
            return Err(BatchRejection::LengthMismatch {
                recipients: parsed.recipients.len(),
                amounts: parsed.amounts.len(),
            });
        }

        let chain_id = self.ports.wallet.chain_id();
        let token = self
            .network
            .resolve_token(input.token_address.as_deref(), chain_id)
            .ok_or(BatchRejection::InvalidTokenAddress)?;

        let decimals = match self.decimals {
            DecimalsSource::Fixed(d) => d,
            DecimalsSource::FromContract => self
                .ports
                .token
                .decimals(&token)
                .await
                .map_err(BatchRejection::DecimalsUnavailable)?,
        };

        let requests = PaymentRequest::zip(&parsed.recipients, &parsed.amounts);
        let ctx = BatchContext {
            account,
            token,
            decimals,
            chain_id,
        };
        Ok((ctx, requests))
    }

    /// Runs one recipient on its own task so that a panicking adapter only
    /// fails that recipient. The task is awaited before returning.
    async fn settle_one(&self, ctx: &BatchContext, request: PaymentRequest) -> Settlement {
        let ports = Arc::clone(&self.ports);
        let ctx = ctx.clone();
        let index = request.index;
        let handle = tokio::spawn(async move { ports.drive(&ctx, &request).await });

        match handle.await {
            Ok(settlement) => settlement,
            Err(join_err) => {
                let message = if join_err.is_panic() {
                    panic_message(join_err.into_panic())
                } else {
                    GENERIC_FAILURE.to_string()
                };
                let err = StepError::new(StepKind::Unexpected, message);
                warn!(index, error = %err.message, "Payment aborted unexpectedly");
                Settlement::Error {
                    message: err.message,
                }
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        GENERIC_FAILURE.to_string()
    }
}
