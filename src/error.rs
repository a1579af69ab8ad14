use thiserror::Error;

/// Reasons a whole batch is refused before any record is created.
///
/// These are surfaced to the user as blocking alerts; no submission is
/// attempted and the status sequence is left untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchRejection {
    #[error("Encryption system not ready yet. Please wait...")]
    NotReady,
    #[error("Wallet not connected. Please connect your wallet")]
    WalletNotConnected,
    #[error("No recipients entered")]
    NoRecipients,
    #[error("No amounts entered")]
    NoAmounts,
    #[error("Number of recipients ({recipients}) must match number of amounts ({amounts})")]
    LengthMismatch { recipients: usize, amounts: usize },
    #[error("Invalid token address")]
    InvalidTokenAddress,
    #[error("Could not read token decimals: {0}")]
    DecimalsUnavailable(ChainError),
    #[error("A batch is already being processed")]
    AlreadyProcessing,
}

/// Failures reported by the contract read/write client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Execution reverted: {0}")]
    Reverted(String),
    #[error("Transaction rejected: {0}")]
    Rejected(String),
    #[error("Unknown transaction: {0}")]
    UnknownTransaction(String),
    #[error("RPC error: {0}")]
    Rpc(String),
}

impl ChainError {
    /// The shortest human-readable form, without the category prefix.
    pub fn short_message(&self) -> &str {
        match self {
            ChainError::Reverted(msg)
            | ChainError::Rejected(msg)
            | ChainError::UnknownTransaction(msg)
            | ChainError::Rpc(msg) => msg,
        }
    }
}

/// Failures reported by the encryption client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncryptionError {
    #[error("Encryption client not initialized")]
    NotInitialized,
    #[error("Encryption failed: {0}")]
    Failed(String),
    #[error("Fee lookup failed: {0}")]
    Fee(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,
    #[error("Invalid amount '{0}'")]
    Invalid(String),
    #[error("Amount must not be negative: {0}")]
    Negative(String),
    #[error("Amount '{0}' is too large")]
    Overflow(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    #[error("No payment record at index {index} (batch has {len})")]
    OutOfRange { index: usize, len: usize },
    #[error("Payment record {0} has already settled")]
    AlreadySettled(usize),
}

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_mismatch_names_both_counts() {
        let err = BatchRejection::LengthMismatch {
            recipients: 3,
            amounts: 2,
        };
        let msg = err.to_string();
        assert!(msg.contains("recipients (3)"));
        assert!(msg.contains("amounts (2)"));
    }

    #[test]
    fn test_short_message_strips_category() {
        let err = ChainError::Reverted("insufficient balance".into());
        assert_eq!(err.short_message(), "insufficient balance");
        assert!(err.to_string().starts_with("Execution reverted"));
    }
}
