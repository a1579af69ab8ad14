use super::types::TxHash;
use serde::Serialize;

/// A single recipient/amount pair at its position in the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub index: usize,
    pub recipient: String,
    pub amount: String,
}

impl PaymentRequest {
    /// Pairs two equal-length lists by position.
    ///
    /// Callers are expected to have checked the lengths; surplus entries on
    /// either side are ignored.
    pub fn zip(recipients: &[String], amounts: &[String]) -> Vec<PaymentRequest> {
        recipients
            .iter()
            .zip(amounts)
            .enumerate()
            .map(|(index, (recipient, amount))| PaymentRequest {
                index,
                recipient: recipient.clone(),
                amount: amount.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    #[default]
    Pending,
    Success,
    Error,
}

impl PaymentState {
    pub fn is_settled(self) -> bool {
        self != PaymentState::Pending
    }
}

/// How a single payment attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Success { hash: TxHash },
    Error { message: String },
}

/// Per-recipient status record shown to the user.
///
/// `hash` is only set on success and `error` only on failure.
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct TransactionStatus {
    pub recipient: String,
    pub amount: String,
    pub status: PaymentState,
    pub hash: Option<TxHash>,
    pub error: Option<String>,
}

impl TransactionStatus {
    pub fn pending(request: &PaymentRequest) -> Self {
        Self {
            recipient: request.recipient.clone(),
            amount: request.amount.clone(),
            status: PaymentState::Pending,
            hash: None,
            error: None,
        }
    }

    /// Returns the settled copy of this record.
    pub fn settled(&self, settlement: Settlement) -> Self {
        let (status, hash, error) = match settlement {
            Settlement::Success { hash } => (PaymentState::Success, Some(hash), None),
            Settlement::Error { message } => (PaymentState::Error, None, Some(message)),
        };
        Self {
            recipient: self.recipient.clone(),
            amount: self.amount.clone(),
            status,
            hash,
            error,
        }
    }
}
