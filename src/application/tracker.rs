use crate::domain::payment::{PaymentRequest, Settlement, TransactionStatus};
use crate::error::TrackerError;
use tokio::sync::watch;

/// Ordered per-recipient status records for the current batch.
///
/// Every change is published to subscribers as a whole-sequence replacement,
/// so an observer never sees a half-written record.
#[derive(Debug)]
pub struct StatusTracker {
    sender: watch::Sender<Vec<TransactionStatus>>,
}

impl Default for StatusTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusTracker {
    pub fn new() -> Self {
        Self {
            sender: watch::Sender::new(Vec::new()),
        }
    }

    /// Replaces any previous batch with one `pending` record per request.
    pub fn initialize(&self, requests: &[PaymentRequest]) -> Vec<TransactionStatus> {
        let records: Vec<TransactionStatus> =
            requests.iter().map(TransactionStatus::pending).collect();
        self.sender.send_replace(records.clone());
        records
    }

    /// Settles the record at `index`, leaving every other record untouched.
    pub fn mark_settled(&self, index: usize, settlement: Settlement) -> Result<(), TrackerError> {
        let mut result = Ok(());
        self.sender.send_if_modified(|records| {
            let len = records.len();
            match records.get(index) {
                None => {
                    result = Err(TrackerError::OutOfRange { index, len });
                    false
                }
                Some(record) if record.status.is_settled() => {
                    result = Err(TrackerError::AlreadySettled(index));
                    false
                }
                Some(record) => {
                    let updated = record.settled(settlement);
                    records[index] = updated;
                    true
                }
            }
        });
        result
    }

    pub fn snapshot(&self) -> Vec<TransactionStatus> {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<TransactionStatus>> {
        self.sender.subscribe()
    }
}
