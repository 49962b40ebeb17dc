//! In-memory submitter for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use oraq_types::{Address, Hex, OraqError, Result};

use crate::{Submitter, TxReceipt};

/// A transaction recorded by [`MemorySubmitter::submit`].
#[derive(Debug, Clone)]
pub struct SubmittedTx {
    pub from: Address,
    pub to: Address,
    pub data: Hex,
}

/// In-memory submitter (for testing and offline use).
///
/// Call and receipt results are scripted per `(to, selector)` key. Queued
/// results are consumed in order; the final queued result is sticky, so a
/// polling loop keeps observing it.
pub struct MemorySubmitter {
    accounts: Vec<Address>,
    call_results: Mutex<HashMap<String, VecDeque<Hex>>>,
    receipts: Mutex<HashMap<String, VecDeque<TxReceipt>>>,
    submissions: Mutex<Vec<SubmittedTx>>,
}

fn key(to: &Address, data: &str) -> String {
    // 0x + 4-byte selector
    let selector = data.get(..10).unwrap_or(data);
    format!("{}:{}", to.as_str(), selector)
}

impl MemorySubmitter {
    pub fn new(accounts: Vec<Address>) -> Self {
        Self {
            accounts,
            call_results: Mutex::new(HashMap::new()),
            receipts: Mutex::new(HashMap::new()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    /// Queue a read-call result for a `(contract, selector)` pair.
    pub fn queue_call(&self, to: &Address, selector_data: &str, result: &str) {
        let mut results = self.call_results.lock().unwrap();
        results
            .entry(key(to, selector_data))
            .or_default()
            .push_back(result.to_string());
    }

    /// Queue a receipt for the next submission to a `(contract, selector)` pair.
    pub fn queue_receipt(&self, to: &Address, selector_data: &str, receipt: TxReceipt) {
        let mut receipts = self.receipts.lock().unwrap();
        receipts
            .entry(key(to, selector_data))
            .or_default()
            .push_back(receipt);
    }

    /// All transactions submitted so far, in order.
    pub fn submissions(&self) -> Vec<SubmittedTx> {
        self.submissions.lock().unwrap().clone()
    }
}

fn pop_sticky<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

#[async_trait]
impl Submitter for MemorySubmitter {
    async fn call(&self, to: &Address, data: &str) -> Result<Hex> {
        let mut results = self.call_results.lock().unwrap();
        results
            .get_mut(&key(to, data))
            .and_then(pop_sticky)
            .ok_or_else(|| OraqError::Rpc(format!("no scripted call result for {}", key(to, data))))
    }

    async fn submit(&self, from: &Address, to: &Address, data: &str) -> Result<TxReceipt> {
        let tx_number = {
            let mut submissions = self.submissions.lock().unwrap();
            submissions.push(SubmittedTx {
                from: from.clone(),
                to: to.clone(),
                data: data.to_string(),
            });
            submissions.len()
        };
        let mut receipts = self.receipts.lock().unwrap();
        let receipt = receipts
            .get_mut(&key(to, data))
            .and_then(pop_sticky)
            .unwrap_or_else(|| TxReceipt {
                tx_hash: format!("0xmock{}", tx_number),
                succeeded: true,
                logs: Vec::new(),
            });
        if !receipt.succeeded {
            return Err(OraqError::Reverted(receipt.tx_hash));
        }
        Ok(receipt)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.accounts.clone())
    }
}
