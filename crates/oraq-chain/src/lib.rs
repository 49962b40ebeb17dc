//! Transaction submission and read-call layer.
//!
//! - ABI calldata encoding and return-word decoding
//! - JSON-RPC client for node-managed-signer chains
//! - `Submitter` trait seam so higher layers stay mockable

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use oraq_types::{Address, Hex, Result};

pub mod abi;
pub mod memory;
pub mod rpc_client;

/// One emitted log entry from a mined transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub address: Hex,
    pub topics: Vec<Hex>,
    pub data: Hex,
}

/// A mined transaction receipt, reduced to what the client consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: Hex,
    /// true when the transaction succeeded (receipt status 0x1).
    pub succeeded: bool,
    pub logs: Vec<LogEntry>,
}

/// Submits transactions and read-only calls against deployed contracts.
///
/// `submit` returns only after the transaction is mined; callers may rely on
/// the receipt being confirmed before acting on it.
#[async_trait]
pub trait Submitter: Send + Sync {
    /// Read-only contract call. Returns the raw ABI-encoded return data.
    async fn call(&self, to: &Address, data: &str) -> Result<Hex>;

    /// Sign-and-send a transaction from a node-managed account, then wait for
    /// the mined receipt.
    async fn submit(&self, from: &Address, to: &Address, data: &str) -> Result<TxReceipt>;

    /// Available signer addresses. The operator account is index 0.
    async fn accounts(&self) -> Result<Vec<Address>>;
}
