//! JSON-RPC client for an EVM node with node-managed signer accounts.
//!
//! Methods used:
//! - eth_accounts
//! - eth_call
//! - eth_sendTransaction
//! - eth_getTransactionReceipt

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use oraq_types::{Address, Hex, OraqError, Result};

use crate::{LogEntry, Submitter, TxReceipt};

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawLog {
    address: Hex,
    topics: Vec<Hex>,
    data: Hex,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: Hex,
    status: Option<Hex>,
    logs: Vec<RawLog>,
}

impl From<RawReceipt> for TxReceipt {
    fn from(raw: RawReceipt) -> Self {
        let succeeded = raw
            .status
            .as_deref()
            .map(|s| oraq_types::hex_to_u128(s).unwrap_or(0) == 1)
            // pre-Byzantium receipts carry no status field
            .unwrap_or(true);
        TxReceipt {
            tx_hash: raw.transaction_hash,
            succeeded,
            logs: raw
                .logs
                .into_iter()
                .map(|l| LogEntry {
                    address: l.address,
                    topics: l.topics,
                    data: l.data,
                })
                .collect(),
        }
    }
}

/// JSON-RPC transaction submitter.
pub struct EthRpcClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
    next_id: AtomicU64,
    receipt_poll_attempts: u32,
    receipt_poll_ms: u64,
}

impl EthRpcClient {
    pub fn new(base_url: &str, timeout_ms: Option<u64>) -> Self {
        let timeout_ms = timeout_ms.unwrap_or(30_000);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_millis(timeout_ms),
            next_id: AtomicU64::new(1),
            receipt_poll_attempts: 120,
            receipt_poll_ms: 500,
        }
    }

    /// Override how long `submit` waits for a transaction to be mined.
    pub fn with_receipt_polling(mut self, attempts: u32, interval_ms: u64) -> Self {
        self.receipt_poll_attempts = attempts;
        self.receipt_poll_ms = interval_ms;
        self
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let resp = self
            .client
            .post(&self.base_url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| OraqError::Rpc(format!("rpc request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(OraqError::Rpc(format!(
                "rpc endpoint returned status {}",
                resp.status()
            )));
        }

        let parsed: RpcResponse = resp
            .json()
            .await
            .map_err(|e| OraqError::Rpc(format!("failed to parse rpc response: {}", e)))?;

        if let Some(err) = parsed.error {
            return Err(OraqError::Rpc(format!(
                "{} (code {})",
                err.message, err.code
            )));
        }

        parsed
            .result
            .ok_or_else(|| OraqError::Rpc(format!("{}: empty result", method)))
    }

    pub async fn eth_accounts(&self) -> Result<Vec<Address>> {
        let result = self.request("eth_accounts", json!([])).await?;
        let raw: Vec<String> = serde_json::from_value(result)
            .map_err(|e| OraqError::Rpc(format!("bad eth_accounts result: {}", e)))?;
        raw.iter().map(|s| Address::parse(s)).collect()
    }

    pub async fn eth_call(&self, to: &Address, data: &str) -> Result<Hex> {
        let result = self
            .request(
                "eth_call",
                json!([{ "to": to.as_str(), "data": data }, "latest"]),
            )
            .await?;
        serde_json::from_value(result)
            .map_err(|e| OraqError::Rpc(format!("bad eth_call result: {}", e)))
    }

    pub async fn eth_send_transaction(
        &self,
        from: &Address,
        to: &Address,
        data: &str,
    ) -> Result<Hex> {
        let result = self
            .request(
                "eth_sendTransaction",
                json!([{ "from": from.as_str(), "to": to.as_str(), "data": data }]),
            )
            .await?;
        serde_json::from_value(result)
            .map_err(|e| OraqError::Rpc(format!("bad eth_sendTransaction result: {}", e)))
    }

    pub async fn eth_get_transaction_receipt(&self, tx_hash: &str) -> Result<Option<TxReceipt>> {
        let result = self
            .request("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        let raw: RawReceipt = serde_json::from_value(result)
            .map_err(|e| OraqError::Rpc(format!("bad receipt: {}", e)))?;
        Ok(Some(raw.into()))
    }

    /// Poll for the mined receipt, waiting between attempts.
    ///
    /// A receipt with status 0 is surfaced as `Reverted`.
    pub async fn wait_for_receipt(
        &self,
        tx_hash: &str,
        max_attempts: u32,
        poll_interval_ms: u64,
    ) -> Result<TxReceipt> {
        for attempt in 0..max_attempts {
            if let Some(receipt) = self.eth_get_transaction_receipt(tx_hash).await? {
                if !receipt.succeeded {
                    return Err(OraqError::Reverted(tx_hash.to_string()));
                }
                return Ok(receipt);
            }
            if attempt + 1 < max_attempts {
                tokio::time::sleep(Duration::from_millis(poll_interval_ms)).await;
            }
        }
        Err(OraqError::Rpc(format!(
            "receipt not available after {} attempts for tx {}",
            max_attempts, tx_hash
        )))
    }
}

#[async_trait::async_trait]
impl Submitter for EthRpcClient {
    async fn call(&self, to: &Address, data: &str) -> Result<Hex> {
        self.eth_call(to, data).await
    }

    async fn submit(&self, from: &Address, to: &Address, data: &str) -> Result<TxReceipt> {
        let tx_hash = self.eth_send_transaction(from, to, data).await?;
        self.wait_for_receipt(&tx_hash, self.receipt_poll_attempts, self.receipt_poll_ms)
            .await
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        self.eth_accounts().await
    }
}
