//! Request-id extraction from submission receipts.
//!
//! The request id is an indexed topic of an event the router emits while the
//! submission transaction executes. Which log carries it depends on the
//! consumer contract version, so the (log index, topic index) convention is a
//! versioned strategy rather than an inline constant.

use serde::{Deserialize, Serialize};

use oraq_chain::TxReceipt;
use oraq_types::{OraqError, RequestId, Result};

/// Deployed consumer contract variants with distinct event orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractVersion {
    /// `requestData(bytes)`: the contract derives provider and fee itself.
    AutoProvider,
    /// `requestData(address,bytes,uint256)`: provider and callback gas are
    /// passed explicitly.
    ExplicitProvider,
}

/// Where in a receipt the request id lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogExtraction {
    pub log_index: usize,
    pub topic_index: usize,
}

impl ContractVersion {
    /// The extraction convention this contract version emits.
    pub fn extraction(&self) -> LogExtraction {
        match self {
            ContractVersion::AutoProvider => LogExtraction { log_index: 2, topic_index: 3 },
            ContractVersion::ExplicitProvider => LogExtraction { log_index: 0, topic_index: 3 },
        }
    }
}

/// Pull the request id out of a mined submission receipt.
///
/// Out-of-range indices and malformed topics are `MissingLog` errors, never
/// panics: the convention is ABI-version-specific and breaks silently on the
/// contract side if event ordering changes.
pub fn extract_request_id(receipt: &TxReceipt, extraction: LogExtraction) -> Result<RequestId> {
    let log = receipt
        .logs
        .get(extraction.log_index)
        .ok_or(OraqError::MissingLog {
            log_index: extraction.log_index,
            topic_index: extraction.topic_index,
        })?;
    let topic = log
        .topics
        .get(extraction.topic_index)
        .ok_or(OraqError::MissingLog {
            log_index: extraction.log_index,
            topic_index: extraction.topic_index,
        })?;
    RequestId::from_topic(topic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oraq_chain::LogEntry;

    fn receipt_with_logs(logs: Vec<LogEntry>) -> TxReceipt {
        TxReceipt {
            tx_hash: "0xabc".into(),
            succeeded: true,
            logs,
        }
    }

    fn log(topics: Vec<&str>) -> LogEntry {
        LogEntry {
            address: "0x1111111111111111111111111111111111111111".into(),
            topics: topics.into_iter().map(String::from).collect(),
            data: "0x".into(),
        }
    }

    #[test]
    fn version_conventions() {
        assert_eq!(
            ContractVersion::AutoProvider.extraction(),
            LogExtraction { log_index: 2, topic_index: 3 }
        );
        assert_eq!(
            ContractVersion::ExplicitProvider.extraction(),
            LogExtraction { log_index: 0, topic_index: 3 }
        );
    }

    #[test]
    fn extracts_from_configured_position() {
        let id_topic = format!("0x{}", "ab".repeat(32));
        let receipt = receipt_with_logs(vec![
            log(vec!["0x01"]),
            log(vec!["0x02"]),
            log(vec!["0xe0", "0xe1", "0xe2", &id_topic]),
        ]);
        let id = extract_request_id(&receipt, ContractVersion::AutoProvider.extraction()).unwrap();
        assert_eq!(id.to_hex(), id_topic);
    }

    #[test]
    fn missing_log_is_an_error() {
        let receipt = receipt_with_logs(vec![log(vec!["0x01"])]);
        let err =
            extract_request_id(&receipt, ContractVersion::AutoProvider.extraction()).unwrap_err();
        assert!(matches!(err, OraqError::MissingLog { log_index: 2, topic_index: 3 }));
    }

    #[test]
    fn missing_topic_is_an_error() {
        let receipt = receipt_with_logs(vec![log(vec!["0xe0", "0xe1"])]);
        let err = extract_request_id(
            &receipt,
            ContractVersion::ExplicitProvider.extraction(),
        )
        .unwrap_err();
        assert!(matches!(err, OraqError::MissingLog { log_index: 0, topic_index: 3 }));
    }

    #[test]
    fn malformed_topic_is_rejected() {
        let receipt = receipt_with_logs(vec![log(vec!["0xe0", "0xe1", "0xe2", "0x1234"])]);
        assert!(
            extract_request_id(&receipt, ContractVersion::ExplicitProvider.extraction()).is_err()
        );
    }
}
