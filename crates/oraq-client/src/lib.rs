//! End-to-end oracle request orchestration.
//!
//! - Preflights: consumer funding, router allowance, provider fee sync
//! - Request submission with versioned request-id extraction
//! - Fulfillment polling with an explicit timeout outcome
//! - Post-submission cancellation (the contract adjudicates the race)

use serde::{Deserialize, Serialize};

use oraq_contracts::extract::{ContractVersion, LogExtraction};
use oraq_types::{Address, Hex, OraqError, RequestId, RequestStatus, Result};

pub mod client;
pub mod poll;

pub use client::{CycleReport, RequestClient};
pub use poll::{PollConfig, PollEngine, PollEvent, RequestOutcome, StatusProbe, StopHandle};

/// Effectively-unlimited allowance: the maximum 256-bit unsigned value.
pub const MAX_ALLOWANCE: &str =
    "0xffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";

/// One-time funding bootstrap amount (1_000_000_000 base units).
pub const BOOTSTRAP_AMOUNT: &str = "0x3b9aca00";

/// Callback gas passed to the explicit-provider request variant when the
/// caller does not override it.
pub const DEFAULT_CALLBACK_GAS: u128 = 80;

/// Everything the client needs, enumerated up front.
///
/// Replaces scattered environment reads: construct it directly or load it via
/// [`ClientConfig::from_env`], which fails fast naming the first missing
/// variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub rpc_url: String,
    pub token_address: Address,
    pub router_address: Address,
    pub consumer_address: Address,
    pub provider_address: Address,
    pub version: ContractVersion,
    /// Overrides the version's (log index, topic index) convention.
    #[serde(default)]
    pub extraction_override: Option<LogExtraction>,
    #[serde(default)]
    pub callback_gas: Option<u128>,
}

impl ClientConfig {
    /// Load from `ORAQ_*` environment variables.
    ///
    /// Required: `ORAQ_RPC_URL`, `ORAQ_TOKEN_ADDRESS`, `ORAQ_ROUTER_ADDRESS`,
    /// `ORAQ_CONSUMER_ADDRESS`, `ORAQ_PROVIDER_ADDRESS`. Optional:
    /// `ORAQ_CONTRACT_VERSION` (`auto_provider` | `explicit_provider`,
    /// defaults to `auto_provider`).
    pub fn from_env() -> Result<Self> {
        fn require(name: &str) -> Result<String> {
            std::env::var(name).map_err(|_| {
                OraqError::Config(format!("missing required environment variable {}", name))
            })
        }

        let version = match std::env::var("ORAQ_CONTRACT_VERSION").ok().as_deref() {
            None | Some("auto_provider") => ContractVersion::AutoProvider,
            Some("explicit_provider") => ContractVersion::ExplicitProvider,
            Some(other) => {
                return Err(OraqError::Config(format!(
                    "unknown ORAQ_CONTRACT_VERSION: {}",
                    other
                )))
            }
        };

        Ok(Self {
            rpc_url: require("ORAQ_RPC_URL")?,
            token_address: Address::parse(&require("ORAQ_TOKEN_ADDRESS")?)?,
            router_address: Address::parse(&require("ORAQ_ROUTER_ADDRESS")?)?,
            consumer_address: Address::parse(&require("ORAQ_CONSUMER_ADDRESS")?)?,
            provider_address: Address::parse(&require("ORAQ_PROVIDER_ADDRESS")?)?,
            version,
            extraction_override: None,
            callback_gas: None,
        })
    }

    /// The request-id extraction convention in effect.
    pub fn extraction(&self) -> LogExtraction {
        self.extraction_override.unwrap_or_else(|| self.version.extraction())
    }
}

/// Client progress events.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    FundingChecked { balance: Hex, funded: bool },
    AllowanceChecked { allowance: Hex, raised: bool },
    FeeSynced { router_fee: Hex, consumer_fee: Hex, updated: bool },
    Submitted { request_id: RequestId, tx_hash: Hex },
    CancelSubmitted { request_id: RequestId, status: RequestStatus },
}

/// Callback type for client events.
pub type ClientEventHandler = Box<dyn Fn(ClientEvent) + Send + Sync>;
