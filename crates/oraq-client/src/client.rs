//! The request client: preflights, submission, polling, cancellation.
//!
//! One logical thread of control per cycle; every contract interaction is
//! awaited sequentially. Precondition failures are corrected inline with a
//! single transaction and re-checked; transaction failures abort the cycle as
//! errors with no retry.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use oraq_chain::Submitter;
use oraq_contracts::extract::{extract_request_id, ContractVersion};
use oraq_contracts::{ConsumerContract, RouterContract, TokenContract};
use oraq_types::{
    normalize_uint_hex, Address, Hex, OraqError, RequestId, RequestStatus, Result,
};

use crate::poll::{PollEngine, RequestOutcome, StatusProbe};
use crate::{
    ClientConfig, ClientEvent, ClientEventHandler, BOOTSTRAP_AMOUNT, DEFAULT_CALLBACK_GAS,
    MAX_ALLOWANCE,
};

/// Outcome report for one full request cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub request_id: RequestId,
    pub price_before: Hex,
    /// Read only when the request was observed fulfilled.
    pub price_after: Option<Hex>,
    pub outcome: RequestOutcome,
}

/// Orchestrates the request workflow against the deployed contracts.
pub struct RequestClient {
    config: ClientConfig,
    submitter: Arc<dyn Submitter>,
    token: TokenContract,
    router: RouterContract,
    consumer: ConsumerContract,
    on_event: Option<ClientEventHandler>,
}

impl RequestClient {
    pub fn new(config: ClientConfig, submitter: Arc<dyn Submitter>) -> Self {
        let token = TokenContract::new(submitter.clone(), config.token_address.clone());
        let router = RouterContract::new(submitter.clone(), config.router_address.clone());
        let consumer = ConsumerContract::new(submitter.clone(), config.consumer_address.clone());
        Self {
            config,
            submitter,
            token,
            router,
            consumer,
            on_event: None,
        }
    }

    pub fn with_event_handler(mut self, handler: ClientEventHandler) -> Self {
        self.on_event = Some(handler);
        self
    }

    pub fn router(&self) -> &RouterContract {
        &self.router
    }

    fn emit(&self, event: ClientEvent) {
        if let Some(ref handler) = self.on_event {
            handler(event);
        }
    }

    /// The operator account: signer index 0.
    pub async fn operator(&self) -> Result<Address> {
        self.submitter
            .accounts()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| OraqError::Precondition("no signer accounts available".into()))
    }

    /// One-time funding bootstrap: transfer tokens to the consumer if its
    /// balance is zero. Optionally hits the dev-network faucet first so the
    /// operator has something to transfer.
    ///
    /// Returns whether a transfer was issued.
    pub async fn fund_if_empty(&self, use_faucet: bool) -> Result<bool> {
        let operator = self.operator().await?;
        let balance = self.token.balance_of(self.consumer.address()).await?;
        if balance != "0x0" {
            self.emit(ClientEvent::FundingChecked { balance, funded: false });
            return Ok(false);
        }

        if use_faucet {
            self.token.gimme(&operator).await?;
        }
        self.token
            .transfer(&operator, self.consumer.address(), BOOTSTRAP_AMOUNT)
            .await?;

        let balance = self.token.balance_of(self.consumer.address()).await?;
        if balance == "0x0" {
            return Err(OraqError::Precondition(
                "consumer balance still zero after funding transfer".into(),
            ));
        }
        self.emit(ClientEvent::FundingChecked { balance, funded: true });
        Ok(true)
    }

    /// Allowance preflight: if the router's allowance over the consumer's
    /// tokens is zero, raise it to the maximum and confirm.
    ///
    /// Returns whether a raising transaction was issued.
    pub async fn ensure_allowance(&self) -> Result<bool> {
        let allowance = self
            .token
            .allowance(self.consumer.address(), self.router.address())
            .await?;
        if allowance != "0x0" {
            self.emit(ClientEvent::AllowanceChecked { allowance, raised: false });
            return Ok(false);
        }

        let operator = self.operator().await?;
        self.consumer
            .increase_router_allowance(&operator, MAX_ALLOWANCE)
            .await?;

        let allowance = self
            .token
            .allowance(self.consumer.address(), self.router.address())
            .await?;
        if allowance == "0x0" {
            return Err(OraqError::Precondition(
                "router allowance still zero after raising".into(),
            ));
        }
        self.emit(ClientEvent::AllowanceChecked { allowance, raised: true });
        Ok(true)
    }

    /// Fee synchronization: make the consumer's cached fee match the fee the
    /// provider has registered on the router. Must run before every
    /// submission; a stale fee makes the contract-level submission fail or
    /// mis-pay.
    ///
    /// Returns the fee in effect after synchronization.
    pub async fn sync_fee(&self) -> Result<Hex> {
        let router_fee = self
            .router
            .get_provider_granular_fee(&self.config.provider_address, self.consumer.address())
            .await?;
        let consumer_fee = self.consumer.fee().await?;

        if normalize_uint_hex(&router_fee) == normalize_uint_hex(&consumer_fee) {
            self.emit(ClientEvent::FeeSynced {
                router_fee,
                consumer_fee: consumer_fee.clone(),
                updated: false,
            });
            return Ok(consumer_fee);
        }

        let operator = self.operator().await?;
        self.consumer.set_fee(&operator, &router_fee).await?;

        let consumer_fee = self.consumer.fee().await?;
        if normalize_uint_hex(&router_fee) != normalize_uint_hex(&consumer_fee) {
            return Err(OraqError::Precondition(format!(
                "consumer fee {} still differs from router fee {} after update",
                consumer_fee, router_fee
            )));
        }
        self.emit(ClientEvent::FeeSynced {
            router_fee,
            consumer_fee: consumer_fee.clone(),
            updated: true,
        });
        Ok(consumer_fee)
    }

    /// Submit a data request and extract its id from the mined receipt.
    ///
    /// The receipt is confirmed before this returns, so the id is safe to
    /// poll immediately.
    pub async fn submit_request(&self, query: &str) -> Result<RequestId> {
        let operator = self.operator().await?;
        let endpoint = query.as_bytes();

        let receipt = match self.config.version {
            ContractVersion::AutoProvider => {
                self.consumer.request_data(&operator, endpoint).await?
            }
            ContractVersion::ExplicitProvider => {
                self.consumer
                    .request_data_custom(
                        &operator,
                        &self.config.provider_address,
                        endpoint,
                        self.config.callback_gas.unwrap_or(DEFAULT_CALLBACK_GAS),
                    )
                    .await?
            }
        };

        let request_id = extract_request_id(&receipt, self.config.extraction())?;
        self.emit(ClientEvent::Submitted {
            request_id,
            tx_hash: receipt.tx_hash,
        });
        Ok(request_id)
    }

    /// Run one full request cycle: preflights, submission, poll, report.
    ///
    /// The consumer must already be funded; steady-state cycles report an
    /// empty balance as a precondition failure instead of auto-funding.
    pub async fn execute(&self, query: &str, engine: &PollEngine) -> Result<CycleReport> {
        let balance = self.token.balance_of(self.consumer.address()).await?;
        if balance == "0x0" {
            return Err(OraqError::Precondition(
                "consumer has no token balance; run the funding bootstrap first".into(),
            ));
        }

        self.ensure_allowance().await?;
        self.sync_fee().await?;

        let price_before = self.consumer.get_price().await?;
        let request_id = self.submit_request(query).await?;

        let outcome = engine.wait(&RouterProbe(&self.router), &request_id).await?;

        let price_after = if outcome == RequestOutcome::Fulfilled {
            Some(self.consumer.get_price().await?)
        } else {
            None
        };

        Ok(CycleReport {
            request_id,
            price_before,
            price_after,
            outcome,
        })
    }

    /// Wait, then cancel the request whether or not it has been fulfilled.
    ///
    /// Fulfillment may land between the wait and the cancellation; that race
    /// is adjudicated by the contract, so a reverted cancel is not an error
    /// here. Returns the status the router reports afterwards.
    pub async fn cancel_after(
        &self,
        request_id: &RequestId,
        delay_ms: u64,
    ) -> Result<RequestStatus> {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;

        let operator = self.operator().await?;
        match self.consumer.cancel_request(&operator, request_id).await {
            Ok(_) | Err(OraqError::Reverted(_)) => {}
            Err(e) => return Err(e),
        }

        let status = self.router.get_request_status(request_id).await?;
        self.emit(ClientEvent::CancelSubmitted {
            request_id: *request_id,
            status,
        });
        Ok(status)
    }
}

/// Adapter so the poll engine reads status through the router binding.
struct RouterProbe<'a>(&'a RouterContract);

#[async_trait]
impl StatusProbe for RouterProbe<'_> {
    async fn status(&self, request_id: &RequestId) -> Result<RequestStatus> {
        self.0.get_request_status(request_id).await
    }
}
