//! Typed bindings for the deployed contract surface: the payment token, the
//! request router, and the data consumer.
//!
//! Each binding is a thin façade over a [`Submitter`]: encode calldata, issue
//! the call or transaction, decode the single return word. All amounts travel
//! as 0x-hex quantities.

use std::sync::Arc;

use oraq_chain::abi::{self, AbiValue};
use oraq_chain::{Submitter, TxReceipt};
use oraq_types::{u128_to_hex, Address, Hex, RequestId, RequestStatus, Result};

pub mod extract;

/// ERC-20 style payment token, plus the dev-network faucet method.
pub struct TokenContract {
    submitter: Arc<dyn Submitter>,
    address: Address,
}

impl TokenContract {
    pub fn new(submitter: Arc<dyn Submitter>, address: Address) -> Self {
        Self { submitter, address }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub async fn balance_of(&self, owner: &Address) -> Result<Hex> {
        let data = abi::encode_call("balanceOf(address)", &[AbiValue::Address(owner.clone())])?;
        abi::decode_uint_word(&self.submitter.call(&self.address, &data).await?)
    }

    pub async fn allowance(&self, owner: &Address, spender: &Address) -> Result<Hex> {
        let data = abi::encode_call(
            "allowance(address,address)",
            &[AbiValue::Address(owner.clone()), AbiValue::Address(spender.clone())],
        )?;
        abi::decode_uint_word(&self.submitter.call(&self.address, &data).await?)
    }

    pub async fn transfer(&self, from: &Address, to: &Address, amount: &str) -> Result<TxReceipt> {
        let data = abi::encode_call(
            "transfer(address,uint256)",
            &[AbiValue::Address(to.clone()), AbiValue::Uint(amount.to_string())],
        )?;
        self.submitter.submit(from, &self.address, &data).await
    }

    /// Dev-network faucet: mints test tokens to the caller.
    pub async fn gimme(&self, from: &Address) -> Result<TxReceipt> {
        let data = abi::encode_call("gimme()", &[])?;
        self.submitter.submit(from, &self.address, &data).await
    }
}

/// The router holding request state and the provider fee registry.
pub struct RouterContract {
    submitter: Arc<dyn Submitter>,
    address: Address,
}

impl RouterContract {
    pub fn new(submitter: Arc<dyn Submitter>, address: Address) -> Self {
        Self { submitter, address }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The fee the provider has registered for this specific consumer.
    pub async fn get_provider_granular_fee(
        &self,
        provider: &Address,
        consumer: &Address,
    ) -> Result<Hex> {
        let data = abi::encode_call(
            "getProviderGranularFee(address,address)",
            &[AbiValue::Address(provider.clone()), AbiValue::Address(consumer.clone())],
        )?;
        abi::decode_uint_word(&self.submitter.call(&self.address, &data).await?)
    }

    pub async fn get_request_status(&self, request_id: &RequestId) -> Result<RequestStatus> {
        let data = abi::encode_call(
            "getRequestStatus(bytes32)",
            &[AbiValue::Bytes32(*request_id.as_bytes())],
        )?;
        let code =
            abi::decode_uint_word_u128(&self.submitter.call(&self.address, &data).await?)?;
        Ok(RequestStatus::from_status_code(code))
    }
}

/// The consumer contract requests are submitted through.
pub struct ConsumerContract {
    submitter: Arc<dyn Submitter>,
    address: Address,
}

impl ConsumerContract {
    pub fn new(submitter: Arc<dyn Submitter>, address: Address) -> Self {
        Self { submitter, address }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// The consumer's locally cached provider fee.
    pub async fn fee(&self) -> Result<Hex> {
        let data = abi::encode_call("fee()", &[])?;
        abi::decode_uint_word(&self.submitter.call(&self.address, &data).await?)
    }

    pub async fn set_fee(&self, from: &Address, fee: &str) -> Result<TxReceipt> {
        let data = abi::encode_call("setFee(uint256)", &[AbiValue::Uint(fee.to_string())])?;
        self.submitter.submit(from, &self.address, &data).await
    }

    /// The last fulfilled price value.
    pub async fn get_price(&self) -> Result<Hex> {
        let data = abi::encode_call("getPrice()", &[])?;
        abi::decode_uint_word(&self.submitter.call(&self.address, &data).await?)
    }

    pub async fn increase_router_allowance(
        &self,
        from: &Address,
        amount: &str,
    ) -> Result<TxReceipt> {
        let data = abi::encode_call(
            "increaseRouterAllowance(uint256)",
            &[AbiValue::Uint(amount.to_string())],
        )?;
        self.submitter.submit(from, &self.address, &data).await
    }

    /// Tune a consumer-side request variable (e.g. the request timeout used
    /// before cancellation).
    pub async fn set_request_var(
        &self,
        from: &Address,
        key: u8,
        value: u128,
    ) -> Result<TxReceipt> {
        let data = abi::encode_call(
            "setRequestVar(uint8,uint256)",
            &[
                AbiValue::Uint(u128_to_hex(key as u128)),
                AbiValue::Uint(u128_to_hex(value)),
            ],
        )?;
        self.submitter.submit(from, &self.address, &data).await
    }

    /// Submit a data request; the contract derives provider and fee itself.
    pub async fn request_data(&self, from: &Address, endpoint: &[u8]) -> Result<TxReceipt> {
        let data = abi::encode_call("requestData(bytes)", &[AbiValue::Bytes(endpoint.to_vec())])?;
        self.submitter.submit(from, &self.address, &data).await
    }

    /// Submit a data request naming the provider and callback gas explicitly.
    pub async fn request_data_custom(
        &self,
        from: &Address,
        provider: &Address,
        endpoint: &[u8],
        callback_gas: u128,
    ) -> Result<TxReceipt> {
        let data = abi::encode_call(
            "requestData(address,bytes,uint256)",
            &[
                AbiValue::Address(provider.clone()),
                AbiValue::Bytes(endpoint.to_vec()),
                AbiValue::Uint(u128_to_hex(callback_gas)),
            ],
        )?;
        self.submitter.submit(from, &self.address, &data).await
    }

    pub async fn cancel_request(
        &self,
        from: &Address,
        request_id: &RequestId,
    ) -> Result<TxReceipt> {
        let data = abi::encode_call(
            "cancelRequest(bytes32)",
            &[AbiValue::Bytes32(*request_id.as_bytes())],
        )?;
        self.submitter.submit(from, &self.address, &data).await
    }
}
