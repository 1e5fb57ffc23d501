//! Contract boundary: the USD withdrawer ABI and its client.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use std::rc::Rc;

use crate::error::ProviderResult;
use crate::provider::{ProviderClient, Receipt, TransactionRequest, Web3};

sol! {
    /// External contract. Deposits go through the payable `receive`.
    interface IUsdWithdrawer {
        function owner() external view returns (address);
        function getETHAmountFor50USD() external view returns (uint256);
        function withdraw50USDInETH() external;
    }
}

/// Contract capability consumed by the bridge.
#[async_trait(?Send)]
pub trait ContractClient {
    fn address(&self) -> Address;

    /// Designated owner (the only account the contract lets withdraw).
    async fn owner(&self) -> ProviderResult<Address>;

    /// Wei equivalent of 50 USD at the contract's current price.
    async fn eth_for_50_usd(&self) -> ProviderResult<U256>;

    /// ETH held by the contract address.
    async fn balance(&self) -> ProviderResult<U256>;

    /// Send `withdraw50USDInETH()` from `from` and wait for one confirmation.
    async fn withdraw(&self, from: Address) -> ProviderResult<Receipt>;
}

/// [`ContractClient`] backed by any wallet provider.
pub struct Contract<P> {
    address: Address,
    web3: Web3<P>,
}

impl<P: ProviderClient> Contract<P> {
    pub fn new(address: Address, provider: Rc<P>) -> Self {
        Self { address, web3: Web3::new(provider) }
    }

    async fn view<C: SolCall>(&self, call: C) -> ProviderResult<C::Return> {
        let out = self.web3.call(self.address, Bytes::from(call.abi_encode())).await?;
        Ok(C::abi_decode_returns(&out, true)?)
    }
}

#[async_trait(?Send)]
impl<P: ProviderClient> ContractClient for Contract<P> {
    fn address(&self) -> Address {
        self.address
    }

    async fn owner(&self) -> ProviderResult<Address> {
        Ok(self.view(IUsdWithdrawer::ownerCall {}).await?._0)
    }

    async fn eth_for_50_usd(&self) -> ProviderResult<U256> {
        Ok(self.view(IUsdWithdrawer::getETHAmountFor50USDCall {}).await?._0)
    }

    async fn balance(&self) -> ProviderResult<U256> {
        self.web3.get_balance(self.address).await
    }

    async fn withdraw(&self, from: Address) -> ProviderResult<Receipt> {
        let data = IUsdWithdrawer::withdraw50USDInETHCall {}.abi_encode();
        let tx = TransactionRequest::call(from, self.address, Bytes::from(data));
        let hash = self.web3.send_transaction(&tx).await?;
        tracing::debug!(%hash, "withdraw submitted");
        self.web3.wait_for_receipt(hash).await
    }
}
