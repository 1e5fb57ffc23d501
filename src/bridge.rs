//! Wallet-Contract Bridge
//!
//! Mediates between an injected wallet ([`ProviderClient`]) and the USD
//! withdrawer contract ([`ContractClient`]) on behalf of a page.
//!
//! ```text
//!   page ──► Bridge ──► Web3<P> ──► wallet (eth_requestAccounts, eth_sendTransaction, ...)
//!              │
//!              ├──────► C: ContractClient (owner, getETHAmountFor50USD, withdraw50USDInETH)
//!              │
//!              └──────► Session (account, owner flag, loading) + Notifier (toasts)
//! ```
//!
//! Every operation reports its own outcome through the [`Notifier`] and
//! returns the error to the immediate caller only. Nothing here retries.
//! Ownership only toggles the withdraw control; the contract enforces access.

use alloy_primitives::{Address, B256};
use futures::StreamExt;
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, error, info, warn};

use crate::config::Network;
use crate::contract::ContractClient;
use crate::error::{BridgeError, BridgeResult, ProviderError, UNRECOGNIZED_CHAIN};
use crate::notify::*;
use crate::provider::{parse_accounts, ProviderClient, Receipt, TransactionRequest, Web3};
use crate::session::Session;
use crate::units::{format_ether, parse_ether};

pub struct Bridge<P, C, N> {
    web3: Web3<P>,
    contract: C,
    notifier: N,
    session: Session,
    subscribed: Cell<bool>,
}

impl<P, C, N> Bridge<P, C, N>
where
    P: ProviderClient,
    C: ContractClient,
    N: Notifier,
{
    pub fn new(provider: Rc<P>, contract: C, notifier: N) -> Self {
        Self::with_session(provider, contract, notifier, Session::new())
    }

    pub fn with_session(provider: Rc<P>, contract: C, notifier: N, session: Session) -> Self {
        Self {
            web3: Web3::new(provider),
            contract,
            notifier,
            session,
            subscribed: Cell::new(false),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn contract(&self) -> &C {
        &self.contract
    }

    fn report(&self, err: &BridgeError, failure: &str) {
        let notification = match err {
            BridgeError::MissingProvider => Notification::warning(MSG_INSTALL_WALLET),
            BridgeError::Busy => Notification::warning(MSG_BUSY),
            BridgeError::NotConnected => Notification::warning(MSG_NOT_CONNECTED),
            e if e.is_transport() => {
                error!(error = %e, "provider failure");
                Notification::error(failure)
            }
            e => {
                warn!(error = %e, "{}", failure);
                Notification::error(failure)
            }
        };
        self.notifier.notify(notification);
    }

    // =========================================================================
    // CONNECTION
    // =========================================================================

    /// Prompt the wallet for account access.
    ///
    /// Without a wallet this warns and returns `Ok(None)`.
    pub async fn connect(&self) -> BridgeResult<Option<Address>> {
        if !self.web3.is_available() {
            self.report(&BridgeError::MissingProvider, MSG_CONNECT_FAILED);
            return Ok(None);
        }
        match self.web3.request_accounts().await {
            Ok(accounts) => Ok(self.adopt_first(&accounts).await),
            Err(e) => {
                let err = BridgeError::from(e);
                self.report(&err, MSG_CONNECT_FAILED);
                Err(err)
            }
        }
    }

    /// Startup check for an already-authorized account. Never prompts.
    pub async fn check_connected(&self) -> BridgeResult<Option<Address>> {
        if !self.web3.is_available() {
            self.report(&BridgeError::MissingProvider, MSG_CONNECT_FAILED);
            return Ok(None);
        }
        match self.web3.accounts().await {
            Ok(accounts) if accounts.is_empty() => {
                debug!("No authorized account found");
                Ok(None)
            }
            Ok(accounts) => Ok(self.adopt_first(&accounts).await),
            Err(e) => {
                let err = BridgeError::from(e);
                error!(error = %err, "eth_accounts failed");
                Err(err)
            }
        }
    }

    async fn adopt_first(&self, accounts: &[Address]) -> Option<Address> {
        let account = *accounts.first()?;
        info!(%account, "wallet connected");
        self.session.set_account(account);
        let _ = self.check_ownership(account).await;
        Some(account)
    }

    /// Local-only: wallet permissions stay granted.
    pub fn disconnect(&self) {
        info!("session cleared");
        self.session.clear();
    }

    /// Compare `account` with the contract owner and record the result.
    pub async fn check_ownership(&self, account: Address) -> BridgeResult<bool> {
        let owner = match self.contract.owner().await {
            Ok(owner) => owner,
            Err(e) => {
                let err = BridgeError::from(e);
                self.report(&err, MSG_LOAD_FAILED);
                return Err(err);
            }
        };
        let is_owner = owner == account;
        debug!(%owner, %account, is_owner, "ownership checked");
        // The account may have changed while the read was in flight.
        if self.session.account() == Some(account) {
            self.session.set_owner(is_owner);
        }
        Ok(is_owner)
    }

    // =========================================================================
    // ACCOUNT CHANGES
    // =========================================================================

    /// Apply an `accountsChanged` payload.
    pub async fn handle_accounts_changed(&self, accounts: Vec<String>) {
        let parsed = match parse_accounts(&accounts) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!(error = %e, "ignoring malformed accountsChanged payload");
                return;
            }
        };
        match parsed.first() {
            None => {
                info!("wallet reported no accounts");
                self.session.clear();
            }
            Some(&account) => {
                self.session.set_account(account);
                let _ = self.check_ownership(account).await;
            }
        }
    }

    /// Subscribe to account changes and apply them until the provider stream ends.
    ///
    /// Only the first successful subscription sticks; later calls return
    /// immediately. Without a wallet nothing is recorded, so a later call
    /// can still subscribe once one is injected.
    pub async fn watch_accounts(&self) {
        if self.subscribed.get() {
            return;
        }
        let Some(mut changes) = self.web3.subscribe_accounts() else {
            debug!("provider emits no account events");
            return;
        };
        self.subscribed.set(true);
        while let Some(accounts) = changes.next().await {
            self.handle_accounts_changed(accounts).await;
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.get()
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// ETH equivalent of 50 USD, formatted for display.
    pub async fn get_quote(&self) -> BridgeResult<String> {
        let result = self.read(self.contract.eth_for_50_usd()).await;
        match result {
            Ok(wei) => {
                let quote = format_ether(wei);
                self.session.set_quote(quote.clone());
                Ok(quote)
            }
            Err(err) => {
                self.report(&err, MSG_LOAD_FAILED);
                Err(err)
            }
        }
    }

    /// Contract balance, formatted for display.
    pub async fn get_balance(&self) -> BridgeResult<String> {
        let result = self.read(self.contract.balance()).await;
        match result {
            Ok(wei) => {
                let balance = format_ether(wei);
                self.session.set_balance(balance.clone());
                Ok(balance)
            }
            Err(err) => {
                self.report(&err, MSG_LOAD_FAILED);
                Err(err)
            }
        }
    }

    async fn read<T>(
        &self,
        call: impl std::future::Future<Output = Result<T, ProviderError>>,
    ) -> BridgeResult<T> {
        if !self.web3.is_available() {
            return Err(BridgeError::MissingProvider);
        }
        Ok(call.await?)
    }

    /// Startup effect: authorized account, quote and balance.
    ///
    /// Without a wallet this warns once and skips the reads.
    pub async fn load(&self) {
        if !self.web3.is_available() {
            self.report(&BridgeError::MissingProvider, MSG_LOAD_FAILED);
            return;
        }
        let _ = self.check_connected().await;
        let _ = self.get_quote().await;
        let _ = self.get_balance().await;
    }

    // =========================================================================
    // TRANSACTIONS
    // =========================================================================

    /// Send `amount` ETH (decimal text) to the contract and wait for one confirmation.
    pub async fn deposit(&self, amount: &str) -> BridgeResult<Receipt> {
        let from = self.begin_transaction(MSG_DEPOSIT_FAILED)?;
        let result = self.send_deposit(from, amount).await;
        self.finish_transaction(result, MSG_DEPOSIT_OK, MSG_DEPOSIT_FAILED).await
    }

    async fn send_deposit(&self, from: Address, amount: &str) -> BridgeResult<Receipt> {
        let value = parse_ether(amount)?;
        let tx = TransactionRequest::transfer(from, self.contract.address(), value);
        let hash = self.web3.send_transaction(&tx).await?;
        info!(%hash, amount, "deposit submitted");
        let receipt = self.web3.wait_for_receipt(hash).await?;
        confirm(hash, receipt)
    }

    /// Call `withdraw50USDInETH()` from the connected account.
    ///
    /// Ownership is not re-checked here; a non-owner gets the contract's rejection.
    pub async fn withdraw(&self) -> BridgeResult<Receipt> {
        let from = self.begin_transaction(MSG_WITHDRAW_FAILED)?;
        let result = match self.contract.withdraw(from).await {
            Ok(receipt) => confirm(receipt.transaction_hash, receipt),
            Err(e) => Err(BridgeError::from(e)),
        };
        self.finish_transaction(result, MSG_WITHDRAW_OK, MSG_WITHDRAW_FAILED).await
    }

    fn begin_transaction(&self, failure: &str) -> BridgeResult<Address> {
        let checked = if !self.web3.is_available() {
            Err(BridgeError::MissingProvider)
        } else if self.session.is_loading() {
            Err(BridgeError::Busy)
        } else {
            self.session.account().ok_or(BridgeError::NotConnected)
        };
        match checked {
            Ok(from) => {
                self.session.set_loading(true);
                Ok(from)
            }
            Err(err) => {
                self.report(&err, failure);
                Err(err)
            }
        }
    }

    async fn finish_transaction(
        &self,
        result: BridgeResult<Receipt>,
        success: &str,
        failure: &str,
    ) -> BridgeResult<Receipt> {
        self.session.set_loading(false);
        match result {
            Ok(receipt) => {
                info!(hash = %receipt.transaction_hash, "{}", success);
                self.notifier.notify(Notification::success(success));
                let _ = self.get_balance().await;
                Ok(receipt)
            }
            Err(err) => {
                self.report(&err, failure);
                Err(err)
            }
        }
    }

    // =========================================================================
    // NETWORK
    // =========================================================================

    /// Ask the wallet to switch chains, adding the chain first if it is unknown.
    pub async fn switch_network(&self, network: &Network) -> BridgeResult<()> {
        if !self.web3.is_available() {
            let err = BridgeError::MissingProvider;
            self.report(&err, MSG_SWITCH_FAILED);
            return Err(err);
        }
        let result = match self.web3.switch_chain(network.chain_id).await {
            Err(ProviderError::Rpc { code, .. }) if code == UNRECOGNIZED_CHAIN => {
                info!(chain_id = network.chain_id, "adding chain to wallet");
                self.web3.add_chain(network).await
            }
            other => other,
        };
        result.map_err(|e| {
            let err = BridgeError::from(e);
            self.report(&err, MSG_SWITCH_FAILED);
            err
        })
    }
}

fn confirm(hash: B256, receipt: Receipt) -> BridgeResult<Receipt> {
    if receipt.succeeded() {
        Ok(receipt)
    } else {
        Err(BridgeError::Reverted { tx_hash: hash.to_string() })
    }
}
