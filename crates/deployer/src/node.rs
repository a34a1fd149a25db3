//! Module containing the trait abstracting the blockchain node so the
//! deployment flow can be tested with a mocked version of it.

use {
    alloy::{
        network::{ReceiptResponse, TransactionBuilder},
        primitives::{Address, Bytes, TxHash},
        providers::{PendingTransactionBuilder, Provider},
        rpc::types::TransactionRequest,
    },
    anyhow::{Context, Result},
    ethrpc::AlloyProvider,
    std::time::Duration,
};

/// A contract-creation transaction: no recipient, the creation code as input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationRequest {
    pub from: Address,
    pub nonce: u64,
    pub code: Bytes,
}

/// The parts of a mined transaction receipt the deployment cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub block: Option<u64>,
    pub contract_address: Option<Address>,
    pub success: bool,
    pub gas_used: u64,
}

/// When a submitted transaction counts as confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation {
    /// Number of blocks, including the one with the transaction, that must
    /// be mined.
    pub confirmations: u64,
    /// Give up waiting after this long. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for Confirmation {
    fn default() -> Self {
        Self {
            confirmations: 1,
            timeout: None,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Node: Send + Sync {
    /// The account signing every submitted transaction.
    fn sender(&self) -> Address;

    /// The nonce the next transaction from `account` will use, counting
    /// transactions still in the mempool.
    async fn nonce(&self, account: Address) -> Result<u64>;

    /// Signs and broadcasts the transaction, returning once the node accepted
    /// it.
    async fn submit(&self, request: CreationRequest) -> Result<TxHash>;

    /// Waits until the transaction is mined and confirmed.
    async fn confirm(&self, transaction: TxHash, confirmation: Confirmation) -> Result<Receipt>;
}

/// [`Node`] backed by a signing alloy provider.
pub struct Ethereum {
    provider: AlloyProvider,
    sender: Address,
}

impl Ethereum {
    /// `sender` must be the address of the signer installed in `provider`.
    pub fn new(provider: AlloyProvider, sender: Address) -> Self {
        Self { provider, sender }
    }
}

#[async_trait::async_trait]
impl Node for Ethereum {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn nonce(&self, account: Address) -> Result<u64> {
        self.provider
            .get_transaction_count(account)
            .pending()
            .await
            .context("failed to fetch account nonce")
    }

    async fn submit(&self, request: CreationRequest) -> Result<TxHash> {
        let tx = TransactionRequest::default()
            .with_from(request.from)
            .with_nonce(request.nonce)
            .with_deploy_code(request.code);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .context("node did not accept the contract creation transaction")?;
        Ok(*pending.tx_hash())
    }

    async fn confirm(&self, transaction: TxHash, confirmation: Confirmation) -> Result<Receipt> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), transaction)
            .with_required_confirmations(confirmation.confirmations)
            .with_timeout(confirmation.timeout)
            .get_receipt()
            .await
            .with_context(|| format!("failed to confirm transaction {transaction}"))?;

        Ok(Receipt {
            block: receipt.block_number(),
            contract_address: receipt.contract_address(),
            success: receipt.status(),
            gas_used: receipt.gas_used(),
        })
    }
}
