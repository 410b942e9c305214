use crate::{
    provider::{
        DigContract,
        DigReceipt,
        ProviderFault,
        WalletError,
        WalletProvider,
    },
    treasure_types::TreasureHunt,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use ethers::{
    contract::{
        ContractError,
        builders::ContractCall,
    },
    middleware::SignerMiddleware,
    providers::{
        Http,
        Middleware,
        MiddlewareError,
        Provider,
        ProviderError,
    },
    signers::{
        LocalWallet,
        Signer,
    },
    types::{
        Address,
        TransactionReceipt,
    },
};
use std::sync::Arc;
use tracing::debug;

/// Deployed TreasureHunt contract.
pub const TREASURE_CONTRACT_ADDRESS: &str = "0xFfb58B0EB3FAC405a3371b953185885640EDb1B9";

/// Fee attached to every dig, 0.0001 ETH in wei.
pub const DIG_FEE_WEI: u64 = 100_000_000_000_000;

/// Gas ceiling for a dig transaction.
pub const DIG_GAS_LIMIT: u64 = 300_000;

fn contract_address() -> Result<Address> {
    TREASURE_CONTRACT_ADDRESS
        .parse()
        .wrap_err("Invalid treasure contract address")
}

/// Wallet held by an external signer endpoint such as Frame. The endpoint
/// owns the accounts, asks the user for authorization, and signs digs that
/// are submitted to it unsigned.
pub struct ExternalWallet {
    provider: Arc<Provider<Http>>,
}

impl ExternalWallet {
    pub fn connect(url: &str) -> Result<Self> {
        let provider = Provider::<Http>::try_from(url)
            .wrap_err_with(|| format!("Invalid wallet RPC URL {url}"))?;
        Ok(ExternalWallet {
            provider: Arc::new(provider),
        })
    }

    pub fn dig_contract(&self) -> Result<ExternalContract> {
        Ok(ExternalContract {
            contract: TreasureHunt::new(contract_address()?, Arc::clone(&self.provider)),
        })
    }
}

impl WalletProvider for ExternalWallet {
    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.provider.get_accounts().await.map_err(wallet_error)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.provider
            .request("eth_requestAccounts", ())
            .await
            .map_err(wallet_error)
    }
}

pub struct ExternalContract {
    contract: TreasureHunt<Provider<Http>>,
}

impl DigContract for ExternalContract {
    async fn dig(&self, from: Address, cell: u8) -> Result<DigReceipt, ProviderFault> {
        let call = self
            .contract
            .dig_for_treasure(cell)
            .from(from)
            .value(DIG_FEE_WEI)
            .gas(DIG_GAS_LIMIT)
            .legacy();
        submit(call).await
    }
}

/// Wallet backed by an unlocked keystore key. The single account is always
/// available and digs are signed locally, so nothing ever prompts.
pub struct KeystoreWallet {
    address: Address,
    client: Arc<SignerMiddleware<Provider<Http>, LocalWallet>>,
}

impl KeystoreWallet {
    pub fn connect(signer: LocalWallet, url: &str, chain_id: u64) -> Result<Self> {
        let provider =
            Provider::<Http>::try_from(url).wrap_err_with(|| format!("Invalid RPC URL {url}"))?;
        let signer = signer.with_chain_id(chain_id);
        let address = signer.address();
        let client = Arc::new(SignerMiddleware::new(provider, signer));
        Ok(KeystoreWallet { address, client })
    }

    pub fn dig_contract(&self) -> Result<KeystoreContract> {
        Ok(KeystoreContract {
            contract: TreasureHunt::new(contract_address()?, Arc::clone(&self.client)),
        })
    }
}

impl WalletProvider for KeystoreWallet {
    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(vec![self.address])
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        Ok(vec![self.address])
    }
}

pub struct KeystoreContract {
    contract: TreasureHunt<SignerMiddleware<Provider<Http>, LocalWallet>>,
}

impl DigContract for KeystoreContract {
    async fn dig(&self, from: Address, cell: u8) -> Result<DigReceipt, ProviderFault> {
        let call = self
            .contract
            .dig_for_treasure(cell)
            .from(from)
            .value(DIG_FEE_WEI)
            .gas(DIG_GAS_LIMIT)
            .legacy();
        submit(call).await
    }
}

async fn submit<M: Middleware>(call: ContractCall<M, String>) -> Result<DigReceipt, ProviderFault> {
    let pending = call.send().await.map_err(call_fault)?;
    let receipt = pending
        .await
        .map_err(|err| provider_fault(&err))?
        .ok_or_else(|| ProviderFault::message("Transaction dropped from the mempool"))?;
    receipt_outcome(receipt)
}

fn receipt_outcome(receipt: TransactionReceipt) -> Result<DigReceipt, ProviderFault> {
    if receipt.status.map(|s| s.as_u64()) == Some(0) {
        return Err(ProviderFault::message(
            "Transaction has been reverted by the EVM",
        ));
    }
    debug!(tx = %receipt.transaction_hash, "dig transaction confirmed");
    Ok(DigReceipt {
        tx_hash: receipt.transaction_hash,
    })
}

/// Pulls the JSON-RPC error out of a contract call failure. Revert data and
/// provider codes survive so the session can classify the outcome.
fn call_fault<M: Middleware>(err: ContractError<M>) -> ProviderFault {
    if let Some(rpc) = err.as_middleware_error().and_then(|e| e.as_error_response()) {
        return ProviderFault::new(Some(rpc.code), rpc.message.clone());
    }
    match &err {
        ContractError::Revert(_) => ProviderFault::message("execution reverted"),
        other => ProviderFault::message(other.to_string()),
    }
}

fn provider_fault(err: &ProviderError) -> ProviderFault {
    match err.as_error_response() {
        Some(rpc) => ProviderFault::new(Some(rpc.code), rpc.message.clone()),
        None => ProviderFault::message(err.to_string()),
    }
}

/// A transport-level failure means no wallet endpoint is listening. A
/// structured JSON-RPC error means the endpoint answered and refused.
fn wallet_error(err: ProviderError) -> WalletError {
    if let Some(rpc) = err.as_error_response() {
        return WalletError::Fault(ProviderFault::new(Some(rpc.code), rpc.message.clone()));
    }
    match err {
        ProviderError::JsonRpcClientError(_) | ProviderError::HTTPError(_) => {
            WalletError::Unavailable
        }
        other => WalletError::Fault(ProviderFault::message(other.to_string())),
    }
}
