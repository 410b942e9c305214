use ethers::types::{
    Address,
    H256,
};
use std::fmt;

/// EIP-1193 code a wallet answers with when the user declines to sign.
pub const USER_REJECTED_CODE: i64 = 4001;

/// Structured failure surfaced by a wallet or node endpoint. Transport
/// failures carry no code, only text.
#[derive(Clone, Debug)]
pub struct ProviderFault {
    pub code: Option<i64>,
    pub message: String,
}

impl ProviderFault {
    pub fn new(code: Option<i64>, message: impl Into<String>) -> Self {
        ProviderFault {
            code,
            message: message.into(),
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }

    pub fn is_user_rejection(&self) -> bool {
        self.code == Some(USER_REJECTED_CODE)
    }
}

impl fmt::Display for ProviderFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "provider fault ({code}): {}", self.message),
            None => write!(f, "provider fault: {}", self.message),
        }
    }
}

impl std::error::Error for ProviderFault {}

#[derive(Clone, Debug)]
pub enum WalletError {
    /// No wallet endpoint answered.
    Unavailable,
    /// The endpoint answered and refused.
    Fault(ProviderFault),
}

impl fmt::Display for WalletError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletError::Unavailable => write!(f, "wallet provider is not available"),
            WalletError::Fault(fault) => fault.fmt(f),
        }
    }
}

impl std::error::Error for WalletError {}

/// Confirmation of a mined dig.
#[derive(Clone, Debug)]
pub struct DigReceipt {
    pub tx_hash: H256,
}

/// Source of accounts. Listing is silent, requesting may put an
/// authorization prompt in front of the user.
pub trait WalletProvider {
    fn accounts(&self) -> impl Future<Output = Result<Vec<Address>, WalletError>>;

    fn request_accounts(&self) -> impl Future<Output = Result<Vec<Address>, WalletError>>;
}

/// Submits a dig and waits for it to be mined.
pub trait DigContract {
    fn dig(
        &self,
        from: Address,
        cell: u8,
    ) -> impl Future<Output = Result<DigReceipt, ProviderFault>>;
}
