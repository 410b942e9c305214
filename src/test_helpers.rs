use crate::provider::{
    DigContract,
    DigReceipt,
    ProviderFault,
    WalletError,
    WalletProvider,
};
use ethers::types::{
    Address,
    H256,
};
use std::cell::{
    Cell,
    RefCell,
};

pub fn test_account() -> Address {
    Address::repeat_byte(0xab)
}

/// Wallet double with one scripted answer per operation and a counter for
/// how often each operation ran.
pub struct FakeWallet {
    accounts_result: RefCell<Result<Vec<Address>, WalletError>>,
    request_result: RefCell<Result<Vec<Address>, WalletError>>,
    accounts_calls: Cell<usize>,
    request_calls: Cell<usize>,
}

impl FakeWallet {
    pub fn with_accounts(accounts: Vec<Address>) -> Self {
        FakeWallet {
            accounts_result: RefCell::new(Ok(accounts.clone())),
            request_result: RefCell::new(Ok(accounts)),
            accounts_calls: Cell::new(0),
            request_calls: Cell::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::with_accounts(Vec::new())
    }

    pub fn unavailable() -> Self {
        FakeWallet {
            accounts_result: RefCell::new(Err(WalletError::Unavailable)),
            request_result: RefCell::new(Err(WalletError::Unavailable)),
            accounts_calls: Cell::new(0),
            request_calls: Cell::new(0),
        }
    }

    pub fn set_accounts_result(&self, result: Result<Vec<Address>, WalletError>) {
        *self.accounts_result.borrow_mut() = result;
    }

    pub fn set_request_result(&self, result: Result<Vec<Address>, WalletError>) {
        *self.request_result.borrow_mut() = result;
    }

    pub fn accounts_calls(&self) -> usize {
        self.accounts_calls.get()
    }

    pub fn request_calls(&self) -> usize {
        self.request_calls.get()
    }
}

impl WalletProvider for &FakeWallet {
    async fn accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.accounts_calls.set(self.accounts_calls.get() + 1);
        self.accounts_result.borrow().clone()
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.request_calls.set(self.request_calls.get() + 1);
        self.request_result.borrow().clone()
    }
}

/// Contract double. Digs never touch a network, they return the scripted
/// result and record what they were asked to do.
pub struct FakeContract {
    dig_result: RefCell<Result<DigReceipt, ProviderFault>>,
    dig_calls: Cell<usize>,
    last_cell: Cell<Option<u8>>,
    last_from: Cell<Option<Address>>,
}

impl FakeContract {
    pub fn confirming() -> Self {
        Self::with_result(Ok(DigReceipt {
            tx_hash: H256::repeat_byte(0x11),
        }))
    }

    pub fn rejecting(code: i64, message: &str) -> Self {
        Self::with_result(Err(ProviderFault::new(Some(code), message)))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_result(Err(ProviderFault::message(message)))
    }

    pub fn with_result(result: Result<DigReceipt, ProviderFault>) -> Self {
        FakeContract {
            dig_result: RefCell::new(result),
            dig_calls: Cell::new(0),
            last_cell: Cell::new(None),
            last_from: Cell::new(None),
        }
    }

    pub fn set_result(&self, result: Result<DigReceipt, ProviderFault>) {
        *self.dig_result.borrow_mut() = result;
    }

    pub fn dig_calls(&self) -> usize {
        self.dig_calls.get()
    }

    pub fn last_cell(&self) -> Option<u8> {
        self.last_cell.get()
    }

    pub fn last_from(&self) -> Option<Address> {
        self.last_from.get()
    }
}

impl DigContract for &FakeContract {
    async fn dig(&self, from: Address, cell: u8) -> Result<DigReceipt, ProviderFault> {
        self.dig_calls.set(self.dig_calls.get() + 1);
        self.last_cell.set(Some(cell));
        self.last_from.set(Some(from));
        self.dig_result.borrow().clone()
    }
}
