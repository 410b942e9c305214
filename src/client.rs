use crate::{
    eth,
    provider::{
        DigContract,
        ProviderFault,
        WalletError,
        WalletProvider,
    },
    ui,
    wallets,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use ethers::types::Address;
use rand::Rng;
use std::{
    fmt,
    path::{
        Path,
        PathBuf,
    },
};
use tracing::{
    error,
    info,
    warn,
};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling,
};
use tracing_subscriber::EnvFilter;

pub const DEFAULT_MAINNET_RPC_URL: &str = "https://eth.llamarpc.com";
pub const DEFAULT_SEPOLIA_RPC_URL: &str = "https://rpc.sepolia.org";
pub const DEFAULT_LOCAL_RPC_URL: &str = "http://localhost:8545";
pub const DEFAULT_WALLET_RPC_URL: &str = "http://127.0.0.1:1248";

/// Grid position in the closed range [1,9].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CellId(u8);

impl CellId {
    pub fn new(id: u8) -> Option<Self> {
        (1..=9).contains(&id).then_some(Self(id))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of one dig submission. Fresh per attempt; a terminal value stays
/// until the next attempt moves it back to [`DigState::Submitting`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DigState {
    Idle,
    Submitting,
    Succeeded,
    Failed(DigFailure),
}

/// Closed classification of everything a submission can fail with once it has
/// left the client.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DigFailure {
    UserCancelled,
    ContractReverted,
    Unknown,
}

/// Local validation failures. These block a dig before any network traffic
/// and never enter [`DigState`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DigBlocked {
    NoCellSelected,
    WalletNotConnected,
}

impl fmt::Display for DigBlocked {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigBlocked::NoCellSelected => write!(f, "Please select a cell to dig"),
            DigBlocked::WalletNotConnected => write!(f, "Please connect your wallet"),
        }
    }
}

/// Read-only view of the session for rendering.
#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub account: Option<Address>,
    pub selection: Option<CellId>,
    pub chance: u8,
    pub state: DigState,
    pub busy: bool,
    pub can_dig: bool,
    pub status: String,
    pub ack: Option<String>,
    pub errors: Vec<String>,
}

#[derive(Clone, Debug)]
pub enum NetworkTarget {
    Mainnet { url: String },
    Sepolia { url: String },
    LocalNode { url: String },
}

impl NetworkTarget {
    pub fn url(&self) -> &str {
        match self {
            NetworkTarget::Mainnet { url }
            | NetworkTarget::Sepolia { url }
            | NetworkTarget::LocalNode { url } => url,
        }
    }

    pub fn chain_id(&self) -> u64 {
        match self {
            NetworkTarget::Mainnet { .. } => 1,
            NetworkTarget::Sepolia { .. } => 11_155_111,
            NetworkTarget::LocalNode { .. } => 31_337,
        }
    }
}

#[derive(Clone, Debug)]
pub enum WalletConfig {
    /// Wallet-owning JSON-RPC endpoint; the wallet prompts for authorization
    /// and signs submissions itself.
    WalletRpc { url: String },
    /// Local encrypted keystore, unlocked once at bootstrap.
    Keystore { name: String, dir: PathBuf },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub network: NetworkTarget,
    pub wallets: WalletConfig,
    pub log_dir: Option<PathBuf>,
}

/// The session object: owns the account, the selection with its displayed
/// chance, and the submission state machine. Generic over the two external
/// boundaries so tests can script them.
pub struct AppController<W, C> {
    wallet: W,
    contract: C,
    account: Option<Address>,
    selection: Option<CellId>,
    chance: u8,
    dig_state: DigState,
    pub status: String,
    ack: Option<String>,
    errors: Vec<String>,
}

impl<W, C> AppController<W, C>
where
    W: WalletProvider,
    C: DigContract,
{
    pub fn new(wallet: W, contract: C) -> Self {
        Self {
            wallet,
            contract,
            account: None,
            selection: None,
            chance: 0,
            dig_state: DigState::Idle,
            status: String::from("Ready"),
            ack: None,
            errors: Vec::new(),
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn selection(&self) -> Option<CellId> {
        self.selection
    }

    pub fn dig_state(&self) -> DigState {
        self.dig_state
    }

    pub fn busy(&self) -> bool {
        matches!(self.dig_state, DigState::Submitting)
    }

    /// Silent account discovery, run once at session start. A missing
    /// provider is tolerated; startup continues without an account.
    pub async fn detect_existing_account(&mut self) {
        match self.wallet.accounts().await {
            Ok(accounts) => match accounts.first() {
                Some(first) => {
                    info!(account = %first, "existing account detected");
                    self.account = Some(*first);
                }
                None => info!("no authorized account found"),
            },
            Err(WalletError::Unavailable) => {
                info!("wallet provider not detected");
            }
            Err(WalletError::Fault(fault)) => {
                warn!(%fault, "account detection failed");
            }
        }
    }

    /// Interactive connect. The only operation allowed to raise a wallet
    /// permission prompt; a missing provider surfaces to the caller here
    /// instead of being swallowed.
    pub async fn request_connection(&mut self) -> Result<(), WalletError> {
        let accounts = self.wallet.request_accounts().await?;
        match accounts.first() {
            Some(first) => {
                info!(account = %first, "wallet connected");
                self.account = Some(*first);
            }
            None => warn!("wallet authorized zero accounts"),
        }
        Ok(())
    }

    /// Set the selection and redraw the displayed chance. Re-selecting the
    /// already-selected cell still redraws; nothing ever clears the
    /// selection.
    pub fn select_cell(&mut self, cell: CellId) {
        self.selection = Some(cell);
        self.chance = rand::rng().random_range(1..=100);
    }

    /// Submit one paid dig for the selected cell.
    ///
    /// Validation failures come back as [`DigBlocked`] before any network
    /// traffic. Boundary faults are classified into a terminal
    /// [`DigState::Failed`] and reported through the status line rather than
    /// returned. The submitting state is left in every branch, so the busy
    /// flag can never stick.
    pub async fn dig_for_treasure(&mut self) -> Result<(), DigBlocked> {
        if self.busy() {
            warn!("dig ignored; a submission is already in flight");
            return Ok(());
        }
        let Some(cell) = self.selection else {
            return Err(DigBlocked::NoCellSelected);
        };
        let Some(account) = self.account else {
            return Err(DigBlocked::WalletNotConnected);
        };

        self.dig_state = DigState::Submitting;
        info!(cell = %cell, account = %account, "submitting dig");

        match self.contract.dig(account, cell.get()).await {
            Ok(receipt) => {
                info!(tx = ?receipt.tx_hash, "dig confirmed");
                self.set_status("Treasure found!");
                self.ack = Some(String::from("Treasure dug up!"));
                self.dig_state = DigState::Succeeded;
            }
            Err(fault) => {
                let failure = classify_fault(&fault);
                error!(%fault, ?failure, "dig failed");
                self.set_status(failure_status(failure));
                self.dig_state = DigState::Failed(failure);
            }
        }
        Ok(())
    }

    pub fn dismiss_ack(&mut self) {
        self.ack = None;
    }

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            account: self.account,
            selection: self.selection,
            chance: self.chance,
            state: self.dig_state,
            busy: self.busy(),
            can_dig: self.selection.is_some() && !self.busy(),
            status: self.status.clone(),
            ack: self.ack.clone(),
            errors: self.errors.iter().rev().take(5).cloned().collect(),
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        self.status = message.into();
        self.errors.clear();
    }

    fn push_errors(&mut self, mut items: Vec<String>) {
        if items.is_empty() {
            return;
        }
        for item in &items {
            error!("{}", item);
        }
        self.errors.append(&mut items);
        if self.errors.len() > 50 {
            let drain = self.errors.len() - 50;
            self.errors.drain(0..drain);
        }
    }
}

/// Map a boundary fault onto exactly one failure kind. The wallet's rejection
/// code wins over message inspection.
pub fn classify_fault(fault: &ProviderFault) -> DigFailure {
    if fault.is_user_rejection() {
        DigFailure::UserCancelled
    } else if fault.message.contains("reverted") {
        DigFailure::ContractReverted
    } else {
        DigFailure::Unknown
    }
}

fn failure_status(failure: DigFailure) -> &'static str {
    match failure {
        DigFailure::UserCancelled => "Transaction was cancelled by user.",
        DigFailure::ContractReverted => {
            "Transaction was reverted. Check smart contract or gas limits."
        }
        DigFailure::Unknown => "An unknown error occurred.",
    }
}

pub fn default_log_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").wrap_err("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".treasure-grid").join("logs"))
}

/// File-backed tracing because stdout belongs to the terminal UI. The
/// returned guard flushes the writer when dropped and must outlive the app.
pub fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir).wrap_err_with(|| {
        format!("Failed to create log directory {}", log_dir.display())
    })?;
    let appender = rolling::daily(log_dir, "treasure-grid.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init();
    Ok(guard)
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let AppConfig {
        network, wallets, ..
    } = config;
    match wallets {
        WalletConfig::WalletRpc { url } => {
            info!("Using external wallet RPC at {url}");
            let wallet = eth::ExternalWallet::connect(&url)?;
            let contract = wallet.dig_contract()?;
            run_session(wallet, contract).await
        }
        WalletConfig::Keystore { name, dir } => {
            info!("Using keystore wallet '{name}' on {}", network.url());
            let descriptor = wallets::find_wallet(&dir, &name)
                .wrap_err("Unable to locate keystore wallet")?;
            let signer = wallets::unlock_wallet(&descriptor)?;
            let wallet =
                eth::KeystoreWallet::connect(signer, network.url(), network.chain_id())?;
            let contract = wallet.dig_contract()?;
            run_session(wallet, contract).await
        }
    }
}

async fn run_session<W, C>(wallet: W, contract: C) -> Result<()>
where
    W: WalletProvider,
    C: DigContract,
{
    let mut controller = AppController::new(wallet, contract);
    controller.detect_existing_account().await;

    let mut ui_state = ui::UiState::default();
    info!("Starting UI");
    ui::terminal_enter(&mut ui_state)?;
    let res = run_loop(&mut controller, &mut ui_state).await;
    ui::terminal_exit()?;
    res
}

/// Draw one frame with the busy flag already raised, so the submitting state
/// is visible before the dig call suspends.
fn show_submitting_frame(
    snapshot: &mut AppSnapshot,
    ui_state: &mut ui::UiState,
    context: &'static str,
) -> Result<()> {
    snapshot.busy = true;
    snapshot.can_dig = false;
    ui::draw(ui_state, snapshot).wrap_err(context)
}

async fn run_loop<W, C>(
    controller: &mut AppController<W, C>,
    ui_state: &mut ui::UiState,
) -> Result<()>
where
    W: WalletProvider,
    C: DigContract,
{
    info!("Running app loop");
    let mut snapshot = controller.snapshot();
    ui::draw(ui_state, &snapshot).wrap_err("initial draw failed")?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            ev = ui::next_event(ui_state) => {
                match ev? {
                    ui::UserEvent::Quit => break,
                    ui::UserEvent::Redraw => {}
                    ui::UserEvent::Connect => {
                        if let Err(err) = controller.request_connection().await {
                            let msg = match err {
                                WalletError::Unavailable => {
                                    String::from("Wallet provider is not available")
                                }
                                WalletError::Fault(fault) => {
                                    format!("Wallet connection failed: {}", fault.message)
                                }
                            };
                            controller.push_errors(vec![msg]);
                        }
                    }
                    ui::UserEvent::SelectCell(cell) => controller.select_cell(cell),
                    ui::UserEvent::Dig => {
                        if controller.busy() {
                            continue;
                        }
                        if snapshot.can_dig && snapshot.account.is_some() {
                            show_submitting_frame(
                                &mut snapshot,
                                ui_state,
                                "draw while submitting dig failed",
                            )?;
                        }
                        if let Err(blocked) = controller.dig_for_treasure().await {
                            controller.push_errors(vec![blocked.to_string()]);
                        }
                    }
                    ui::UserEvent::DismissAck => controller.dismiss_ack(),
                }
                snapshot = controller.snapshot();
                ui::draw(ui_state, &snapshot).wrap_err("draw after event failed")?;
            }
        }
    }
    Ok(())
}
