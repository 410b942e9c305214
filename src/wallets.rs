use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use eth_keystore::decrypt_key;
use ethers::{
    signers::{
        LocalWallet,
        MnemonicBuilder,
        coins_bip39::English,
    },
    types::Address,
};
use rpassword::prompt_password;
use serde::Deserialize;
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

#[derive(Clone, Debug)]
pub struct WalletDescriptor {
    pub name: String,
    pub path: PathBuf,
    pub address: Option<Address>,
}

impl WalletDescriptor {
    pub fn new(name: impl Into<String>, path: PathBuf, address: Option<Address>) -> Self {
        Self {
            name: name.into(),
            path,
            address,
        }
    }
}

/// Plaintext header of a keystore v3 file. Key material stays encrypted
/// until unlock.
#[derive(Debug, Deserialize)]
struct KeystoreHeader {
    address: Option<String>,
    #[serde(alias = "Crypto")]
    crypto: Option<serde_json::Value>,
}

pub fn default_wallet_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").wrap_err("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".ethereum").join("keystore"))
}

pub fn resolve_wallet_dir(dir: Option<&str>) -> Result<PathBuf> {
    match dir {
        Some(raw) => {
            let expanded = shellexpand::tilde(raw);
            Ok(PathBuf::from(expanded.into_owned()))
        }
        None => default_wallet_dir(),
    }
}

fn read_keystore_header(path: &Path) -> Option<KeystoreHeader> {
    let raw = fs::read_to_string(path).ok()?;
    let header: KeystoreHeader = serde_json::from_str(&raw).ok()?;
    header.crypto.is_some().then_some(header)
}

fn header_address(header: &KeystoreHeader) -> Option<Address> {
    let raw = header.address.as_deref()?;
    let bytes = hex::decode(raw.trim_start_matches("0x")).ok()?;
    (bytes.len() == Address::len_bytes()).then(|| Address::from_slice(&bytes))
}

/// Keystore files are recognized by content rather than extension, since
/// geth writes UTC-- names without one.
pub fn list_wallets(dir: &Path) -> Result<Vec<WalletDescriptor>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut wallets = Vec::new();
    for entry in fs::read_dir(dir).wrap_err("Failed to read wallet directory")? {
        let entry = entry.wrap_err("Failed to read wallet entry")?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(header) = read_keystore_header(&path) else {
            continue;
        };
        let name = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => path.file_stem().and_then(|stem| stem.to_str()),
            _ => path.file_name().and_then(|n| n.to_str()),
        }
        .ok_or_else(|| eyre!("Invalid wallet filename {:?}", path))?
        .to_owned();
        let address = header_address(&header);
        wallets.push(WalletDescriptor::new(name, path, address));
    }
    wallets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(wallets)
}

pub fn find_wallet(dir: &Path, name: &str) -> Result<WalletDescriptor> {
    let wallets = list_wallets(dir)?;
    wallets
        .into_iter()
        .find(|w| w.name == name)
        .ok_or_else(|| eyre!("Wallet '{name}' not found in {}", dir.to_string_lossy()))
}

pub fn unlock_wallet(descriptor: &WalletDescriptor) -> Result<LocalWallet> {
    let prompt = format!("Enter password for wallet '{}': ", descriptor.name);
    let password = prompt_password(prompt).wrap_err("Failed to read wallet password")?;

    let secret = decrypt_key(&descriptor.path, password.as_bytes())
        .map_err(|_| eyre!("Invalid password for wallet '{}'", descriptor.name))?;

    if let Ok(wallet) = LocalWallet::from_bytes(&secret) {
        return Ok(wallet);
    }

    if let Ok(mnemonic) = std::str::from_utf8(&secret) {
        let word_count = mnemonic.split_whitespace().count();
        if word_count >= 12 {
            let wallet = MnemonicBuilder::<English>::default()
                .phrase(mnemonic)
                .build()?;
            return Ok(wallet);
        }
    }

    Err(eyre!(
        "Wallet '{}' contained unsupported key material",
        descriptor.name
    ))
}
