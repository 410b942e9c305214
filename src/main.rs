use color_eyre::eyre::{
    Result,
    eyre,
};
use std::path::{
    Path,
    PathBuf,
};
use treasure_grid::{
    client,
    wallets,
};

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: treasure-grid [--mainnet | --sepolia | --local] [--rpc-url <url>]\n\
         [--wallet-rpc <url> | --keystore <name>] [--keystore-dir <path>]\n\
         [--log-dir <path>] [--list-wallets]\n\
         \n\
         Flags:\n\
           --mainnet             Connect to Ethereum mainnet (default RPC {})\n\
           --sepolia             Connect to the Sepolia testnet (default RPC {})\n\
           --local               Connect to a local node (default RPC {})\n\
           --rpc-url <url>       Override the RPC URL for the selected network\n\
           --wallet-rpc <url>    External signer endpoint to talk to (default {})\n\
           --keystore <name>     Sign locally with an encrypted keystore wallet\n\
           --keystore-dir <path> Override keystore directory (defaults to ~/.ethereum/keystore)\n\
           --log-dir <path>      Override log directory (defaults to ~/.treasure-grid/logs)\n\
           --list-wallets        List keystore wallets and exit",
        client::DEFAULT_MAINNET_RPC_URL,
        client::DEFAULT_SEPOLIA_RPC_URL,
        client::DEFAULT_LOCAL_RPC_URL,
        client::DEFAULT_WALLET_RPC_URL,
    );
    std::process::exit(0);
}

fn print_wallet_listing(dir: &Path) -> Result<()> {
    let found = wallets::list_wallets(dir)?;
    if found.is_empty() {
        println!("No keystore wallets found in {}", dir.display());
        return Ok(());
    }
    println!("Keystore wallets in {}:", dir.display());
    for wallet in found {
        match wallet.address {
            Some(address) => println!("  {:<24} {address:#x}", wallet.name),
            None => println!("  {}", wallet.name),
        }
    }
    Ok(())
}

fn parse_cli_args() -> Result<client::AppConfig> {
    #[derive(Clone, Copy)]
    enum NetworkFlag {
        Mainnet,
        Sepolia,
        Local,
    }

    let mut args = std::env::args().skip(1);
    let mut network_flag: Option<NetworkFlag> = None;
    let mut custom_url: Option<String> = None;
    let mut wallet_rpc: Option<String> = None;
    let mut keystore: Option<String> = None;
    let mut keystore_dir: Option<String> = None;
    let mut log_dir: Option<String> = None;
    let mut list_wallets = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mainnet" => {
                if network_flag.is_some() {
                    return Err(eyre!(
                        "Multiple network flags provided; choose one of --mainnet/--sepolia/--local"
                    ));
                }
                network_flag = Some(NetworkFlag::Mainnet);
            }
            "--sepolia" => {
                if network_flag.is_some() {
                    return Err(eyre!(
                        "Multiple network flags provided; choose one of --mainnet/--sepolia/--local"
                    ));
                }
                network_flag = Some(NetworkFlag::Sepolia);
            }
            "--local" => {
                if network_flag.is_some() {
                    return Err(eyre!(
                        "Multiple network flags provided; choose one of --mainnet/--sepolia/--local"
                    ));
                }
                network_flag = Some(NetworkFlag::Local);
            }
            "--rpc-url" => {
                let url = args
                    .next()
                    .ok_or_else(|| eyre!("--rpc-url requires a URL argument"))?;
                if custom_url.is_some() {
                    return Err(eyre!("--rpc-url may only be specified once"));
                }
                if network_flag.is_none() {
                    return Err(eyre!(
                        "--rpc-url must follow a network flag (--mainnet/--sepolia/--local)"
                    ));
                }
                custom_url = Some(url);
            }
            "--wallet-rpc" => {
                let url = args
                    .next()
                    .ok_or_else(|| eyre!("--wallet-rpc requires a URL argument"))?;
                if wallet_rpc.is_some() {
                    return Err(eyre!("--wallet-rpc may only be specified once"));
                }
                wallet_rpc = Some(url);
            }
            "--keystore" => {
                let name = args
                    .next()
                    .ok_or_else(|| eyre!("--keystore requires a wallet name"))?;
                if keystore.is_some() {
                    return Err(eyre!("--keystore may only be specified once"));
                }
                keystore = Some(name);
            }
            "--keystore-dir" => {
                let dir = args
                    .next()
                    .ok_or_else(|| eyre!("--keystore-dir requires a path argument"))?;
                if keystore_dir.is_some() {
                    return Err(eyre!("--keystore-dir may only be specified once"));
                }
                keystore_dir = Some(dir);
            }
            "--log-dir" => {
                let dir = args
                    .next()
                    .ok_or_else(|| eyre!("--log-dir requires a path argument"))?;
                if log_dir.is_some() {
                    return Err(eyre!("--log-dir may only be specified once"));
                }
                log_dir = Some(dir);
            }
            "--list-wallets" => list_wallets = true,
            "--help" | "-h" => print_usage_and_exit(),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    if list_wallets {
        let dir = wallets::resolve_wallet_dir(keystore_dir.as_deref())?;
        print_wallet_listing(&dir)?;
        std::process::exit(0);
    }

    if wallet_rpc.is_some() && keystore.is_some() {
        return Err(eyre!("--wallet-rpc and --keystore are mutually exclusive"));
    }
    if keystore_dir.is_some() && keystore.is_none() {
        return Err(eyre!("--keystore-dir requires --keystore or --list-wallets"));
    }

    let network = match network_flag {
        None => {
            return Err(eyre!(
                "Select a network with --mainnet, --sepolia, or --local"
            ));
        }
        Some(NetworkFlag::Mainnet) => client::NetworkTarget::Mainnet {
            url: custom_url.unwrap_or_else(|| client::DEFAULT_MAINNET_RPC_URL.to_string()),
        },
        Some(NetworkFlag::Sepolia) => client::NetworkTarget::Sepolia {
            url: custom_url.unwrap_or_else(|| client::DEFAULT_SEPOLIA_RPC_URL.to_string()),
        },
        Some(NetworkFlag::Local) => client::NetworkTarget::LocalNode {
            url: custom_url.unwrap_or_else(|| client::DEFAULT_LOCAL_RPC_URL.to_string()),
        },
    };

    let wallets = match keystore {
        Some(name) => {
            let dir = wallets::resolve_wallet_dir(keystore_dir.as_deref())?;
            client::WalletConfig::Keystore { name, dir }
        }
        None => client::WalletConfig::WalletRpc {
            url: wallet_rpc.unwrap_or_else(|| client::DEFAULT_WALLET_RPC_URL.to_string()),
        },
    };

    let log_dir = log_dir.map(|raw| PathBuf::from(shellexpand::tilde(&raw).into_owned()));

    Ok(client::AppConfig {
        network,
        wallets,
        log_dir,
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let app_config = parse_cli_args()?;
    let log_dir = match app_config.log_dir.clone() {
        Some(dir) => dir,
        None => client::default_log_dir()?,
    };
    let _guard = client::init_tracing(&log_dir)?;
    tracing::info!("starting treasure-grid client");
    client::run_app(app_config).await
}
