// copytrade-core/src/bin/vault_check.rs
// Usage: vault_check <address>

use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use tracing_subscriber::EnvFilter;

use copytrade_core::chain::{RpcVaultReader, VaultReader};
use copytrade_core::config::Settings;
use copytrade_core::format::{format_usd, shorten_address};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let Some(address) = std::env::args().nth(1) else {
        bail!("usage: vault_check <address>");
    };

    let settings = Settings::new().context("Failed to load configuration")?;
    let reader = RpcVaultReader::from_settings(&settings.chain)?;
    println!(
        "Vault contract {} via {}",
        shorten_address(reader.vault_contract()),
        settings.chain.rpc_url
    );

    match reader.native_balance(&address).await {
        Ok(balance) => println!("Native balance: {}", balance),
        Err(e) => println!("Native balance unavailable: {}", e),
    }

    match reader.vault_exists(&address).await {
        Ok(false) => println!("No vault for {}", shorten_address(&address)),
        Ok(true) => match reader.vault_snapshot(&address).await? {
            Some(vault) => {
                println!("Vault for {}", shorten_address(&vault.owner));
                println!("  balance          {}", format_usd(vault.balance));
                println!("  total deposited  {}", format_usd(vault.total_deposited));
                println!("  total withdrawn  {}", format_usd(vault.total_withdrawn));
                println!("  created          {}", vault.created_at.to_rfc3339());
            }
            None => println!("Vault flagged but empty for {}", shorten_address(&address)),
        },
        Err(e) => println!("Vault lookup failed: {}", e),
    }

    Ok(())
}
