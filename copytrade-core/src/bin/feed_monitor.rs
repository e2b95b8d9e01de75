// copytrade-core/src/bin/feed_monitor.rs
// Smoke test for the push server: connect, follow the configured traders,
// print the cached board on an interval until Ctrl-C.

use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use copytrade_core::config::Settings;
use copytrade_core::display::{market_board, wallet_line, StatusBadge, TraderCard};
use copytrade_core::realtime::{Handshake, RealtimeClient, TransportEvent, WsTransport};
use copytrade_core::wallet::{LocalSigner, WalletHolder};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::new().context("Failed to load configuration")?;

    let wallet = Arc::new(WalletHolder::new());
    match &settings.wallet.private_key {
        Some(key) => {
            let signer = LocalSigner::from_private_key(key)?;
            wallet.connect_with_signer(signer);
        }
        None => {
            wallet.connect();
        }
    }
    info!("{}", wallet_line(&wallet.state()));

    let transport = Arc::new(WsTransport::from_settings(&settings.realtime)?);
    let handshake = Handshake::for_wallet(&wallet)?;
    let mut client = RealtimeClient::new(transport, handshake);
    client.initialize()?;

    let mut report = time::interval(Duration::from_secs(settings.monitor.report_interval_secs.max(1)));
    report.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            event = client.next_event() => {
                let Some(event) = event else { break };
                if event == TransportEvent::Connected {
                    for trader in &settings.monitor.traders {
                        if let Err(e) = client.subscribe_to_trader(trader) {
                            warn!("subscribe to {} failed: {}", trader, e);
                        }
                    }
                    client.subscribe_to_market_data(&settings.monitor.symbols);
                    if let Err(e) = client.request_portfolio() {
                        warn!("portfolio request failed: {}", e);
                    }
                }
            }

            _ = report.tick() => {
                let badge = StatusBadge::new(client.state(), client.status());
                println!("---- {} | reconnects {} ----", badge, client.status().reconnect_attempts);
                for row in market_board(client.cache()) {
                    println!("{}", row);
                }
                for trader in &settings.monitor.traders {
                    println!("{}", TraderCard::new(&client, trader));
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    client.close();
    wallet.disconnect();
    Ok(())
}
