// config.rs
// Settings: built-in defaults, optional `config.{toml,yaml,json}`, then
// `COPYTRADE__SECTION__KEY` environment overrides.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use tracing::info;

use crate::realtime::TransportKind;

#[derive(Debug, Deserialize, Clone)]
pub struct RealtimeSettings {
    pub ws_url: String,
    #[serde(default)]
    pub poll_url: Option<String>,
    pub poll_interval_ms: u64,
    pub transports: Vec<TransportKind>,
    pub reconnect_delay_ms: u64,
    pub reconnect_delay_max_ms: u64,
    /// Unlimited when absent
    #[serde(default)]
    pub reconnect_attempts: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChainSettings {
    pub rpc_url: String,
    pub vault_contract: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BaasSettings {
    pub url: String,
    pub anon_key: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct WalletSettings {
    #[serde(default)]
    pub private_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorSettings {
    pub traders: Vec<String>,
    pub symbols: Vec<String>,
    pub report_interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub realtime: RealtimeSettings,
    pub chain: ChainSettings,
    pub baas: BaasSettings,
    #[serde(default)]
    pub wallet: WalletSettings,
    pub monitor: MonitorSettings,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings: Settings = Self::defaults()?
            .add_source(File::with_name("config").required(false))
            .add_source(
                Environment::with_prefix("COPYTRADE")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("monitor.traders")
                    .with_list_parse_key("monitor.symbols")
                    .with_list_parse_key("realtime.transports")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        info!(
            ws_url = %settings.realtime.ws_url,
            traders = settings.monitor.traders.len(),
            "configuration loaded"
        );
        Ok(settings)
    }

    /// Builder preloaded with every default; callers add their own sources
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("realtime.ws_url", "ws://localhost:3001/ws")?
            .set_default("realtime.poll_url", "http://localhost:3001/poll")?
            .set_default("realtime.poll_interval_ms", 1000)?
            .set_default("realtime.transports", vec!["websocket", "polling"])?
            .set_default("realtime.reconnect_delay_ms", 1000)?
            .set_default("realtime.reconnect_delay_max_ms", 5000)?
            .set_default("chain.rpc_url", "http://localhost:8545")?
            .set_default(
                "chain.vault_contract",
                "0x0000000000000000000000000000000000000000",
            )?
            .set_default("baas.url", "http://localhost:54321")?
            .set_default("baas.anon_key", "")?
            .set_default("monitor.traders", Vec::<String>::new())?
            .set_default("monitor.symbols", vec!["BTC", "ETH", "SOL"])?
            .set_default("monitor.report_interval_secs", 10)
    }
}
