// ====
// Vault Reader
// ====
// Read-only access to the copy-trading vault contract and native balances
// over JSON-RPC. One reader per endpoint, owned by the caller.
// ====

use async_trait::async_trait;
use chrono::DateTime;
use copytrade_common::VaultSnapshot;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use super::abi::{
    decode_words, encode_address_call, parse_quantity, validate_address, wei_to_tokens,
    word_to_bool, word_to_u128,
};
use super::errors::ChainError;
use crate::config::ChainSettings;

const VAULT_EXISTS_FN: &str = "vaultExists(address)";
/// Returns (balance, totalDeposited, totalWithdrawn, createdAt)
const GET_VAULT_FN: &str = "getVault(address)";

#[async_trait]
pub trait VaultReader: Send + Sync {
    async fn vault_exists(&self, address: &str) -> Result<bool, ChainError>;

    /// `None` when the address has no vault
    async fn vault_snapshot(&self, address: &str) -> Result<Option<VaultSnapshot>, ChainError>;

    /// Native token balance in whole tokens
    async fn native_balance(&self, address: &str) -> Result<Decimal, ChainError>;
}

pub struct RpcVaultReader {
    client: Client,
    rpc_url: String,
    vault_contract: String,
    next_id: AtomicU64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl RpcVaultReader {
    pub fn new(rpc_url: &str, vault_contract: &str) -> Result<Self, ChainError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            rpc_url: rpc_url.to_string(),
            vault_contract: validate_address(vault_contract)?,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn from_settings(settings: &ChainSettings) -> Result<Self, ChainError> {
        Self::new(&settings.rpc_url, &settings.vault_contract)
    }

    pub fn vault_contract(&self) -> &str {
        &self.vault_contract
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "rpc call");

        let response: RpcResponse<T> = self
            .client
            .post(&self.rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": id,
                "method": method,
                "params": params
            }))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            return Err(ChainError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        response
            .result
            .ok_or_else(|| ChainError::ParseError(format!("{} returned no result", method)))
    }

    async fn view_call(&self, signature: &str, address: &str) -> Result<String, ChainError> {
        let data = encode_address_call(signature, address)?;
        self.call(
            "eth_call",
            json!([{ "to": self.vault_contract, "data": data }, "latest"]),
        )
        .await
    }
}

#[async_trait]
impl VaultReader for RpcVaultReader {
    async fn vault_exists(&self, address: &str) -> Result<bool, ChainError> {
        let words = decode_words(&self.view_call(VAULT_EXISTS_FN, address).await?)?;
        match words.first() {
            Some(word) => word_to_bool(word),
            None => Ok(false),
        }
    }

    async fn vault_snapshot(&self, address: &str) -> Result<Option<VaultSnapshot>, ChainError> {
        let owner = validate_address(address)?;
        let words = decode_words(&self.view_call(GET_VAULT_FN, &owner).await?)?;
        if words.is_empty() {
            return Ok(None);
        }
        if words.len() < 4 {
            return Err(ChainError::ParseError(format!(
                "getVault returned {} words, expected 4",
                words.len()
            )));
        }

        let created_at_secs = word_to_u128(&words[3])?;
        if created_at_secs == 0 {
            return Ok(None);
        }
        let created_at = i64::try_from(created_at_secs)
            .ok()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or_else(|| ChainError::Overflow(created_at_secs.to_string()))?;

        Ok(Some(VaultSnapshot {
            owner,
            balance: wei_to_tokens(word_to_u128(&words[0])?)?,
            total_deposited: wei_to_tokens(word_to_u128(&words[1])?)?,
            total_withdrawn: wei_to_tokens(word_to_u128(&words[2])?)?,
            created_at,
        }))
    }

    async fn native_balance(&self, address: &str) -> Result<Decimal, ChainError> {
        let address = validate_address(address)?;
        let quantity: String = self
            .call("eth_getBalance", json!([address, "latest"]))
            .await?;
        wei_to_tokens(parse_quantity(&quantity)?)
    }
}
