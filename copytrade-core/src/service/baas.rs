// service/baas.rs
// REST client for the hosted auth/database service (PostgREST dialect).
// Table and column names belong to the hosted schema.

use copytrade_common::data::types::DataError;
use copytrade_common::{CommunityPost, CopySubscription, TradeSignal, UserProfile};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};

use super::errors::ServiceError;
use crate::config::BaasSettings;

const PROFILES: &str = "profiles";
const SUBSCRIPTIONS: &str = "subscriptions";
const SIGNALS: &str = "signals";
const POSTS: &str = "community_posts";

#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub has_more: bool,
}

pub struct BaasClient {
    http: Client,
    base_url: String,
    anon_key: String,
    access_token: Option<String>,
}

impl BaasClient {
    pub fn new(base_url: &str, anon_key: &str) -> Result<Self, ServiceError> {
        if base_url.trim().is_empty() {
            return Err(ServiceError::Config("BaaS url is empty".to_string()));
        }
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            access_token: None,
        })
    }

    pub fn from_settings(settings: &BaasSettings) -> Result<Self, ServiceError> {
        Self::new(&settings.url, &settings.anon_key)
    }

    /// Use a signed-in user's token instead of the anonymous key
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    // ====================================================================
    // PROFILES
    // ====================================================================

    /// Insert or update by wallet address; returns the stored row
    pub async fn upsert_profile(&self, profile: &UserProfile) -> Result<UserProfile, ServiceError> {
        require_wallet_address(&profile.wallet_address)?;

        let response = self
            .authorized(self.http.post(self.endpoint(PROFILES)))
            .query(&[("on_conflict", "wallet_address")])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(profile)
            .send()
            .await?;

        let rows: Vec<UserProfile> = self.read(response).await?;
        rows.into_iter().next().ok_or_else(|| {
            DataError::NotFound(format!("profile {} after upsert", profile.wallet_address)).into()
        })
    }

    pub async fn get_profile(&self, wallet_address: &str) -> Result<Option<UserProfile>, ServiceError> {
        require_wallet_address(wallet_address)?;

        let response = self
            .authorized(self.http.get(self.endpoint(PROFILES)))
            .query(&[
                ("select", "*".to_string()),
                ("wallet_address", eq(wallet_address)),
                ("limit", "1".to_string()),
            ])
            .send()
            .await?;

        let rows: Vec<UserProfile> = self.read(response).await?;
        Ok(rows.into_iter().next())
    }

    // ====================================================================
    // COPY TRADING
    // ====================================================================

    /// Active subscriptions of a follower, newest first
    pub async fn list_subscriptions(
        &self,
        follower_wallet: &str,
    ) -> Result<Vec<CopySubscription>, ServiceError> {
        require_wallet_address(follower_wallet)?;

        let response = self
            .authorized(self.http.get(self.endpoint(SUBSCRIPTIONS)))
            .query(&[
                ("select", "*".to_string()),
                ("follower_wallet", eq(follower_wallet)),
                ("is_active", "eq.true".to_string()),
                ("order", "created_at.desc".to_string()),
            ])
            .send()
            .await?;

        self.read(response).await
    }

    /// Most recent signals published by a trader
    pub async fn list_signals(
        &self,
        trader_wallet: &str,
        limit: u32,
    ) -> Result<Vec<TradeSignal>, ServiceError> {
        require_wallet_address(trader_wallet)?;

        let response = self
            .authorized(self.http.get(self.endpoint(SIGNALS)))
            .query(&[
                ("select", "*".to_string()),
                ("trader_wallet", eq(trader_wallet)),
                ("order", "created_at.desc".to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;

        self.read(response).await
    }

    // ====================================================================
    // COMMUNITY
    // ====================================================================

    /// Zero-based page of posts, newest first
    pub async fn list_posts(&self, page: u32, page_size: u32) -> Result<Page<CommunityPost>, ServiceError> {
        if page_size == 0 {
            return Err(DataError::InvalidInput("page_size must be positive".to_string()).into());
        }
        let offset = u64::from(page) * u64::from(page_size);
        let limit = u64::from(page_size) + 1;

        // One extra row tells whether another page exists
        let response = self
            .authorized(self.http.get(self.endpoint(POSTS)))
            .query(&[
                ("select", "*".to_string()),
                ("order", "created_at.desc".to_string()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ])
            .send()
            .await?;

        let mut items: Vec<CommunityPost> = self.read(response).await?;
        let has_more = items.len() > page_size as usize;
        items.truncate(page_size as usize);
        debug!(page, count = items.len(), has_more, "fetched community posts");

        Ok(Page {
            items,
            page,
            page_size,
            has_more,
        })
    }

    // ====================================================================
    // INTERNAL
    // ====================================================================

    fn endpoint(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = self.access_token.as_deref().unwrap_or(&self.anon_key);
        builder.header("apikey", &self.anon_key).bearer_auth(token)
    }

    async fn read<T: DeserializeOwned>(&self, response: Response) -> Result<T, ServiceError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), %message, "BaaS request failed");
            return Err(ServiceError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

fn require_wallet_address(wallet_address: &str) -> Result<(), DataError> {
    if wallet_address.trim().is_empty() {
        return Err(DataError::InvalidInput("wallet address is empty".to_string()));
    }
    Ok(())
}
