// realtime/polling.rs
// HTTP long-polling fallback: GET drains pending frames, POST sends one frame.

use reqwest::Client;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::errors::RealtimeError;
use super::protocol::{Frame, Handshake};

#[derive(Debug, Clone)]
pub struct PollingSession {
    client: Client,
    url: Url,
    interval: Duration,
}

impl PollingSession {
    pub fn new(
        client: Client,
        base_url: &Url,
        handshake: &Handshake,
        interval: Duration,
    ) -> Self {
        let mut url = base_url.clone();
        handshake.apply_to(&mut url);
        Self {
            client,
            url,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fetches all frames queued for this wallet since the last poll
    pub async fn poll(&self) -> Result<Vec<Frame>, RealtimeError> {
        let frames: Vec<Frame> = self
            .client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        if !frames.is_empty() {
            debug!(count = frames.len(), "polled frames");
        }
        Ok(frames)
    }

    pub async fn send(&self, frame: &Frame) -> Result<(), RealtimeError> {
        self.client
            .post(self.url.clone())
            .json(frame)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockHttpServer;
    use serde_json::json;

    #[tokio::test]
    async fn test_poll_and_send() {
        let server = MockHttpServer::start(vec![
            json!([
                { "event": "trade_update", "payload": { "symbol": "BTC" } },
                { "event": "portfolio_update", "payload": {} }
            ]),
            json!({}),
        ])
        .await;

        let base = Url::parse(&format!("{}/poll", server.base_url())).unwrap();
        let session = PollingSession::new(
            Client::new(),
            &base,
            &Handshake::new("0xme"),
            Duration::from_millis(500),
        );

        let frames = session.poll().await.unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].event, "trade_update");

        let frame = Frame {
            event: "subscribe_trader".to_string(),
            payload: json!({ "traderWallet": "0xt" }),
        };
        session.send(&frame).await.unwrap();

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[0].starts_with("GET /poll?walletAddress=0xme"));
        assert!(requests[1].starts_with("POST /poll?walletAddress=0xme"));
        assert!(requests[1].contains("\"traderWallet\":\"0xt\""));
    }
}
