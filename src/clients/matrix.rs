//! Chat-bridge notifier
//!
//! Fire-and-forget sideband signal telling the chat bridge a new agent
//! was seen. Runs off the request path on the notifier workers; its only
//! failure mode is a log line.

use std::time::Duration;

use super::{ensure_success, ClientError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct MatrixClient {
    base_url: String,
    http: reqwest::Client,
}

impl MatrixClient {
    pub fn new(base_url: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { base_url, http })
    }

    /// Announce a newly seen agent to the chat bridge
    pub async fn notify_new_agent(&self, agent_id: &str) -> Result<(), ClientError> {
        let url = format!("{}/webhook/new-agent", self.base_url);
        let body = serde_json::json!({
            "agent_id": agent_id,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });
        let response = self.http.post(&url).json(&body).send().await?;
        ensure_success(response).await?;
        Ok(())
    }
}
