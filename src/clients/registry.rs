//! Agent-registry search client
//!
//! Semantic search over known agents. One GET per webhook, no retry:
//! discovery is best-effort and a failed search only dims the response.

use serde::Deserialize;
use std::time::Duration;

use super::{ensure_success, ClientError};
use crate::config::RegistryConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// One agent from the registry's ranked search results
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryAgent {
    #[serde(default)]
    pub agent_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub score: f64,
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    agents: Vec<RegistryAgent>,
}

#[derive(Clone)]
pub struct RegistryClient {
    base_url: String,
    max_agents: usize,
    min_score: f64,
    http: reqwest::Client,
}

impl RegistryClient {
    pub fn new(config: &RegistryConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            max_agents: config.max_agents,
            min_score: config.min_score,
            http,
        })
    }

    /// Search for agents relevant to the query, ranked by the registry
    pub async fn search(&self, query: &str) -> Result<Vec<RegistryAgent>, ClientError> {
        let url = format!("{}/api/v1/agents/search", self.base_url);
        let limit = self.max_agents.to_string();
        let min_score = self.min_score.to_string();
        let response = self
            .http
            .get(&url)
            .query(&[
                ("query", query),
                ("limit", limit.as_str()),
                ("min_score", min_score.as_str()),
            ])
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let results: SearchResults = response.json().await?;
        Ok(results.agents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_results_parsing() {
        let json = r#"{"agents": [
            {"agent_id": "agent-1", "name": "Scout", "description": "d", "capabilities": ["a"], "status": "active", "score": 0.91},
            {"agent_id": "agent-2"}
        ]}"#;
        let results: SearchResults = serde_json::from_str(json).unwrap();
        assert_eq!(results.agents.len(), 2);
        assert_eq!(results.agents[0].name, "Scout");
        assert_eq!(results.agents[1].status, "");
        assert_eq!(results.agents[1].score, 0.0);
    }

    #[test]
    fn test_empty_results() {
        let results: SearchResults = serde_json::from_str(r#"{}"#).unwrap();
        assert!(results.agents.is_empty());
    }
}
