//! Agent-runtime client
//!
//! Memory-block and tool operations against the runtime's `/v1` API.
//! Every request carries the shared secret twice (bare-password header
//! and bearer token); block operations issued on behalf of an agent add
//! the caller-identity header so the runtime attributes the write.

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{ensure_success, ClientError};
use crate::config::LettaConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Page size for the process-wide block listing
const BLOCK_PAGE_LIMIT: usize = 100;

/// Known-good utility id used when the dynamic find-tools lookup fails
const FIND_TOOLS_FALLBACK_ID: &str = "tool-e34b5c60-5bd5-4288-a97f-2167ddf3062b";

/// A memory block as the runtime returns it
#[derive(Debug, Clone, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub value: String,
}

/// A tool attached to an agent
#[derive(Debug, Clone, Deserialize)]
pub struct Tool {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Block listings arrive either as a bare array or wrapped in `blocks`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BlockListEnvelope {
    List(Vec<Block>),
    Wrapped {
        #[serde(default)]
        blocks: Vec<Block>,
    },
}

impl BlockListEnvelope {
    fn into_blocks(self) -> Vec<Block> {
        match self {
            Self::List(blocks) => blocks,
            Self::Wrapped { blocks } => blocks,
        }
    }
}

#[derive(Clone)]
pub struct LettaClient {
    base_url: String,
    password: String,
    http: reqwest::Client,
}

impl LettaClient {
    pub fn new(config: &LettaConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            password: config.password.clone(),
            http,
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/v1/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn headers(&self, agent_id: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&format!("password {}", self.password)) {
            headers.insert("X-BARE-PASSWORD", value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", self.password)) {
            headers.insert(AUTHORIZATION, value);
        }
        if let Some(agent_id) = agent_id {
            if let Ok(value) = HeaderValue::from_str(agent_id) {
                headers.insert("user_id", value);
            }
        }
        headers
    }

    /// List the blocks attached to an agent's core memory
    pub async fn list_agent_blocks(&self, agent_id: &str) -> Result<Vec<Block>, ClientError> {
        let url = self.api_url(&format!("agents/{agent_id}/core-memory/blocks"));
        let response = self
            .http
            .get(&url)
            .headers(self.headers(Some(agent_id)))
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let envelope: BlockListEnvelope = response.json().await?;
        Ok(envelope.into_blocks())
    }

    /// List process-wide blocks with a given label, paging until the
    /// runtime returns a short page.
    pub async fn list_blocks_by_label(&self, label: &str) -> Result<Vec<Block>, ClientError> {
        let url = self.api_url("blocks");
        let mut all = Vec::new();
        let mut after: Option<String> = None;

        let limit = BLOCK_PAGE_LIMIT.to_string();
        loop {
            let mut request = self.http.get(&url).headers(self.headers(None)).query(&[
                ("label", label),
                ("templates_only", "false"),
                ("limit", limit.as_str()),
            ]);
            if let Some(cursor) = &after {
                request = request.query(&[("after", cursor.as_str())]);
            }

            let response = ensure_success(request.send().await?).await?;
            let envelope: BlockListEnvelope = response.json().await?;
            let page = envelope.into_blocks();
            let page_len = page.len();
            after = page.last().map(|b| b.id.clone());
            all.extend(page);

            if page_len < BLOCK_PAGE_LIMIT || after.is_none() {
                return Ok(all);
            }
        }
    }

    /// Fetch a block by id
    pub async fn get_block(&self, block_id: &str) -> Result<Block, ClientError> {
        let url = self.api_url(&format!("blocks/{block_id}"));
        let response = self
            .http
            .get(&url)
            .headers(self.headers(None))
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Create a new block
    pub async fn create_block(
        &self,
        label: &str,
        value: &str,
        agent_id: Option<&str>,
    ) -> Result<Block, ClientError> {
        let url = self.api_url("blocks");
        let body = serde_json::json!({ "label": label, "value": value });
        let response = self
            .http
            .post(&url)
            .headers(self.headers(agent_id))
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Replace a block's value
    pub async fn update_block_value(
        &self,
        block_id: &str,
        value: &str,
        agent_id: Option<&str>,
    ) -> Result<Block, ClientError> {
        let url = self.api_url(&format!("blocks/{block_id}"));
        let body = serde_json::json!({ "value": value });
        let response = self
            .http
            .patch(&url)
            .headers(self.headers(agent_id))
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Attach a block to an agent's core memory. A 409 means the block
    /// is already attached and counts as success.
    pub async fn attach_block(&self, agent_id: &str, block_id: &str) -> Result<(), ClientError> {
        let url = self.api_url(&format!(
            "agents/{agent_id}/core-memory/blocks/attach/{block_id}"
        ));
        // Empty JSON body keeps intermediate proxies happy
        let response = self
            .http
            .patch(&url)
            .headers(self.headers(Some(agent_id)))
            .json(&serde_json::json!({}))
            .send()
            .await?;

        if response.status().as_u16() == 409 {
            debug!("Block {block_id} already attached to agent {agent_id}");
            return Ok(());
        }
        ensure_success(response).await?;
        Ok(())
    }

    /// List the tools attached to an agent
    pub async fn list_agent_tools(&self, agent_id: &str) -> Result<Vec<Tool>, ClientError> {
        let url = self.api_url(&format!("agents/{agent_id}/tools"));
        let response = self
            .http
            .get(&url)
            .headers(self.headers(Some(agent_id)))
            .send()
            .await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }

    /// Resolve the find-tools utility id from the agent's tool list,
    /// falling back to the known id when the lookup fails.
    pub async fn find_tools_utility_id(&self, agent_id: Option<&str>) -> String {
        if let Some(agent_id) = agent_id {
            match self.list_agent_tools(agent_id).await {
                Ok(tools) => {
                    if let Some(id) = pick_find_tools_id(&tools) {
                        return id;
                    }
                }
                Err(e) => warn!("Tool lookup failed for agent {agent_id}: {e}"),
            }
        }
        FIND_TOOLS_FALLBACK_ID.to_string()
    }
}

/// Exact `find_tools` name wins; otherwise the first tool whose name
/// mentions both "find" and "tool".
fn pick_find_tools_id(tools: &[Tool]) -> Option<String> {
    let mut candidate = None;
    for tool in tools {
        let name = tool.name.to_lowercase();
        if name == "find_tools" {
            return Some(tool.id.clone());
        }
        if candidate.is_none() && name.contains("find") && name.contains("tool") {
            candidate = Some(tool.id.clone());
        }
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool(id: &str, name: &str) -> Tool {
        Tool {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_exact_find_tools_name_wins() {
        let tools = vec![
            tool("tool-1", "tool_finder"),
            tool("tool-2", "find_tools"),
            tool("tool-3", "send_message"),
        ];
        assert_eq!(pick_find_tools_id(&tools), Some("tool-2".to_string()));
    }

    #[test]
    fn test_fuzzy_candidate_when_no_exact_match() {
        let tools = vec![tool("tool-1", "send_message"), tool("tool-2", "FindRelevantTools")];
        assert_eq!(pick_find_tools_id(&tools), Some("tool-2".to_string()));
    }

    #[test]
    fn test_no_candidate_found() {
        let tools = vec![tool("tool-1", "send_message")];
        assert_eq!(pick_find_tools_id(&tools), None);
    }

    #[test]
    fn test_block_envelope_accepts_both_shapes() {
        let bare = r#"[{"id": "block-1", "label": "notes", "value": "v"}]"#;
        let envelope: BlockListEnvelope = serde_json::from_str(bare).unwrap();
        assert_eq!(envelope.into_blocks().len(), 1);

        let wrapped = r#"{"blocks": [{"id": "block-1"}, {"id": "block-2"}]}"#;
        let envelope: BlockListEnvelope = serde_json::from_str(wrapped).unwrap();
        let blocks = envelope.into_blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].label, "");
    }
}
