//! Tool-attachment service client
//!
//! Single fire-and-report operation: given the prompt and an agent,
//! the service finds relevant tools and attaches them while honoring a
//! preserve list. The `"*"` wildcard means "keep everything currently
//! attached" and is passed through literally for the service to expand.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ensure_success, ClientError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Preserve-list wildcard expanded by the service, never locally
pub const KEEP_ALL_WILDCARD: &str = "*";

/// Cap on newly attached tools per webhook
pub const DEFAULT_ATTACH_LIMIT: usize = 3;

/// Minimum match score (0-100) for a tool to attach
pub const DEFAULT_MIN_SCORE: f64 = 70.0;

#[derive(Debug, Clone, Serialize)]
pub struct AttachRequest {
    pub query: String,
    pub agent_id: String,
    pub keep_tools: Vec<String>,
    pub limit: usize,
    pub min_score: f64,
    pub request_heartbeat: bool,
}

impl AttachRequest {
    /// Standard request: preserve everything already attached plus the
    /// find-tools utility, attach up to the default limit.
    pub fn new(query: String, agent_id: String, find_tools_id: String) -> Self {
        Self {
            query,
            agent_id,
            keep_tools: vec![KEEP_ALL_WILDCARD.to_string(), find_tools_id],
            limit: DEFAULT_ATTACH_LIMIT,
            min_score: DEFAULT_MIN_SCORE,
            request_heartbeat: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub details: AttachDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttachDetails {
    #[serde(default)]
    pub successful_attachments: Vec<AttachedTool>,
    #[serde(default)]
    pub preserved_tools: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttachedTool {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub tool_id: Option<String>,
}

impl AttachResponse {
    /// Names (or ids) of the tools the service attached
    pub fn attached_names(&self) -> Vec<String> {
        self.details
            .successful_attachments
            .iter()
            .map(|t| {
                t.name
                    .clone()
                    .or_else(|| t.tool_id.clone())
                    .unwrap_or_else(|| "unknown".to_string())
            })
            .collect()
    }

    /// Preserved tools as display strings; the service reports these as
    /// either bare ids or objects with a name
    pub fn preserved_names(&self) -> Vec<String> {
        self.details
            .preserved_tools
            .iter()
            .map(|v| match v {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Object(obj) => obj
                    .get("name")
                    .or_else(|| obj.get("tool_id"))
                    .and_then(|x| x.as_str())
                    .unwrap_or("unknown")
                    .to_string(),
                other => other.to_string(),
            })
            .collect()
    }
}

#[derive(Clone)]
pub struct ToolAttachClient {
    base_url: String,
    http: reqwest::Client,
}

impl ToolAttachClient {
    pub fn new(base_url: String) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { base_url, http })
    }

    pub async fn attach(&self, request: &AttachRequest) -> Result<AttachResponse, ClientError> {
        let url = format!("{}/api/v1/tools/attach", self.base_url);
        let response = self.http.post(&url).json(request).send().await?;
        let response = ensure_success(response).await?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request = AttachRequest::new(
            "deploy the service".to_string(),
            "agent-a".to_string(),
            "tool-find".to_string(),
        );
        assert_eq!(request.keep_tools, vec!["*", "tool-find"]);
        assert_eq!(request.limit, 3);
        assert!((request.min_score - 70.0).abs() < f64::EPSILON);
        assert!(!request.request_heartbeat);
    }

    #[test]
    fn test_request_serializes_wildcard_literally() {
        let request = AttachRequest::new("q".to_string(), "agent-a".to_string(), "tool-1".to_string());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["keep_tools"][0], "*");
        assert_eq!(json["keep_tools"][1], "tool-1");
    }

    #[test]
    fn test_response_parsing() {
        let json = r#"{
            "success": true,
            "details": {
                "successful_attachments": [
                    {"name": "web_search", "tool_id": "tool-ws", "match_score": 92.0}
                ],
                "preserved_tools": ["tool-old", {"name": "find_tools"}]
            }
        }"#;
        let response: AttachResponse = serde_json::from_str(json).unwrap();
        assert!(response.success);
        assert_eq!(response.attached_names(), vec!["web_search"]);
        assert_eq!(response.preserved_names(), vec!["tool-old", "find_tools"]);
    }

    #[test]
    fn test_response_tolerates_missing_details() {
        let response: AttachResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(!response.success);
        assert!(response.attached_names().is_empty());
    }
}
