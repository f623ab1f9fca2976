//! Webhook wire types
//!
//! Request and response structures for the webhook surface. The request
//! side is deliberately permissive: unknown fields are ignored and every
//! documented field is optional at the parse layer, with the pipeline
//! deciding what is actually required.

use serde::{Deserialize, Serialize};

// =============================================================================
// INBOUND WEBHOOK
// =============================================================================

/// An inbound agent-runtime webhook event
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// Event type, e.g. `message_sent` or `stream_started`. Other values
    /// are accepted and processed identically.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,

    /// The prompt: either a raw string or ordered text segments
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<Prompt>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseInfo>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestInfo>,

    /// Per-request override of the knowledge-graph node bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_nodes: Option<usize>,

    /// Per-request override of the knowledge-graph fact bound
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_facts: Option<usize>,
}

/// String-or-segments prompt variant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Prompt {
    Text(String),
    Segments(Vec<PromptSegment>),
}

impl Prompt {
    /// Normalize to plain text: segment texts of kind `text` joined by
    /// single spaces, or the raw string.
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Segments(segments) => segments
                .iter()
                .filter(|s| s.kind == "text")
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptSegment {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

// =============================================================================
// WEBHOOK RESPONSE
// =============================================================================

/// Full webhook response: overall verdict plus per-subsystem outcomes
#[derive(Debug, Clone, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    pub message: String,
    pub graphiti: GraphitiOutcome,
    pub agent_discovery: DiscoveryOutcome,
    pub tool_attachment: ToolAttachmentOutcome,
    /// Serialized as `null` when no agent id could be resolved
    pub agent_id: Option<String>,
    pub block_id: Option<String>,
    pub block_name: Option<String>,
}

/// Outcome of context generation plus the cumulative-context block write
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphitiOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_name: Option<String>,
    /// True only when an existing block actually received a write
    pub updated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of registry search plus the agent-listing block replace
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiscoveryOutcome {
    pub success: bool,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of the tool-attachment call
#[derive(Debug, Clone, Default, Serialize)]
pub struct ToolAttachmentOutcome {
    pub success: bool,
    pub attached: Vec<String>,
    pub preserved: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_prompt() {
        let json = r#"{"type": "message_sent", "prompt": "hello world"}"#;
        let event: WebhookEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.prompt.unwrap().to_text(), "hello world");
    }

    #[test]
    fn test_segmented_prompt_joins_text_parts() {
        let json = r#"{
            "prompt": [
                {"type": "text", "text": "first"},
                {"type": "image", "text": "ignored"},
                {"type": "text", "text": "second"}
            ]
        }"#;
        let event: WebhookEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.prompt.unwrap().to_text(), "first second");
    }

    #[test]
    fn test_prompt_with_no_text_segments_is_empty() {
        let json = r#"{"prompt": [{"type": "image", "text": "x"}]}"#;
        let event: WebhookEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.prompt.unwrap().to_text(), "");
    }

    #[test]
    fn test_missing_prompt_parses_as_none() {
        let json = r#"{"type": "stream_started"}"#;
        let event: WebhookEvent = serde_json::from_str(json).unwrap();
        assert!(event.prompt.is_none());
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let json = r#"{"type": "message_sent", "prompt": "p", "unexpected": {"deep": [1, 2]}}"#;
        let event: WebhookEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.event_type.as_deref(), Some("message_sent"));
    }

    #[test]
    fn test_documented_fields_round_trip() {
        let json = r#"{
            "type": "message_sent",
            "prompt": "hello",
            "response": {"agent_id": "agent-abc"},
            "request": {"path": "/v1/agents/agent-abc/messages"},
            "max_nodes": 5,
            "max_facts": 12
        }"#;
        let event: WebhookEvent = serde_json::from_str(json).unwrap();
        let reserialized = serde_json::to_string(&event).unwrap();
        let reparsed: WebhookEvent = serde_json::from_str(&reserialized).unwrap();

        assert_eq!(reparsed.event_type.as_deref(), Some("message_sent"));
        assert_eq!(reparsed.prompt.unwrap().to_text(), "hello");
        assert_eq!(
            reparsed.response.unwrap().agent_id.as_deref(),
            Some("agent-abc")
        );
        assert_eq!(
            reparsed.request.unwrap().path.as_deref(),
            Some("/v1/agents/agent-abc/messages")
        );
        assert_eq!(reparsed.max_nodes, Some(5));
        assert_eq!(reparsed.max_facts, Some(12));
    }

    #[test]
    fn test_response_serializes_null_agent_id() {
        let response = WebhookResponse {
            success: true,
            message: "ok".to_string(),
            graphiti: GraphitiOutcome::default(),
            agent_discovery: DiscoveryOutcome::default(),
            tool_attachment: ToolAttachmentOutcome::default(),
            agent_id: None,
            block_id: None,
            block_name: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert!(json["agent_id"].is_null());
        assert!(json.get("graphiti").is_some());
    }
}
