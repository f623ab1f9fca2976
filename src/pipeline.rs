//! Webhook pipeline orchestrator
//!
//! Drives the five enrichment steps in order on the request task:
//! agent tracking, context generation, the cumulative-context block,
//! agent discovery, and tool attachment. Each step owns its failures;
//! only a payload with no prompt source escapes as an HTTP error. The
//! overall verdict follows the cumulative-context block operation, the
//! rest of the steps only color their own subobject.

use tracing::{info, warn};

use crate::blocks::{AVAILABLE_AGENTS_LABEL, GRAPH_CONTEXT_LABEL};
use crate::clients::tools::AttachRequest;
use crate::context::MAX_BLOCK_BYTES;
use crate::errors::AppError;
use crate::format::format_agent_listing;
use crate::handlers::state::RelayState;
use crate::handlers::types::{
    DiscoveryOutcome, GraphitiOutcome, ToolAttachmentOutcome, WebhookEvent, WebhookResponse,
};
use crate::validation::resolve_agent_id;

/// A webhook reduced to what the pipeline acts on
#[derive(Debug, Clone)]
pub struct ParsedWebhook {
    pub event_type: String,
    pub prompt_text: String,
    pub agent_id: Option<String>,
    pub max_nodes: usize,
    pub max_facts: usize,
}

/// Normalize a raw event. Fails only when the payload carries no prompt
/// source at all; an empty prompt is valid input.
pub fn parse_webhook(
    event: &WebhookEvent,
    default_max_nodes: usize,
    default_max_facts: usize,
) -> Result<ParsedWebhook, AppError> {
    let prompt = event
        .prompt
        .as_ref()
        .ok_or_else(|| AppError::MalformedWebhook("missing 'prompt' field".to_string()))?;

    let agent_id = resolve_agent_id(
        event
            .response
            .as_ref()
            .and_then(|r| r.agent_id.as_deref()),
        event.request.as_ref().and_then(|r| r.path.as_deref()),
    );

    Ok(ParsedWebhook {
        event_type: event
            .event_type
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
        prompt_text: prompt.to_text(),
        agent_id,
        max_nodes: event.max_nodes.unwrap_or(default_max_nodes),
        max_facts: event.max_facts.unwrap_or(default_max_facts),
    })
}

/// Run the full pipeline for one webhook
pub async fn process_webhook(
    state: &RelayState,
    event: WebhookEvent,
) -> Result<WebhookResponse, AppError> {
    let webhook = parse_webhook(
        &event,
        state.config.graphiti.max_nodes,
        state.config.graphiti.max_facts,
    )?;
    info!(
        "Processing '{}' webhook (agent: {}, prompt: {} chars)",
        webhook.event_type,
        webhook.agent_id.as_deref().unwrap_or("<none>"),
        webhook.prompt_text.len()
    );

    // Step 1: track the agent; first sighting notifies the chat bridge
    // off the request path.
    if let Some(agent_id) = &webhook.agent_id {
        if state.tracker.observe(agent_id) {
            state.notifier.submit(agent_id.clone());
        }
    }

    // Step 2: context generation. Always attempted; a knowledge-graph
    // failure becomes the context text itself.
    let graph = state
        .graphiti
        .generate_context(&webhook.prompt_text, webhook.max_nodes, webhook.max_facts)
        .await;

    // Step 3: cumulative-context block. Falls back to the process-wide
    // block when no agent id was resolved.
    let (graphiti, block_ok) = update_context_block(state, &webhook, &graph).await;

    // Step 4: agent discovery, replace-mode block. Best effort.
    let agent_discovery = discover_agents(state, &webhook).await;

    // Step 5: tool attachment. Best effort.
    let tool_attachment = attach_tools(state, &webhook).await;

    let success = match &webhook.agent_id {
        Some(_) => block_ok,
        None => true,
    };
    let message = summarize(&graphiti, &agent_discovery, &tool_attachment);

    Ok(WebhookResponse {
        success,
        message,
        block_id: graphiti.block_id.clone(),
        block_name: graphiti.block_name.clone(),
        graphiti,
        agent_discovery,
        tool_attachment,
        agent_id: webhook.agent_id,
    })
}

async fn update_context_block(
    state: &RelayState,
    webhook: &ParsedWebhook,
    graph: &crate::clients::graphiti::GraphContext,
) -> (GraphitiOutcome, bool) {
    match state
        .blocks
        .ensure_append(webhook.agent_id.as_deref(), GRAPH_CONTEXT_LABEL, &graph.text)
        .await
    {
        Ok(outcome) => {
            info!(
                "Context block {} {} (write: {})",
                outcome.block_id,
                if outcome.created { "created" } else { "located" },
                outcome.updated
            );
            (
                GraphitiOutcome {
                    success: graph.success,
                    block_id: Some(outcome.block_id),
                    block_name: Some(outcome.label),
                    updated: outcome.updated,
                    error: None,
                },
                true,
            )
        }
        Err(e) => {
            warn!("Context block operation failed: {e}");
            (
                GraphitiOutcome {
                    success: false,
                    block_id: None,
                    block_name: None,
                    updated: false,
                    error: Some(e.to_string()),
                },
                false,
            )
        }
    }
}

async fn discover_agents(state: &RelayState, webhook: &ParsedWebhook) -> DiscoveryOutcome {
    let Some(agent_id) = webhook.agent_id.as_deref() else {
        return DiscoveryOutcome {
            success: false,
            count: 0,
            block_id: None,
            error: Some("skipped: no agent id".to_string()),
        };
    };

    let agents = match state.registry.search(&webhook.prompt_text).await {
        Ok(agents) => agents,
        Err(e) => {
            warn!("Agent discovery search failed: {e}");
            return DiscoveryOutcome {
                success: false,
                count: 0,
                block_id: None,
                error: Some(e.to_string()),
            };
        }
    };

    let listing = format_agent_listing(&agents, MAX_BLOCK_BYTES);
    match state
        .blocks
        .ensure_replace(Some(agent_id), AVAILABLE_AGENTS_LABEL, &listing)
        .await
    {
        Ok(outcome) => {
            info!(
                "Agent listing block {} holds {} agents",
                outcome.block_id,
                agents.len()
            );
            DiscoveryOutcome {
                success: true,
                count: agents.len(),
                block_id: Some(outcome.block_id),
                error: None,
            }
        }
        Err(e) => {
            warn!("Agent listing block operation failed: {e}");
            DiscoveryOutcome {
                success: false,
                count: agents.len(),
                block_id: None,
                error: Some(e.to_string()),
            }
        }
    }
}

async fn attach_tools(state: &RelayState, webhook: &ParsedWebhook) -> ToolAttachmentOutcome {
    let Some(agent_id) = webhook.agent_id.as_deref() else {
        return ToolAttachmentOutcome {
            success: false,
            attached: Vec::new(),
            preserved: Vec::new(),
            error: Some("skipped: no agent id".to_string()),
        };
    };
    if webhook.prompt_text.trim().is_empty() {
        return ToolAttachmentOutcome {
            success: false,
            attached: Vec::new(),
            preserved: Vec::new(),
            error: Some("skipped: empty prompt".to_string()),
        };
    }

    let find_tools_id = state.letta.find_tools_utility_id(Some(agent_id)).await;
    let request = AttachRequest::new(
        webhook.prompt_text.clone(),
        agent_id.to_string(),
        find_tools_id,
    );

    match state.tools.attach(&request).await {
        Ok(response) => {
            let attached = response.attached_names();
            let preserved = response.preserved_names();
            info!(
                "Tool attachment: {} attached, {} preserved",
                attached.len(),
                preserved.len()
            );
            ToolAttachmentOutcome {
                success: response.success,
                attached,
                preserved,
                error: None,
            }
        }
        Err(e) => {
            warn!("Tool attachment failed: {e}");
            ToolAttachmentOutcome {
                success: false,
                attached: Vec::new(),
                preserved: Vec::new(),
                error: Some(e.to_string()),
            }
        }
    }
}

fn summarize(
    graphiti: &GraphitiOutcome,
    discovery: &DiscoveryOutcome,
    tools: &ToolAttachmentOutcome,
) -> String {
    let graphiti_part = if graphiti.success { "Graphiti: ok" } else { "Graphiti: failed" };

    let discovery_part = if discovery.success {
        format!("Agent discovery: {} agents", discovery.count)
    } else if discovery.error.as_deref().is_some_and(|e| e.starts_with("skipped")) {
        "Agent discovery: skipped".to_string()
    } else {
        "Agent discovery: failed".to_string()
    };

    let tools_part = if tools.success {
        format!("Tool attachment: {} attached", tools.attached.len())
    } else if tools.error.as_deref().is_some_and(|e| e.starts_with("skipped")) {
        "Tool attachment: skipped".to_string()
    } else {
        "Tool attachment: failed".to_string()
    };

    format!("Context processed. {graphiti_part}, {discovery_part}, {tools_part}")
}
