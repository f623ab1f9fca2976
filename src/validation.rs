//! Agent-id shape checks and extraction from webhook payloads

/// Prefix every runtime agent id carries
pub const AGENT_ID_PREFIX: &str = "agent-";

/// True when the string matches the runtime's agent-id convention
pub fn is_valid_agent_id(candidate: &str) -> bool {
    candidate.len() > AGENT_ID_PREFIX.len() && candidate.starts_with(AGENT_ID_PREFIX)
}

/// Extract the agent id from a request path like
/// `/v1/agents/agent-<uuid>/messages`: the segment immediately after
/// `agents`, if it has the right shape.
pub fn agent_id_from_path(path: &str) -> Option<String> {
    let mut segments = path.split('/');
    while let Some(segment) = segments.next() {
        if segment == "agents" {
            return segments
                .next()
                .filter(|id| is_valid_agent_id(id))
                .map(str::to_string);
        }
    }
    None
}

/// Resolve the agent id for a webhook: the response's `agent_id` wins,
/// then the request path. Candidates with the wrong shape are skipped.
pub fn resolve_agent_id(response_agent_id: Option<&str>, request_path: Option<&str>) -> Option<String> {
    if let Some(id) = response_agent_id {
        if is_valid_agent_id(id) {
            return Some(id.to_string());
        }
    }
    request_path.and_then(agent_id_from_path)
}
