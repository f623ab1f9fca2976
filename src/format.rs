//! Formatters turning upstream search results into memory-block text
//!
//! Both formatters are total: missing optional fields render as empty
//! strings, and empty result sets produce a short explanatory message
//! instead of an empty payload.

use crate::clients::graphiti::{GraphFact, GraphNode};
use crate::clients::registry::RegistryAgent;

/// Header line of every non-empty knowledge-graph context block
pub const GRAPH_CONTEXT_HEADER: &str = "Relevant Entities from Knowledge Graph:";

/// Render knowledge-graph nodes and facts as a context block.
///
/// Layout: the header, then one `Node:`/`Summary:` pair per node and one
/// `Fact:` line per fact, parts separated by blank lines. An empty result
/// renders as an explanatory one-liner naming the query and bounds.
pub fn format_graph_context(
    nodes: &[GraphNode],
    facts: &[GraphFact],
    query: &str,
    max_nodes: usize,
    max_facts: usize,
) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(nodes.len() + facts.len());

    for node in nodes {
        parts.push(format!("Node: {}\nSummary: {}", node.name, node.summary));
    }
    for fact in facts {
        parts.push(format!("Fact: {}", fact.fact));
    }

    if parts.is_empty() {
        return format!(
            "No relevant information found in the knowledge graph for query: '{query}' (searched {max_nodes} nodes, {max_facts} facts)"
        );
    }

    format!("{GRAPH_CONTEXT_HEADER}\n{}", parts.join("\n\n"))
}

/// Render a registry search result as the `available_agents` block value.
///
/// Trailing agents are dropped until the listing fits `max_bytes`; the
/// header and footer always survive.
pub fn format_agent_listing(agents: &[RegistryAgent], max_bytes: usize) -> String {
    if agents.is_empty() {
        return "No relevant agents found for the current context.".to_string();
    }

    let header = "Available Agents for Collaboration:\n";
    let footer =
        "\n\nYou can message these agents using the matrix_agent_message tool with their agent ID.";

    let mut body = String::new();
    for agent in agents {
        let entry = format_agent_entry(agent);
        if header.len() + body.len() + entry.len() + footer.len() > max_bytes {
            break;
        }
        body.push_str(&entry);
    }

    format!("{header}{body}{footer}")
}

fn format_agent_entry(agent: &RegistryAgent) -> String {
    let mut entry = format!(
        "\n• {} (ID: {})\n  Status: {}\n  Relevance: {:.2}\n  Description: {}",
        agent.name,
        agent.agent_id,
        agent.status,
        agent.score,
        clip(&agent.description, 150),
    );
    if !agent.capabilities.is_empty() {
        let caps: Vec<&str> = agent.capabilities.iter().take(3).map(String::as_str).collect();
        entry.push_str(&format!("\n  Capabilities: {}", caps.join(", ")));
    }
    entry
}

fn clip(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let clipped: String = text.chars().take(max_chars).collect();
    format!("{clipped}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(name: &str, summary: &str) -> GraphNode {
        GraphNode {
            name: name.to_string(),
            summary: summary.to_string(),
        }
    }

    fn fact(text: &str) -> GraphFact {
        GraphFact {
            fact: text.to_string(),
        }
    }

    fn agent(id: &str, name: &str, score: f64) -> RegistryAgent {
        RegistryAgent {
            agent_id: id.to_string(),
            name: name.to_string(),
            description: "Handles things".to_string(),
            capabilities: vec!["search".to_string(), "summarize".to_string()],
            status: "active".to_string(),
            score,
        }
    }

    #[test]
    fn test_single_node_layout() {
        let text = format_graph_context(&[node("N", "S")], &[], "hello", 8, 20);
        assert_eq!(text, "Relevant Entities from Knowledge Graph:\nNode: N\nSummary: S");
    }

    #[test]
    fn test_nodes_and_facts_layout() {
        let text = format_graph_context(
            &[node("A", "first"), node("B", "second")],
            &[fact("water is wet")],
            "q",
            8,
            20,
        );
        assert_eq!(
            text,
            "Relevant Entities from Knowledge Graph:\nNode: A\nSummary: first\n\nNode: B\nSummary: second\n\nFact: water is wet"
        );
    }

    #[test]
    fn test_empty_result_fallback() {
        let text = format_graph_context(&[], &[], "orphan query", 8, 20);
        assert_eq!(
            text,
            "No relevant information found in the knowledge graph for query: 'orphan query' (searched 8 nodes, 20 facts)"
        );
    }

    #[test]
    fn test_missing_fields_render_empty() {
        let text = format_graph_context(&[node("", "")], &[fact("")], "q", 8, 20);
        assert_eq!(
            text,
            "Relevant Entities from Knowledge Graph:\nNode: \nSummary: \n\nFact: "
        );
    }

    #[test]
    fn test_agent_listing_layout() {
        let text = format_agent_listing(&[agent("agent-1", "Scout", 0.87)], 4800);
        assert!(text.starts_with("Available Agents for Collaboration:\n"));
        assert!(text.contains("• Scout (ID: agent-1)"));
        assert!(text.contains("Status: active"));
        assert!(text.contains("Relevance: 0.87"));
        assert!(text.contains("Capabilities: search, summarize"));
        assert!(text.ends_with("with their agent ID."));
    }

    #[test]
    fn test_agent_listing_empty() {
        assert_eq!(
            format_agent_listing(&[], 4800),
            "No relevant agents found for the current context."
        );
    }

    #[test]
    fn test_agent_listing_drops_trailing_to_fit() {
        let agents: Vec<RegistryAgent> = (0..100)
            .map(|i| agent(&format!("agent-{i:03}"), &format!("Worker {i:03}"), 0.5))
            .collect();
        let text = format_agent_listing(&agents, 1000);

        assert!(text.len() <= 1000);
        assert!(text.contains("agent-000"));
        assert!(!text.contains("agent-099"));
        assert!(text.ends_with("with their agent ID."));
    }

    #[test]
    fn test_description_clipped() {
        let mut long = agent("agent-9", "Verbose", 0.4);
        long.description = "d".repeat(400);
        let text = format_agent_listing(&[long], 4800);
        assert!(text.contains(&format!("{}...", "d".repeat(150))));
        assert!(!text.contains(&"d".repeat(200)));
    }
}
