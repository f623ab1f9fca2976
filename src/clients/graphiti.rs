//! Knowledge-graph search client
//!
//! Two POST endpoints, node search and fact search, invoked once each per
//! webhook and allowed to run concurrently. This is the only client that
//! retries; everything downstream of a final failure sees a display-ready
//! error string rather than an abort.

use serde::Deserialize;
use std::time::Duration;
use tracing::info;

use super::retry::RetryPolicy;
use super::{ensure_success, ClientError};
use crate::config::GraphitiConfig;
use crate::format::format_graph_context;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A node returned by semantic search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphNode {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub summary: String,
}

/// A fact edge returned by semantic search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GraphFact {
    #[serde(default)]
    pub fact: String,
}

/// Search responses arrive either as a bare array or wrapped in a
/// `results` field depending on the service version.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SearchEnvelope<T> {
    List(Vec<T>),
    Wrapped {
        #[serde(default)]
        results: Vec<T>,
    },
}

impl<T> SearchEnvelope<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Self::List(items) => items,
            Self::Wrapped { results } => results,
        }
    }
}

/// Combined context-generation outcome: always renders to text, and the
/// flag records whether the graph actually produced anything.
#[derive(Debug, Clone)]
pub struct GraphContext {
    pub text: String,
    pub success: bool,
}

#[derive(Clone)]
pub struct GraphitiClient {
    base_url: String,
    http: reqwest::Client,
    retry: RetryPolicy,
}

impl GraphitiClient {
    pub fn new(config: &GraphitiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            http,
            retry: RetryPolicy::default(),
        })
    }

    /// Run node and fact searches concurrently and render the combined
    /// context block. Upstream failure yields the error text with
    /// `success = false`; the caller keeps going either way.
    pub async fn generate_context(
        &self,
        query: &str,
        max_nodes: usize,
        max_facts: usize,
    ) -> GraphContext {
        let (nodes, facts) = tokio::join!(
            self.search_nodes(query, max_nodes),
            self.search_facts(query, max_facts)
        );

        match (nodes, facts) {
            (Ok(mut nodes), Ok(facts)) => {
                nodes.truncate(max_nodes);
                let facts = dedup_facts(facts, max_facts);
                info!(
                    "Knowledge graph returned {} nodes, {} facts for query ({} chars)",
                    nodes.len(),
                    facts.len(),
                    query.len()
                );

                let empty = nodes.is_empty() && facts.is_empty();
                GraphContext {
                    text: format_graph_context(&nodes, &facts, query, max_nodes, max_facts),
                    success: !empty,
                }
            }
            (Err(e), _) | (_, Err(e)) => GraphContext {
                text: format!("Error querying knowledge graph: {e}"),
                success: false,
            },
        }
    }

    async fn search_nodes(&self, query: &str, max_nodes: usize) -> Result<Vec<GraphNode>, ClientError> {
        let url = format!("{}/search/nodes", self.base_url);
        let body = serde_json::json!({
            "query": query,
            "max_nodes": max_nodes,
            "group_ids": [],
        });

        self.retry
            .run("knowledge-graph node search", || async {
                let response = self.http.post(&url).json(&body).send().await?;
                let response = ensure_success(response).await?;
                let envelope: SearchEnvelope<GraphNode> = response.json().await?;
                Ok(envelope.into_items())
            })
            .await
    }

    async fn search_facts(&self, query: &str, max_facts: usize) -> Result<Vec<GraphFact>, ClientError> {
        let url = format!("{}/search", self.base_url);
        let body = serde_json::json!({
            "query": query,
            "max_facts": max_facts,
            "group_ids": [],
        });

        self.retry
            .run("knowledge-graph fact search", || async {
                let response = self.http.post(&url).json(&body).send().await?;
                let response = ensure_success(response).await?;
                let envelope: SearchEnvelope<GraphFact> = response.json().await?;
                Ok(envelope.into_items())
            })
            .await
    }
}

/// Drop exact-duplicate facts, first occurrence wins, then clamp
fn dedup_facts(facts: Vec<GraphFact>, max_facts: usize) -> Vec<GraphFact> {
    let mut seen = std::collections::HashSet::new();
    let mut unique: Vec<GraphFact> = facts
        .into_iter()
        .filter(|f| seen.insert(f.fact.clone()))
        .collect();
    unique.truncate(max_facts);
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(text: &str) -> GraphFact {
        GraphFact {
            fact: text.to_string(),
        }
    }

    #[test]
    fn test_fact_dedup_preserves_first_occurrence() {
        let facts = vec![fact("a"), fact("b"), fact("a"), fact("c"), fact("b")];
        let unique = dedup_facts(facts, 20);
        let texts: Vec<&str> = unique.iter().map(|f| f.fact.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_fact_dedup_clamps_to_budget() {
        let facts = (0..30).map(|i| fact(&i.to_string())).collect();
        assert_eq!(dedup_facts(facts, 5).len(), 5);
    }

    #[test]
    fn test_envelope_accepts_bare_list() {
        let json = r#"[{"name": "N", "summary": "S"}]"#;
        let envelope: SearchEnvelope<GraphNode> = serde_json::from_str(json).unwrap();
        let items = envelope.into_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "N");
    }

    #[test]
    fn test_envelope_accepts_wrapped_results() {
        let json = r#"{"results": [{"fact": "water is wet"}]}"#;
        let envelope: SearchEnvelope<GraphFact> = serde_json::from_str(json).unwrap();
        let items = envelope.into_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].fact, "water is wet");
    }

    #[test]
    fn test_envelope_tolerates_missing_fields() {
        let json = r#"[{"name": "only name"}, {}]"#;
        let envelope: SearchEnvelope<GraphNode> = serde_json::from_str(json).unwrap();
        let items = envelope.into_items();
        assert_eq!(items[0].summary, "");
        assert_eq!(items[1].name, "");
    }
}
