//! Configuration management for context-relay
//!
//! All configurable parameters in one place, loaded from environment
//! variables. Service base URLs and the runtime credential are required
//! and validated eagerly: a bad value fails startup before any port is
//! bound, so an empty base URL can never be stringified into a request
//! path at runtime.

use std::env;
use tracing::info;

use crate::errors::ConfigError;

/// Knowledge-graph service configuration
#[derive(Debug, Clone)]
pub struct GraphitiConfig {
    /// Absolute base URL of the knowledge-graph API
    pub base_url: String,
    /// Default max nodes per query (default: 8)
    pub max_nodes: usize,
    /// Default max facts per query (default: 20)
    pub max_facts: usize,
}

/// Agent-runtime service configuration
#[derive(Debug, Clone)]
pub struct LettaConfig {
    /// Absolute base URL of the agent runtime (API lives under `/v1`)
    pub base_url: String,
    /// Shared secret, sent as both the bare-password header and a bearer token
    pub password: String,
}

/// Agent-registry search configuration
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Absolute base URL of the registry service
    pub base_url: String,
    /// Top-k agents per discovery query (default: 10)
    pub max_agents: usize,
    /// Minimum relevance score in [0, 1] (default: 0.3)
    pub min_score: f64,
}

/// Server configuration loaded from environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server port (default: 5005)
    pub port: u16,

    /// Knowledge-graph service
    pub graphiti: GraphitiConfig,

    /// Agent runtime
    pub letta: LettaConfig,

    /// Tool-attachment service base URL
    pub tool_attach_url: String,

    /// Chat-bridge base URL for new-agent notifications
    pub matrix_url: String,

    /// Agent registry
    pub registry: RegistryConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Required: `GRAPHITI_URL`, `LETTA_BASE_URL`, `LETTA_PASSWORD`,
    /// `TOOL_ATTACH_URL`, `MATRIX_CLIENT_URL`, `AGENT_REGISTRY_URL`.
    /// Everything else has a default.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            port: optional_parsed("RELAY_PORT", 5005)?,
            graphiti: GraphitiConfig {
                base_url: required_url("GRAPHITI_URL")?,
                max_nodes: optional_bounded("GRAPHITI_MAX_NODES", 8)?,
                max_facts: optional_bounded("GRAPHITI_MAX_FACTS", 20)?,
            },
            letta: LettaConfig {
                base_url: required_url("LETTA_BASE_URL")?,
                password: required_nonempty("LETTA_PASSWORD")?,
            },
            tool_attach_url: required_url("TOOL_ATTACH_URL")?,
            matrix_url: required_url("MATRIX_CLIENT_URL")?,
            registry: RegistryConfig {
                base_url: required_url("AGENT_REGISTRY_URL")?,
                max_agents: optional_bounded("AGENT_REGISTRY_MAX_AGENTS", 10)?,
                min_score: optional_score("AGENT_REGISTRY_MIN_SCORE", 0.3)?,
            },
        })
    }

    /// Log the resolved configuration (secrets excluded)
    pub fn log(&self) {
        info!("Configuration:");
        info!("   Port: {}", self.port);
        info!("   Knowledge graph: {}", self.graphiti.base_url);
        info!(
            "   Graph bounds: {} nodes, {} facts",
            self.graphiti.max_nodes, self.graphiti.max_facts
        );
        info!("   Agent runtime: {}", self.letta.base_url);
        info!("   Tool attachment: {}", self.tool_attach_url);
        info!("   Chat bridge: {}", self.matrix_url);
        info!(
            "   Agent registry: {} (top {}, min score {:.2})",
            self.registry.base_url, self.registry.max_agents, self.registry.min_score
        );
    }
}

/// Read a required variable and verify it parses as an absolute http(s)
/// URL. Trailing slashes are stripped so clients can join paths with a
/// plain separator.
fn required_url(name: &'static str) -> Result<String, ConfigError> {
    let raw = env::var(name).map_err(|_| ConfigError::Missing(name))?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Empty(name));
    }

    let parsed = reqwest::Url::parse(trimmed).map_err(|e| ConfigError::InvalidUrl {
        name,
        reason: e.to_string(),
    })?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ConfigError::InvalidUrl {
                name,
                reason: format!("unsupported scheme '{other}'"),
            })
        }
    }
    if parsed.host_str().is_none() {
        return Err(ConfigError::InvalidUrl {
            name,
            reason: "missing host".to_string(),
        });
    }

    Ok(trimmed.trim_end_matches('/').to_string())
}

fn required_nonempty(name: &'static str) -> Result<String, ConfigError> {
    let raw = env::var(name).map_err(|_| ConfigError::Missing(name))?;
    if raw.trim().is_empty() {
        return Err(ConfigError::Empty(name));
    }
    Ok(raw)
}

fn optional_parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            name,
            reason: e.to_string(),
        }),
    }
}

/// Optional positive integer (must be >= 1 when set)
fn optional_bounded(name: &'static str, default: usize) -> Result<usize, ConfigError> {
    let value: usize = optional_parsed(name, default)?;
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            name,
            reason: "must be >= 1".to_string(),
        });
    }
    Ok(value)
}

/// Optional relevance score (must be within [0, 1] when set)
fn optional_score(name: &'static str, default: f64) -> Result<f64, ConfigError> {
    let value: f64 = optional_parsed(name, default)?;
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::InvalidValue {
            name,
            reason: format!("must be within [0, 1], got {value}"),
        });
    }
    Ok(value)
}
