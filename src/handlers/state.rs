//! Shared application state
//!
//! One [`RelayState`] is built at startup and handed to every handler
//! behind an `Arc`. It owns the typed service clients, the block
//! manager, the agent tracker, and the background notifier handle.

use std::sync::Arc;

use crate::blocks::BlockManager;
use crate::clients::graphiti::GraphitiClient;
use crate::clients::letta::LettaClient;
use crate::clients::matrix::MatrixClient;
use crate::clients::registry::RegistryClient;
use crate::clients::tools::ToolAttachClient;
use crate::config::ServerConfig;
use crate::tracker::{AgentTracker, Notifier};

/// Number of background workers draining new-agent notifications
const NOTIFIER_WORKERS: usize = 2;

pub struct RelayState {
    pub config: ServerConfig,
    pub graphiti: GraphitiClient,
    pub letta: LettaClient,
    pub blocks: BlockManager,
    pub registry: RegistryClient,
    pub tools: ToolAttachClient,
    pub tracker: AgentTracker,
    pub notifier: Notifier,
}

/// Application state type alias
pub type AppState = Arc<RelayState>;

impl RelayState {
    /// Build all clients and spawn the notifier workers. Must run inside
    /// the async runtime (the notifier spawns tasks).
    pub fn new(config: ServerConfig) -> anyhow::Result<Self> {
        let graphiti = GraphitiClient::new(&config.graphiti)?;
        let letta = LettaClient::new(&config.letta)?;
        let blocks = BlockManager::new(letta.clone());
        let registry = RegistryClient::new(&config.registry)?;
        let tools = ToolAttachClient::new(config.tool_attach_url.clone())?;
        let matrix = MatrixClient::new(config.matrix_url.clone())?;
        let notifier = Notifier::spawn(matrix, NOTIFIER_WORKERS);

        Ok(Self {
            config,
            graphiti,
            letta,
            blocks,
            registry,
            tools,
            tracker: AgentTracker::new(),
            notifier,
        })
    }
}
