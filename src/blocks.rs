//! Memory-block manager
//!
//! Locate-or-create-or-update for the per-agent labeled blocks the
//! pipeline maintains. Lookup checks the agent's attached blocks first,
//! then the process-wide listing; a located-but-unattached block is
//! attached before any write. Updates skip the PATCH entirely when the
//! value would not change, and every outgoing value respects the block
//! byte budget.

use tracing::{debug, info};

use crate::clients::letta::{Block, LettaClient};
use crate::clients::ClientError;
use crate::context;

/// Label of the append-mode cumulative context block
pub const GRAPH_CONTEXT_LABEL: &str = "graphiti_context";

/// Label of the replace-mode agent listing block
pub const AVAILABLE_AGENTS_LABEL: &str = "available_agents";

/// Result of a block operation
#[derive(Debug, Clone)]
pub struct BlockOutcome {
    pub block_id: String,
    pub label: String,
    /// A new block was created (as opposed to an existing one located)
    pub created: bool,
    /// A write was issued against an existing block
    pub updated: bool,
}

#[derive(Clone)]
pub struct BlockManager {
    letta: LettaClient,
}

impl BlockManager {
    pub fn new(letta: LettaClient) -> Self {
        Self { letta }
    }

    /// Append `new_value` to the labeled block's cumulative context,
    /// creating and attaching the block if it does not exist yet.
    pub async fn ensure_append(
        &self,
        agent_id: Option<&str>,
        label: &str,
        new_value: &str,
    ) -> Result<BlockOutcome, ClientError> {
        match self.locate(agent_id, label).await? {
            Some((block, attached)) => {
                self.attach_if_needed(agent_id, &block, attached).await?;

                let current = match self.letta.get_block(&block.id).await {
                    Ok(current) => current,
                    // Deleted between lookup and fetch
                    Err(e) if e.is_not_found() => return self.create(agent_id, label, new_value).await,
                    Err(e) => return Err(e),
                };

                let appended = context::append(&current.value, new_value);
                if appended == current.value {
                    debug!("Block {} unchanged, skipping write", block.id);
                    return Ok(BlockOutcome {
                        block_id: block.id,
                        label: label.to_string(),
                        created: false,
                        updated: false,
                    });
                }
                self.write(agent_id, label, &block.id, &appended).await
            }
            None => self.create(agent_id, label, new_value).await,
        }
    }

    /// Overwrite the labeled block's value wholesale (no cumulative
    /// history), creating and attaching it if missing.
    pub async fn ensure_replace(
        &self,
        agent_id: Option<&str>,
        label: &str,
        value: &str,
    ) -> Result<BlockOutcome, ClientError> {
        let value = clamp_to_budget(value);

        match self.locate(agent_id, label).await? {
            Some((block, attached)) => {
                self.attach_if_needed(agent_id, &block, attached).await?;

                let current = match self.letta.get_block(&block.id).await {
                    Ok(current) => current,
                    Err(e) if e.is_not_found() => return self.create(agent_id, label, value).await,
                    Err(e) => return Err(e),
                };

                if current.value == value {
                    debug!("Block {} unchanged, skipping write", block.id);
                    return Ok(BlockOutcome {
                        block_id: block.id,
                        label: label.to_string(),
                        created: false,
                        updated: false,
                    });
                }
                self.write(agent_id, label, &block.id, value).await
            }
            None => self.create(agent_id, label, value).await,
        }
    }

    /// Find the canonical block for `(agent, label)`: the agent's
    /// attached blocks first, then the process-wide listing. First match
    /// wins in both stages.
    async fn locate(
        &self,
        agent_id: Option<&str>,
        label: &str,
    ) -> Result<Option<(Block, bool)>, ClientError> {
        if let Some(agent_id) = agent_id {
            let attached = self.letta.list_agent_blocks(agent_id).await?;
            if let Some(block) = attached.into_iter().find(|b| b.label == label) {
                debug!("Found attached '{label}' block {} for {agent_id}", block.id);
                return Ok(Some((block, true)));
            }
        }

        let global = self.letta.list_blocks_by_label(label).await?;
        if let Some(block) = global.into_iter().find(|b| b.label == label) {
            debug!("Found process-wide '{label}' block {}", block.id);
            return Ok(Some((block, false)));
        }

        Ok(None)
    }

    async fn attach_if_needed(
        &self,
        agent_id: Option<&str>,
        block: &Block,
        attached: bool,
    ) -> Result<(), ClientError> {
        if attached {
            return Ok(());
        }
        if let Some(agent_id) = agent_id {
            info!("Attaching block {} to agent {agent_id}", block.id);
            self.letta.attach_block(agent_id, &block.id).await?;
        }
        Ok(())
    }

    async fn write(
        &self,
        agent_id: Option<&str>,
        label: &str,
        block_id: &str,
        value: &str,
    ) -> Result<BlockOutcome, ClientError> {
        match self.letta.update_block_value(block_id, value, agent_id).await {
            Ok(_) => Ok(BlockOutcome {
                block_id: block_id.to_string(),
                label: label.to_string(),
                created: false,
                updated: true,
            }),
            // Deleted underneath us: fall back to creating fresh
            Err(e) if e.is_not_found() => self.create(agent_id, label, value).await,
            Err(e) => Err(e),
        }
    }

    async fn create(
        &self,
        agent_id: Option<&str>,
        label: &str,
        value: &str,
    ) -> Result<BlockOutcome, ClientError> {
        // Route the initial value through the append engine so an
        // oversized first entry is cut to budget the same way
        let value = context::append("", value);
        let block = self.letta.create_block(label, &value, agent_id).await?;
        info!("Created '{label}' block {}", block.id);

        if let Some(agent_id) = agent_id {
            self.letta.attach_block(agent_id, &block.id).await?;
        }

        Ok(BlockOutcome {
            block_id: block.id,
            label: label.to_string(),
            created: true,
            updated: false,
        })
    }
}

/// Hard guard applied to replace-mode values before they go out
fn clamp_to_budget(value: &str) -> &str {
    if value.len() <= context::MAX_BLOCK_BYTES {
        return value;
    }
    let mut end = context::MAX_BLOCK_BYTES;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
