//! context-relay
//!
//! Webhook-driven context enrichment sitting between an agent runtime
//! and its backing services. On every inbound agent message the pipeline
//! retrieves relevant knowledge-graph context, maintains a bounded
//! per-agent cumulative-context memory block, discovers and attaches the
//! most relevant tools and peer agents, and emits a sideband signal the
//! first time each agent is seen.
//!
//! All durable state lives in the agent runtime's memory blocks and the
//! registry's vector store; this process holds only the tracker set.

pub mod blocks;
pub mod clients;
pub mod config;
pub mod context;
pub mod errors;
pub mod format;
pub mod handlers;
pub mod pipeline;
pub mod similarity;
pub mod tracker;
pub mod validation;

// Re-export dependencies so tests use the same versions
pub use chrono;
pub use parking_lot;
