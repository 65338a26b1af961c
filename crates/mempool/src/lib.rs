//! The liveness core: carrying a submitted transaction from ingress through
//! admission checking to durable inclusion in a committed block.
//!
//! Three delivery guarantees share one admission mechanism:
//! fire-and-forget ([`TxPipeline::submit_async`]), synchronous admission
//! ([`TxPipeline::submit_sync`]), and synchronous commit confirmation
//! ([`TxPipeline::submit_and_await_commit`]).

pub mod events;
pub mod pipeline;
pub mod status;

pub use events::{CommitEvents, CommitSubscription, CommittedTx};
pub use pipeline::{PipelineConfig, TxCommitResponse, TxPipeline, TxSyncResponse};
pub use status::NodeStatus;
