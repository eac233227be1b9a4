//! The validation engine boundary.
//!
//! The dispatch layer does not validate blocks itself; it drives an engine
//! behind the [`ValidationEngine`] trait and routes what the engine reports
//! to the registered handler sets. Consensus rules, chain-state storage and
//! networking all live behind this seam.

pub mod codes;
pub mod in_memory;

use crate::{
    Block, BlockTreeEntry, BlockValidationResult, BlockValidationState, ChainParams,
    DispatchError, Notifications, SynchronizationState,
};

pub use in_memory::InMemoryEngine;

/// Configuration handed to an engine when its chainstate manager is created.
///
/// The directory paths are opaque strings owned by the wrapping program;
/// the dispatch layer never interprets them.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub data_dir: String,
    pub blocks_dir: String,
    pub worker_threads: i32,
    pub wipe_block_tree_db: bool,
    pub wipe_chainstate_db: bool,
    pub block_tree_db_in_memory: bool,
    pub chainstate_db_in_memory: bool,
}

/// A change to the active chain caused by one block submission.
///
/// Engines must order all disconnections of the old branch before any
/// connections of the new branch.
pub enum ChainUpdate {
    /// A block was added to the active chain.
    Connected { block: Block, entry: BlockTreeEntry },
    /// A block was removed from the active chain.
    Disconnected { block: Block, entry: BlockTreeEntry },
}

/// The tip of the active chain after a submission was applied.
pub struct TipUpdate {
    pub state: SynchronizationState,
    pub entry: BlockTreeEntry,
    pub verification_progress: f64,
}

/// Everything the engine reports about one checked block.
///
/// The chainstate manager routes the contents to the registered handlers in
/// contract order and decodes the packed `(status, is_new)` pair into the
/// submission disposition.
pub struct BlockVerdict {
    /// Outcome of the check; `None` when no check was performed (the block
    /// was a duplicate of an already processed one).
    pub state: Option<BlockValidationState>,
    /// Raw submission status code; nonzero means validly processed.
    pub status: i32,
    /// Raw out-parameter flag; nonzero means the block was newly seen.
    pub is_new: i32,
    /// Tree entry for the block once it passed proof-of-work and structural
    /// checks.
    pub pow_entry: Option<BlockTreeEntry>,
    /// Ordered connect/disconnect stream produced by applying the block.
    pub updates: Vec<ChainUpdate>,
    /// New active tip, if it changed.
    pub tip: Option<TipUpdate>,
}

impl BlockVerdict {
    /// Verdict for a newly accepted block. Updates and tip are filled in by
    /// the engine afterwards.
    pub fn accepted(pow_entry: BlockTreeEntry) -> Self {
        BlockVerdict {
            state: Some(BlockValidationState::valid()),
            status: codes::to_code(true),
            is_new: codes::to_code(true),
            pow_entry: Some(pow_entry),
            updates: Vec::new(),
            tip: None,
        }
    }

    /// Verdict for a block that duplicates an already processed one. No
    /// validation work was done and no validation events fire.
    pub fn duplicate() -> Self {
        BlockVerdict {
            state: None,
            status: codes::to_code(true),
            is_new: codes::to_code(false),
            pow_entry: None,
            updates: Vec::new(),
            tip: None,
        }
    }

    /// Verdict for a rejected block.
    pub fn rejected(result: BlockValidationResult) -> Self {
        BlockVerdict {
            state: Some(BlockValidationState::invalid(result)),
            status: codes::to_code(false),
            is_new: codes::to_code(false),
            pow_entry: None,
            updates: Vec::new(),
            tip: None,
        }
    }

    /// Verdict for a check that failed inside the engine.
    pub fn internal_error() -> Self {
        BlockVerdict {
            state: Some(BlockValidationState::internal_error()),
            status: codes::to_code(false),
            is_new: codes::to_code(false),
            pow_entry: None,
            updates: Vec::new(),
            tip: None,
        }
    }
}

/// A block validation engine driven by a [`crate::ChainstateManager`].
///
/// The engine may run background work on threads the caller does not
/// control and emit notifications from them through the [`Notifications`]
/// handle it receives at start. Per-block validation outcomes travel back
/// through [`BlockVerdict`] values and are routed synchronously by the
/// manager.
pub trait ValidationEngine: Send + Sync {
    /// Called once when the chainstate manager is created. The engine keeps
    /// the notification handle for the manager's lifetime.
    fn start(
        &self,
        config: &ManagerConfig,
        chain: &ChainParams,
        notifications: Notifications,
    ) -> Result<(), DispatchError>;

    /// Check one block and report what happened. This is a blocking call;
    /// it returns only after validation finished.
    fn check_block(&self, block: &Block) -> BlockVerdict;

    /// Trigger an import or reindex of existing block data.
    fn import_blocks(&self) -> Result<(), DispatchError> {
        Ok(())
    }
}
