use crate::engine::{codes, BlockVerdict, ChainUpdate, ManagerConfig, ValidationEngine};
use crate::{Block, Context, DispatchError, Notifications};

/// Result of processing a block with the chainstate manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessBlockResult {
    /// Block was accepted and is new
    NewBlock,
    /// Block was accepted but was already known
    Duplicate,
    /// Block was rejected during validation
    Rejected,
}

impl ProcessBlockResult {
    /// Decodes the packed outcome of a submission call.
    ///
    /// `status` truthy means the block was validly processed; `is_new` is
    /// meaningful only then and distinguishes fresh work from a duplicate.
    /// A falsy `status` is a rejection regardless of `is_new`.
    pub fn from_raw(status: i32, is_new: i32) -> Self {
        match (codes::accepted(status), codes::enabled(is_new)) {
            (true, true) => ProcessBlockResult::NewBlock,
            (true, false) => ProcessBlockResult::Duplicate,
            (false, _) => ProcessBlockResult::Rejected,
        }
    }

    /// Returns true if the block was accepted and is new
    pub fn is_new_block(&self) -> bool {
        matches!(self, Self::NewBlock)
    }

    /// Returns true if the block was accepted but was already known
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate)
    }

    /// Returns true if the block was rejected
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected)
    }
}

/// Holds the configuration options for creating a new [`ChainstateManager`].
///
/// Options are single-use: creating the manager consumes them.
pub struct ChainstateManagerOptions {
    context: Context,
    config: ManagerConfig,
}

impl ChainstateManagerOptions {
    /// Create a new option set.
    ///
    /// # Arguments
    /// * `context` - The [`ChainstateManager`] created from these options
    ///   keeps a handle to this [`Context`].
    /// * `data_dir` - Directory for chainstate data, passed through to the
    ///   engine as an opaque string.
    /// * `blocks_dir` - Directory for block storage, same contract.
    pub fn new(context: &Context, data_dir: &str, blocks_dir: &str) -> Result<Self, DispatchError> {
        check_dir(data_dir)?;
        check_dir(blocks_dir)?;
        Ok(Self {
            context: context.clone(),
            config: ManagerConfig {
                data_dir: data_dir.to_string(),
                blocks_dir: blocks_dir.to_string(),
                worker_threads: 0,
                wipe_block_tree_db: false,
                wipe_chainstate_db: false,
                block_tree_db_in_memory: false,
                chainstate_db_in_memory: false,
            },
        })
    }

    /// Set the number of worker threads used by the engine for validation.
    pub fn worker_threads(mut self, worker_threads: i32) -> Self {
        self.config.worker_threads = worker_threads;
        self
    }

    /// Wipe the block tree or chainstate dbs. When wiping the block tree db
    /// the chainstate db has to be wiped too.
    pub fn wipe_db(mut self, wipe_block_tree: bool, wipe_chainstate: bool) -> Self {
        self.config.wipe_block_tree_db = wipe_block_tree;
        self.config.wipe_chainstate_db = wipe_chainstate;
        self
    }

    /// Run the block tree db in-memory only.
    pub fn block_tree_db_in_memory(mut self, in_memory: bool) -> Self {
        self.config.block_tree_db_in_memory = in_memory;
        self
    }

    /// Run the chainstate db in-memory only.
    pub fn chainstate_db_in_memory(mut self, in_memory: bool) -> Self {
        self.config.chainstate_db_in_memory = in_memory;
        self
    }
}

fn check_dir(path: &str) -> Result<(), DispatchError> {
    if path.is_empty() {
        return Err(DispatchError::InvalidOptions(
            "Directory path is empty.".to_string(),
        ));
    }
    if path.contains('\0') {
        return Err(DispatchError::InvalidOptions(
            "Directory path contains a NUL byte.".to_string(),
        ));
    }
    Ok(())
}

/// The chainstate manager drives the validation engine and routes its
/// per-block events to the handlers registered on the [`Context`].
///
/// It holds a handle to the [`Context`] it was created from, so the context
/// outlives every manager derived from it; teardown order is manager first,
/// context last.
pub struct ChainstateManager {
    context: Context,
    notifications: Notifications,
    engine: Box<dyn ValidationEngine>,
}

impl ChainstateManager {
    /// Consumes the options and starts the engine over them.
    pub fn new(
        options: ChainstateManagerOptions,
        engine: Box<dyn ValidationEngine>,
    ) -> Result<Self, DispatchError> {
        let ChainstateManagerOptions { context, config } = options;
        let notifications = context.notifications();
        engine.start(&config, context.chain_params(), notifications.clone())?;
        Ok(Self {
            context,
            notifications,
            engine,
        })
    }

    /// Process and validate the passed in block.
    ///
    /// Blocks until validation and all synchronous callbacks for this block
    /// have completed. The returned disposition distinguishes fresh work
    /// from duplicates and rejections; in case of a rejection the details
    /// arrive through the `block_checked` callback, which fires before this
    /// call returns.
    pub fn process_block(&self, block: &Block) -> Result<ProcessBlockResult, DispatchError> {
        self.ensure_live()?;
        let verdict = self.engine.check_block(block);
        self.route(block, &verdict);
        // a fatal error raised during the callbacks shuts the call down
        self.ensure_live()?;
        let result = ProcessBlockResult::from_raw(verdict.status, verdict.is_new);
        log::debug!("processed block {}: {:?}", block.hash(), result);
        Ok(result)
    }

    /// Trigger an import or reindex of existing block data in the engine.
    pub fn import_blocks(&self) -> Result<(), DispatchError> {
        self.ensure_live()?;
        self.engine.import_blocks()
    }

    /// Delivers the verdict contents in contract order: pow_valid_block,
    /// then block_checked, then all disconnections before any connections,
    /// then the tip notification.
    fn route(&self, block: &Block, verdict: &BlockVerdict) {
        let validation = self.context.validation();
        if let Some(entry) = &verdict.pow_entry {
            validation.pow_valid_block(block, entry);
        }
        if let Some(state) = &verdict.state {
            validation.block_checked(block, state);
        }
        for update in &verdict.updates {
            match update {
                ChainUpdate::Disconnected { block, entry } => {
                    validation.block_disconnected(block, entry)
                }
                ChainUpdate::Connected { block, entry } => {
                    validation.block_connected(block, entry)
                }
            }
        }
        if let Some(tip) = &verdict.tip {
            self.notifications
                .block_tip(tip.state, &tip.entry, tip.verification_progress);
        }
    }

    fn ensure_live(&self) -> Result<(), DispatchError> {
        if self.context.is_halted() {
            return Err(DispatchError::Fatal(
                self.context
                    .fatal_message()
                    .unwrap_or_else(|| "Engine raised a fatal error.".to_string()),
            ));
        }
        Ok(())
    }
}
