use crate::{Block, BlockTreeEntry, BlockValidationResult, ValidationMode};

use super::contain;

/// The outcome of checking one block.
///
/// Callers branch on the validation mode first and read the more specific
/// result only when the mode is [`ValidationMode::Invalid`]; in every other
/// mode the result stays [`BlockValidationResult::Unset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockValidationState {
    mode: ValidationMode,
    result: BlockValidationResult,
}

impl BlockValidationState {
    /// State of a block that passed validation.
    pub fn valid() -> Self {
        BlockValidationState {
            mode: ValidationMode::Valid,
            result: BlockValidationResult::Unset,
        }
    }

    /// State of a rejected block. The result names the cause of rejection.
    pub fn invalid(result: BlockValidationResult) -> Self {
        debug_assert!(result != BlockValidationResult::Unset);
        BlockValidationState {
            mode: ValidationMode::Invalid,
            result,
        }
    }

    /// State of a block whose check failed inside the engine.
    pub fn internal_error() -> Self {
        BlockValidationState {
            mode: ValidationMode::InternalError,
            result: BlockValidationResult::Unset,
        }
    }

    pub fn validation_mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn block_validation_result(&self) -> BlockValidationResult {
        self.result
    }
}

/// Exposes the result after validating a block.
pub trait BlockCheckedCallback: Send + Sync {
    fn on_block_checked(&self, block: &Block, state: &BlockValidationState);
}

impl<F> BlockCheckedCallback for F
where
    F: Fn(&Block, &BlockValidationState) + Send + Sync,
{
    fn on_block_checked(&self, block: &Block, state: &BlockValidationState) {
        self(block, state)
    }
}

/// A block passed proof-of-work and structural checks, prior to full
/// contextual validation.
pub trait PowValidBlockCallback: Send + Sync {
    fn on_pow_valid_block(&self, block: &Block, entry: &BlockTreeEntry);
}

impl<F> PowValidBlockCallback for F
where
    F: Fn(&Block, &BlockTreeEntry) + Send + Sync,
{
    fn on_pow_valid_block(&self, block: &Block, entry: &BlockTreeEntry) {
        self(block, entry)
    }
}

/// A block was added to the active chain.
pub trait BlockConnectedCallback: Send + Sync {
    fn on_block_connected(&self, block: &Block, entry: &BlockTreeEntry);
}

impl<F> BlockConnectedCallback for F
where
    F: Fn(&Block, &BlockTreeEntry) + Send + Sync,
{
    fn on_block_connected(&self, block: &Block, entry: &BlockTreeEntry) {
        self(block, entry)
    }
}

/// A block was removed from the active chain during a reorganization.
///
/// For any reorganization, all disconnections of the old branch are
/// delivered before any connections of the new branch.
pub trait BlockDisconnectedCallback: Send + Sync {
    fn on_block_disconnected(&self, block: &Block, entry: &BlockTreeEntry);
}

impl<F> BlockDisconnectedCallback for F
where
    F: Fn(&Block, &BlockTreeEntry) + Send + Sync,
{
    fn on_block_disconnected(&self, block: &Block, entry: &BlockTreeEntry) {
        self(block, entry)
    }
}

/// Registry for managing validation interface callback handlers.
#[derive(Default)]
pub struct ValidationCallbackRegistry {
    block_checked: Option<Box<dyn BlockCheckedCallback>>,
    pow_valid_block: Option<Box<dyn PowValidBlockCallback>>,
    block_connected: Option<Box<dyn BlockConnectedCallback>>,
    block_disconnected: Option<Box<dyn BlockDisconnectedCallback>>,
}

impl ValidationCallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_block_checked<T>(&mut self, handler: T) -> &mut Self
    where
        T: BlockCheckedCallback + 'static,
    {
        self.block_checked = Some(Box::new(handler));
        self
    }

    pub fn register_pow_valid_block<T>(&mut self, handler: T) -> &mut Self
    where
        T: PowValidBlockCallback + 'static,
    {
        self.pow_valid_block = Some(Box::new(handler));
        self
    }

    pub fn register_block_connected<T>(&mut self, handler: T) -> &mut Self
    where
        T: BlockConnectedCallback + 'static,
    {
        self.block_connected = Some(Box::new(handler));
        self
    }

    pub fn register_block_disconnected<T>(&mut self, handler: T) -> &mut Self
    where
        T: BlockDisconnectedCallback + 'static,
    {
        self.block_disconnected = Some(Box::new(handler));
        self
    }
}

/// Routes per-block validation events to the registered handler set.
///
/// Unbound slots are skipped; handler panics are contained.
pub(crate) struct ValidationDispatcher {
    registry: ValidationCallbackRegistry,
}

impl ValidationDispatcher {
    pub(crate) fn new(registry: ValidationCallbackRegistry) -> Self {
        ValidationDispatcher { registry }
    }

    pub(crate) fn block_checked(&self, block: &Block, state: &BlockValidationState) {
        if let Some(handler) = &self.registry.block_checked {
            contain("block_checked", || handler.on_block_checked(block, state));
        }
    }

    pub(crate) fn pow_valid_block(&self, block: &Block, entry: &BlockTreeEntry) {
        if let Some(handler) = &self.registry.pow_valid_block {
            contain("pow_valid_block", || {
                handler.on_pow_valid_block(block, entry)
            });
        }
    }

    pub(crate) fn block_connected(&self, block: &Block, entry: &BlockTreeEntry) {
        if let Some(handler) = &self.registry.block_connected {
            contain("block_connected", || {
                handler.on_block_connected(block, entry)
            });
        }
    }

    pub(crate) fn block_disconnected(&self, block: &Block, entry: &BlockTreeEntry) {
        if let Some(handler) = &self.registry.block_disconnected {
            contain("block_disconnected", || {
                handler.on_block_disconnected(block, entry)
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::BlockHash;

    const RAW_BLOCK: &str = "0000002006226e46111a0b59caaf126043eb5bbf28c34f3a5e332a1fc7b2b73c\
                             f188910f295badc0bdd9a2bc0955d12f337491eae4c87ba4660078c015631028\
                             4d47c6ff9a242d66ffff7f200000000001020000000001010000000000000000\
                             000000000000000000000000000000000000000000000000ffffffff025100ff\
                             ffffff0200f2052a010000001600141409745405c4e8310a875bcd602db6b9b3\
                             dc0cf90000000000000000266a24aa21a9ede2f61c3f71d1defd3fa999dfa369\
                             53755c690689799962b48bebd836974e8cf90120000000000000000000000000\
                             000000000000000000000000000000000000000000000000";

    fn test_block() -> Block {
        Block::try_from(hex::decode(RAW_BLOCK).unwrap().as_slice()).unwrap()
    }

    #[test]
    fn test_validation_state_valid() {
        let state = BlockValidationState::valid();
        assert_eq!(state.validation_mode(), ValidationMode::Valid);
        assert_eq!(
            state.block_validation_result(),
            BlockValidationResult::Unset
        );
    }

    #[test]
    fn test_validation_state_invalid_carries_reason() {
        let state = BlockValidationState::invalid(BlockValidationResult::MissingPrev);
        assert_eq!(state.validation_mode(), ValidationMode::Invalid);
        assert_eq!(
            state.block_validation_result(),
            BlockValidationResult::MissingPrev
        );
    }

    #[test]
    fn test_validation_state_internal_error() {
        let state = BlockValidationState::internal_error();
        assert_eq!(state.validation_mode(), ValidationMode::InternalError);
        assert_eq!(
            state.block_validation_result(),
            BlockValidationResult::Unset
        );
    }

    #[test]
    fn test_unbound_slots_are_skipped() {
        let dispatcher = ValidationDispatcher::new(ValidationCallbackRegistry::new());
        let block = test_block();
        let entry = BlockTreeEntry::new(1, block.hash());
        dispatcher.block_checked(&block, &BlockValidationState::valid());
        dispatcher.pow_valid_block(&block, &entry);
        dispatcher.block_connected(&block, &entry);
        dispatcher.block_disconnected(&block, &entry);
    }

    #[test]
    fn test_block_checked_sees_state() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ValidationCallbackRegistry::new();
        let sink = seen.clone();
        registry.register_block_checked(move |block: &Block, state: &BlockValidationState| {
            sink.lock().unwrap().push((block.hash(), *state));
        });
        let dispatcher = ValidationDispatcher::new(registry);
        let block = test_block();
        let state = BlockValidationState::invalid(BlockValidationResult::Mutated);
        dispatcher.block_checked(&block, &state);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, block.hash());
        assert_eq!(seen[0].1, state);
    }

    #[test]
    fn test_handler_may_take_derived_handles() {
        let hashes: Arc<Mutex<Vec<BlockHash>>> = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ValidationCallbackRegistry::new();
        let sink = hashes.clone();
        registry.register_block_connected(move |block: &Block, entry: &BlockTreeEntry| {
            // owned copies outlive the borrowed arguments
            sink.lock().unwrap().push(block.hash());
            sink.lock().unwrap().push(entry.block_hash());
        });
        let dispatcher = ValidationDispatcher::new(registry);
        let block = test_block();
        let entry = BlockTreeEntry::new(1, block.hash());
        dispatcher.block_connected(&block, &entry);
        drop(block);
        let hashes = hashes.lock().unwrap();
        assert_eq!(hashes.len(), 2);
        assert_eq!(hashes[0], hashes[1]);
    }

    #[test]
    fn test_panicking_handler_is_contained() {
        let mut registry = ValidationCallbackRegistry::new();
        registry.register_block_checked(|_: &Block, _: &BlockValidationState| {
            panic!("handler bug")
        });
        let dispatcher = ValidationDispatcher::new(registry);
        let block = test_block();
        dispatcher.block_checked(&block, &BlockValidationState::valid());
        dispatcher.block_checked(&block, &BlockValidationState::valid());
    }
}
