// Copyright (c) 2023-present The Bitcoin Kernel developers
// Licensed under the MIT License. See LICENSE file in the project root.

use crate::engine::codes::{
    BLOCK_VALIDATION_RESULT_CACHED_INVALID, BLOCK_VALIDATION_RESULT_CONSENSUS,
    BLOCK_VALIDATION_RESULT_HEADER_LOW_WORK, BLOCK_VALIDATION_RESULT_INVALID_HEADER,
    BLOCK_VALIDATION_RESULT_INVALID_PREV, BLOCK_VALIDATION_RESULT_MISSING_PREV,
    BLOCK_VALIDATION_RESULT_MUTATED, BLOCK_VALIDATION_RESULT_TIME_FUTURE,
    BLOCK_VALIDATION_RESULT_UNSET, SYNCHRONIZATION_STATE_INIT_DOWNLOAD,
    SYNCHRONIZATION_STATE_INIT_REINDEX, SYNCHRONIZATION_STATE_POST_INIT,
    VALIDATION_MODE_INTERNAL_ERROR, VALIDATION_MODE_INVALID, VALIDATION_MODE_VALID,
    WARNING_LARGE_WORK_INVALID_CHAIN, WARNING_UNKNOWN_NEW_RULES_ACTIVATED,
};

/// Current synchronization state of the blockchain.
///
/// Indicates what phase of synchronization is currently active. Emitted by
/// tip notifications to track sync progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SynchronizationState {
    /// Currently reindexing the blockchain from disk
    InitReindex,
    /// Initial block download - syncing from network peers
    InitDownload,
    /// Synchronization complete - processing new blocks
    PostInit,
    /// A state code this library predates; carries the raw code
    Unknown(u32),
}

impl From<u32> for SynchronizationState {
    fn from(value: u32) -> Self {
        match value {
            SYNCHRONIZATION_STATE_INIT_REINDEX => SynchronizationState::InitReindex,
            SYNCHRONIZATION_STATE_INIT_DOWNLOAD => SynchronizationState::InitDownload,
            SYNCHRONIZATION_STATE_POST_INIT => SynchronizationState::PostInit,
            other => SynchronizationState::Unknown(other),
        }
    }
}

impl From<SynchronizationState> for u32 {
    fn from(state: SynchronizationState) -> Self {
        match state {
            SynchronizationState::InitReindex => SYNCHRONIZATION_STATE_INIT_REINDEX,
            SynchronizationState::InitDownload => SYNCHRONIZATION_STATE_INIT_DOWNLOAD,
            SynchronizationState::PostInit => SYNCHRONIZATION_STATE_POST_INIT,
            SynchronizationState::Unknown(other) => other,
        }
    }
}

/// Warning conditions raised by the engine during validation.
///
/// A warning is set with a human-readable message and may later be unset
/// again; both transitions are delivered as independent events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Warning {
    /// Unknown new consensus rules have been activated
    UnknownNewRulesActivated,
    /// A chain with significant work contains invalid blocks
    LargeWorkInvalidChain,
    /// A warning kind this library predates; carries the raw code
    Unknown(u32),
}

impl From<u32> for Warning {
    fn from(value: u32) -> Self {
        match value {
            WARNING_UNKNOWN_NEW_RULES_ACTIVATED => Warning::UnknownNewRulesActivated,
            WARNING_LARGE_WORK_INVALID_CHAIN => Warning::LargeWorkInvalidChain,
            other => Warning::Unknown(other),
        }
    }
}

impl From<Warning> for u32 {
    fn from(warning: Warning) -> Self {
        match warning {
            Warning::UnknownNewRulesActivated => WARNING_UNKNOWN_NEW_RULES_ACTIVATED,
            Warning::LargeWorkInvalidChain => WARNING_LARGE_WORK_INVALID_CHAIN,
            Warning::Unknown(other) => other,
        }
    }
}

/// Terminal mode of checking one block.
///
/// Callers branch on the mode first; the more specific
/// [`BlockValidationResult`] is meaningful only when the mode is
/// [`ValidationMode::Invalid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationMode {
    /// The block is valid according to the engine's rules
    Valid,
    /// The block is invalid; the validation result names the cause
    Invalid,
    /// An internal error occurred during validation
    InternalError,
    /// A mode code this library predates; carries the raw code
    Unknown(u32),
}

impl From<u32> for ValidationMode {
    fn from(value: u32) -> Self {
        match value {
            VALIDATION_MODE_VALID => ValidationMode::Valid,
            VALIDATION_MODE_INVALID => ValidationMode::Invalid,
            VALIDATION_MODE_INTERNAL_ERROR => ValidationMode::InternalError,
            other => ValidationMode::Unknown(other),
        }
    }
}

impl From<ValidationMode> for u32 {
    fn from(mode: ValidationMode) -> Self {
        match mode {
            ValidationMode::Valid => VALIDATION_MODE_VALID,
            ValidationMode::Invalid => VALIDATION_MODE_INVALID,
            ValidationMode::InternalError => VALIDATION_MODE_INTERNAL_ERROR,
            ValidationMode::Unknown(other) => other,
        }
    }
}

/// The reason a block was rejected.
///
/// Gives more specific information than the bare valid/invalid mode. The
/// reasons are deliberately separated from [`ValidationMode`] because
/// "invalid" is a single terminal mode with many possible causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockValidationResult {
    /// Initial value - the block has not yet been fully validated
    Unset,
    /// The block violates consensus rules
    Consensus,
    /// The block was cached as invalid (the original reason is not stored)
    CachedInvalid,
    /// The block header is invalid (proof of work or timestamp)
    InvalidHeader,
    /// The block data does not match its proof of work commitment
    Mutated,
    /// The previous block is not available
    MissingPrev,
    /// The previous block is invalid
    InvalidPrev,
    /// The block timestamp is too far in the future
    TimeFuture,
    /// The block header indicates insufficient work
    HeaderLowWork,
    /// A result code this library predates; carries the raw code
    Unknown(u32),
}

impl From<u32> for BlockValidationResult {
    fn from(value: u32) -> Self {
        match value {
            BLOCK_VALIDATION_RESULT_UNSET => BlockValidationResult::Unset,
            BLOCK_VALIDATION_RESULT_CONSENSUS => BlockValidationResult::Consensus,
            BLOCK_VALIDATION_RESULT_CACHED_INVALID => BlockValidationResult::CachedInvalid,
            BLOCK_VALIDATION_RESULT_INVALID_HEADER => BlockValidationResult::InvalidHeader,
            BLOCK_VALIDATION_RESULT_MUTATED => BlockValidationResult::Mutated,
            BLOCK_VALIDATION_RESULT_MISSING_PREV => BlockValidationResult::MissingPrev,
            BLOCK_VALIDATION_RESULT_INVALID_PREV => BlockValidationResult::InvalidPrev,
            BLOCK_VALIDATION_RESULT_TIME_FUTURE => BlockValidationResult::TimeFuture,
            BLOCK_VALIDATION_RESULT_HEADER_LOW_WORK => BlockValidationResult::HeaderLowWork,
            other => BlockValidationResult::Unknown(other),
        }
    }
}

impl From<BlockValidationResult> for u32 {
    fn from(result: BlockValidationResult) -> Self {
        match result {
            BlockValidationResult::Unset => BLOCK_VALIDATION_RESULT_UNSET,
            BlockValidationResult::Consensus => BLOCK_VALIDATION_RESULT_CONSENSUS,
            BlockValidationResult::CachedInvalid => BLOCK_VALIDATION_RESULT_CACHED_INVALID,
            BlockValidationResult::InvalidHeader => BLOCK_VALIDATION_RESULT_INVALID_HEADER,
            BlockValidationResult::Mutated => BLOCK_VALIDATION_RESULT_MUTATED,
            BlockValidationResult::MissingPrev => BLOCK_VALIDATION_RESULT_MISSING_PREV,
            BlockValidationResult::InvalidPrev => BLOCK_VALIDATION_RESULT_INVALID_PREV,
            BlockValidationResult::TimeFuture => BLOCK_VALIDATION_RESULT_TIME_FUTURE,
            BlockValidationResult::HeaderLowWork => BLOCK_VALIDATION_RESULT_HEADER_LOW_WORK,
            BlockValidationResult::Unknown(other) => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synchronization_state_round_trip() {
        let states = [
            SynchronizationState::InitReindex,
            SynchronizationState::InitDownload,
            SynchronizationState::PostInit,
        ];
        for state in states {
            let raw: u32 = state.into();
            assert_eq!(SynchronizationState::from(raw), state);
        }
    }

    #[test]
    fn test_synchronization_state_unknown_fallback() {
        let state = SynchronizationState::from(255);
        assert_eq!(state, SynchronizationState::Unknown(255));
        assert_eq!(u32::from(state), 255);
    }

    #[test]
    fn test_warning_round_trip() {
        let warnings = [
            Warning::UnknownNewRulesActivated,
            Warning::LargeWorkInvalidChain,
        ];
        for warning in warnings {
            let raw: u32 = warning.into();
            assert_eq!(Warning::from(raw), warning);
        }
    }

    #[test]
    fn test_warning_unknown_fallback() {
        assert_eq!(Warning::from(99), Warning::Unknown(99));
    }

    #[test]
    fn test_validation_mode_round_trip() {
        let modes = [
            ValidationMode::Valid,
            ValidationMode::Invalid,
            ValidationMode::InternalError,
        ];
        for mode in modes {
            let raw: u32 = mode.into();
            assert_eq!(ValidationMode::from(raw), mode);
        }
    }

    #[test]
    fn test_validation_mode_unknown_fallback() {
        assert_eq!(ValidationMode::from(77), ValidationMode::Unknown(77));
    }

    #[test]
    fn test_block_validation_result_round_trip() {
        let results = [
            BlockValidationResult::Unset,
            BlockValidationResult::Consensus,
            BlockValidationResult::CachedInvalid,
            BlockValidationResult::InvalidHeader,
            BlockValidationResult::Mutated,
            BlockValidationResult::MissingPrev,
            BlockValidationResult::InvalidPrev,
            BlockValidationResult::TimeFuture,
            BlockValidationResult::HeaderLowWork,
        ];
        for result in results {
            let raw: u32 = result.into();
            assert_eq!(BlockValidationResult::from(raw), result);
        }
    }

    #[test]
    fn test_block_validation_result_unknown_fallback() {
        let result = BlockValidationResult::from(99999);
        assert_eq!(result, BlockValidationResult::Unknown(99999));
        assert_eq!(u32::from(result), 99999);
    }

    #[test]
    fn test_result_codes_match_wire_values() {
        assert_eq!(u32::from(BlockValidationResult::Unset), 0);
        assert_eq!(u32::from(BlockValidationResult::Consensus), 1);
        assert_eq!(u32::from(BlockValidationResult::MissingPrev), 5);
        assert_eq!(u32::from(BlockValidationResult::HeaderLowWork), 8);
        assert_eq!(u32::from(SynchronizationState::PostInit), 2);
        assert_eq!(u32::from(ValidationMode::InternalError), 2);
        assert_eq!(u32::from(Warning::LargeWorkInvalidChain), 1);
    }
}
