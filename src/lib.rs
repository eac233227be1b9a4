//! Event dispatch in front of a block validation engine.
//!
//! This library multiplexes the lifecycle notifications and per-block
//! validation verdicts of a [`ValidationEngine`] to caller-supplied handler
//! sets, and decodes the packed outcome of submitting a block. Handler sets
//! are registered once on a [`ContextBuilder`]; a [`ChainstateManager`]
//! created over the resulting [`Context`] drives the engine and performs
//! the routing.

use std::fmt;

pub mod core;
pub mod engine;
pub mod notifications;
pub mod state;

/// A collection of errors emitted by this library
#[derive(Debug)]
pub enum DispatchError {
    Internal(String),
    InvalidOptions(String),
    BlockDeserialization(String),
    /// The engine raised a fatal error; the handle answers no further calls.
    Fatal(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::Internal(msg) => write!(f, "Internal error: {}", msg),
            DispatchError::InvalidOptions(msg) => write!(f, "Invalid options: {}", msg),
            DispatchError::BlockDeserialization(msg) => {
                write!(f, "Block deserialization failed: {}", msg)
            }
            DispatchError::Fatal(msg) => write!(f, "Fatal engine error: {}", msg),
        }
    }
}

impl std::error::Error for DispatchError {}

pub use crate::core::{Block, BlockHash, BlockTreeEntry};

pub use crate::engine::{
    BlockVerdict, ChainUpdate, InMemoryEngine, ManagerConfig, TipUpdate, ValidationEngine,
};

pub use crate::notifications::{
    BlockCheckedCallback, BlockConnectedCallback, BlockDisconnectedCallback, BlockTipCallback,
    BlockValidationResult, BlockValidationState, FatalErrorCallback, FlushErrorCallback,
    HeaderTipCallback, NotificationCallbackRegistry, Notifications, PowValidBlockCallback,
    ProgressCallback, SynchronizationState, ValidationCallbackRegistry, ValidationMode, Warning,
    WarningSetCallback, WarningUnsetCallback,
};

pub use crate::state::{
    ChainParams, ChainType, ChainstateManager, ChainstateManagerOptions, Context, ContextBuilder,
    ProcessBlockResult,
};
