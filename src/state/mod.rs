// Copyright (c) 2023-present The Bitcoin Kernel developers
// Licensed under the MIT License. See LICENSE file in the project root.

pub mod chainstate;
pub mod context;

pub use chainstate::{ChainstateManager, ChainstateManagerOptions, ProcessBlockResult};
pub use context::{ChainParams, ChainType, Context, ContextBuilder};
