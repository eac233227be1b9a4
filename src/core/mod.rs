// Copyright (c) 2023-present The Bitcoin Kernel developers
// Licensed under the MIT License. See LICENSE file in the project root.

pub mod block;
pub mod block_tree_entry;

pub use block::{Block, BlockHash};
pub use block_tree_entry::BlockTreeEntry;
