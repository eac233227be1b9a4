use crate::BlockHash;

/// An entry in the best-known header tree, as reported by the engine.
///
/// Entries are produced by the engine and passed into callbacks by
/// reference; a callback borrows the entry for the duration of the
/// invocation only. The embedded hash belongs to the entry; receivers that
/// want to keep it take an owned copy via [`BlockTreeEntry::block_hash`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTreeEntry {
    height: i32,
    hash: BlockHash,
}

impl BlockTreeEntry {
    pub fn new(height: i32, hash: BlockHash) -> Self {
        BlockTreeEntry { height, hash }
    }

    /// Returns the height associated with this entry.
    pub fn height(&self) -> i32 {
        self.height
    }

    /// Returns an owned copy of the block hash associated with this entry.
    pub fn block_hash(&self) -> BlockHash {
        self.hash.clone()
    }
}
