use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    Block, BlockHash, BlockTreeEntry, BlockValidationResult, ChainParams, DispatchError,
    Notifications, SynchronizationState,
};

use super::{BlockVerdict, ChainUpdate, ManagerConfig, TipUpdate, ValidationEngine};

/// Maximum allowed drift of a block timestamp into the future, in seconds.
const MAX_FUTURE_BLOCK_TIME: u64 = 2 * 60 * 60;

struct Node {
    height: i32,
    prev: BlockHash,
    /// The genesis node has no block; it is seeded, never submitted.
    block: Option<Block>,
}

#[derive(Default)]
struct ChainState {
    nodes: HashMap<BlockHash, Node>,
    /// Active chain, genesis first.
    active: Vec<BlockHash>,
}

impl ChainState {
    /// Makes `tip` the active tip. Returns the hashes to disconnect
    /// (old tip first) and to connect (fork point upwards).
    fn activate(&mut self, tip: BlockHash) -> (Vec<BlockHash>, Vec<BlockHash>) {
        let mut connect = Vec::new();
        let mut cursor = tip;
        let fork_pos = loop {
            if let Some(pos) = self.active.iter().position(|hash| *hash == cursor) {
                break pos;
            }
            let prev = self.nodes[&cursor].prev.clone();
            connect.push(cursor);
            cursor = prev;
        };
        let disconnect: Vec<BlockHash> = self.active.drain(fork_pos + 1..).rev().collect();
        connect.reverse();
        self.active.extend(connect.iter().cloned());
        (disconnect, connect)
    }

    fn tip_height(&self) -> i32 {
        let tip = self.active.last().expect("active chain is seeded");
        self.nodes[tip].height
    }

    fn entry(&self, hash: &BlockHash) -> BlockTreeEntry {
        BlockTreeEntry::new(self.nodes[hash].height, hash.clone())
    }

    fn stored_block(&self, hash: &BlockHash) -> Block {
        self.nodes[hash]
            .block
            .clone()
            .expect("non-genesis node has a block")
    }
}

/// A deterministic in-memory engine used by the demo binary and the test
/// suite.
///
/// It applies structural rules only: blocks must deserialize, link to a
/// known previous block and carry a plausible timestamp. The heaviest known
/// chain becomes active, with disconnect-before-connect event streams on
/// reorganizations. Consensus validation is out of its scope.
pub struct InMemoryEngine {
    state: Mutex<ChainState>,
    notifications: Mutex<Option<Notifications>>,
}

impl InMemoryEngine {
    pub fn new() -> Self {
        InMemoryEngine {
            state: Mutex::new(ChainState::default()),
            notifications: Mutex::new(None),
        }
    }

    fn too_far_in_future(timestamp: u32) -> bool {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        timestamp as u64 > now + MAX_FUTURE_BLOCK_TIME
    }
}

impl Default for InMemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationEngine for InMemoryEngine {
    fn start(
        &self,
        _config: &ManagerConfig,
        chain: &ChainParams,
        notifications: Notifications,
    ) -> Result<(), DispatchError> {
        let genesis = chain.genesis_block_hash();
        let mut state = self.state.lock().unwrap();
        *state = ChainState::default();
        state.nodes.insert(
            genesis.clone(),
            Node {
                height: 0,
                prev: BlockHash { hash: [0u8; 32] },
                block: None,
            },
        );
        state.active.push(genesis);
        *self.notifications.lock().unwrap() = Some(notifications);
        log::debug!("in-memory engine seeded at {:?} genesis", chain.chain_type());
        Ok(())
    }

    fn check_block(&self, block: &Block) -> BlockVerdict {
        let hash = block.hash();
        let mut state = self.state.lock().unwrap();
        if state.nodes.contains_key(&hash) {
            log::debug!("block {} already known", hash);
            return BlockVerdict::duplicate();
        }
        let Some(parent) = state.nodes.get(&block.prev_hash()) else {
            return BlockVerdict::rejected(BlockValidationResult::MissingPrev);
        };
        if Self::too_far_in_future(block.timestamp()) {
            return BlockVerdict::rejected(BlockValidationResult::TimeFuture);
        }

        let height = parent.height + 1;
        state.nodes.insert(
            hash.clone(),
            Node {
                height,
                prev: block.prev_hash(),
                block: Some(block.clone()),
            },
        );
        let entry = state.entry(&hash);
        let mut verdict = BlockVerdict::accepted(entry.clone());

        if height > state.tip_height() {
            let (disconnect, connect) = state.activate(hash.clone());
            for old in disconnect {
                verdict.updates.push(ChainUpdate::Disconnected {
                    block: state.stored_block(&old),
                    entry: state.entry(&old),
                });
            }
            for new in connect {
                verdict.updates.push(ChainUpdate::Connected {
                    block: state.stored_block(&new),
                    entry: state.entry(&new),
                });
            }
            verdict.tip = Some(TipUpdate {
                state: SynchronizationState::PostInit,
                entry,
                verification_progress: 1.0,
            });
            if let Some(notifications) = &*self.notifications.lock().unwrap() {
                notifications.header_tip(
                    SynchronizationState::PostInit,
                    height as i64,
                    block.timestamp() as i64,
                    false,
                );
            }
        }
        verdict
    }

    fn import_blocks(&self) -> Result<(), DispatchError> {
        if let Some(notifications) = &*self.notifications.lock().unwrap() {
            notifications.progress("Importing blocks", 0, true);
            notifications.progress("Importing blocks", 100, true);
        }
        Ok(())
    }
}
