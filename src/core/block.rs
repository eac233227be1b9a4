// Copyright (c) 2023-present The Bitcoin Kernel developers
// Licensed under the MIT License. See LICENSE file in the project root.

use std::fmt;
use std::sync::{Arc, OnceLock};

use sha2::{Digest, Sha256};

use crate::DispatchError;

/// Size of a serialized block header.
const HEADER_SIZE: usize = 80;

/// A type for a Block hash.
///
/// The bytes are kept in the engine's native representation and are never
/// reinterpreted by this layer.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct BlockHash {
    pub hash: [u8; 32],
}

impl BlockHash {
    /// Returns the raw 32 bytes of this hash.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.hash
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.hash))
    }
}

/// Shared backing storage for a deserialized block.
struct BlockData {
    raw: Vec<u8>,
    prev: BlockHash,
    time: u32,
    transaction_count: usize,
    hash: OnceLock<BlockHash>,
}

/// An immutable block containing a header and transactions.
///
/// Blocks are created by deserializing raw bytes. Cloning is cheap: clones
/// share the same backing storage.
#[derive(Clone)]
pub struct Block {
    data: Arc<BlockData>,
}

impl Block {
    /// Returns the hash of this block.
    ///
    /// This is the double SHA256 hash of the block header, which serves as
    /// the block's unique identifier. It is computed on first use and cached,
    /// so repeated calls return identical bytes.
    pub fn hash(&self) -> BlockHash {
        self.data
            .hash
            .get_or_init(|| {
                let header = &self.data.raw[..HEADER_SIZE];
                let digest = Sha256::digest(Sha256::digest(header));
                BlockHash { hash: digest.into() }
            })
            .clone()
    }

    /// Returns the hash of the previous block this block builds on.
    pub fn prev_hash(&self) -> BlockHash {
        self.data.prev.clone()
    }

    /// Returns the header timestamp.
    pub fn timestamp(&self) -> u32 {
        self.data.time
    }

    /// Returns the number of transactions in this block.
    pub fn transaction_count(&self) -> usize {
        self.data.transaction_count
    }

    /// Consensus encodes the block to wire format.
    pub fn consensus_encode(&self) -> Result<Vec<u8>, DispatchError> {
        Ok(self.data.raw.clone())
    }
}

impl TryFrom<Block> for Vec<u8> {
    type Error = DispatchError;

    fn try_from(block: Block) -> Result<Self, DispatchError> {
        block.consensus_encode()
    }
}

impl TryFrom<&[u8]> for Block {
    type Error = DispatchError;

    fn try_from(raw_block: &[u8]) -> Result<Self, Self::Error> {
        let transaction_count = check_structure(raw_block)?;
        let mut prev = [0u8; 32];
        prev.copy_from_slice(&raw_block[4..36]);
        let time = u32::from_le_bytes([
            raw_block[68],
            raw_block[69],
            raw_block[70],
            raw_block[71],
        ]);
        Ok(Block {
            data: Arc::new(BlockData {
                raw: raw_block.to_vec(),
                prev: BlockHash { hash: prev },
                time,
                transaction_count,
                hash: OnceLock::new(),
            }),
        })
    }
}

/// Walks the serialized transactions and verifies that the buffer is
/// consumed exactly. Returns the transaction count.
fn check_structure(raw: &[u8]) -> Result<usize, DispatchError> {
    if raw.len() < HEADER_SIZE + 1 {
        return Err(DispatchError::BlockDeserialization(
            "Block data shorter than a header.".to_string(),
        ));
    }
    let mut at = HEADER_SIZE;
    let (transaction_count, next) = read_compact_size(raw, at)?;
    at = next;
    if transaction_count == 0 {
        return Err(DispatchError::BlockDeserialization(
            "Block contains no transactions.".to_string(),
        ));
    }
    for _ in 0..transaction_count {
        at = walk_transaction(raw, at)?;
    }
    if at != raw.len() {
        return Err(DispatchError::BlockDeserialization(format!(
            "Block has {} trailing bytes.",
            raw.len() - at
        )));
    }
    Ok(transaction_count as usize)
}

fn walk_transaction(raw: &[u8], at: usize) -> Result<usize, DispatchError> {
    let mut at = take(raw, at, 4)?; // version
    let segwit = raw.len() >= at + 2 && raw[at] == 0x00 && raw[at + 1] == 0x01;
    if segwit {
        at += 2;
    }
    let (input_count, next) = read_compact_size(raw, at)?;
    at = next;
    if input_count == 0 {
        return Err(DispatchError::BlockDeserialization(
            "Transaction has no inputs.".to_string(),
        ));
    }
    for _ in 0..input_count {
        at = take(raw, at, 36)?; // outpoint
        let (script_len, next) = read_compact_size(raw, at)?;
        at = take(raw, next, script_len as usize)?;
        at = take(raw, at, 4)?; // sequence
    }
    let (output_count, next) = read_compact_size(raw, at)?;
    at = next;
    for _ in 0..output_count {
        at = take(raw, at, 8)?; // amount
        let (script_len, next) = read_compact_size(raw, at)?;
        at = take(raw, next, script_len as usize)?;
    }
    if segwit {
        for _ in 0..input_count {
            let (item_count, next) = read_compact_size(raw, at)?;
            at = next;
            for _ in 0..item_count {
                let (item_len, next) = read_compact_size(raw, at)?;
                at = take(raw, next, item_len as usize)?;
            }
        }
    }
    take(raw, at, 4) // lock time
}

fn take(raw: &[u8], at: usize, len: usize) -> Result<usize, DispatchError> {
    let end = at.checked_add(len).filter(|end| *end <= raw.len());
    end.ok_or_else(|| {
        DispatchError::BlockDeserialization("Block data ends mid-field.".to_string())
    })
}

fn read_compact_size(raw: &[u8], at: usize) -> Result<(u64, usize), DispatchError> {
    let eof = || DispatchError::BlockDeserialization("Block data ends mid-length.".to_string());
    let first = *raw.get(at).ok_or_else(eof)?;
    match first {
        0xfd => {
            let bytes = raw.get(at + 1..at + 3).ok_or_else(eof)?;
            Ok((u16::from_le_bytes([bytes[0], bytes[1]]) as u64, at + 3))
        }
        0xfe => {
            let bytes = raw.get(at + 1..at + 5).ok_or_else(eof)?;
            Ok((
                u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as u64,
                at + 5,
            ))
        }
        0xff => {
            let bytes = raw.get(at + 1..at + 9).ok_or_else(eof)?;
            let mut buf = [0u8; 8];
            buf.copy_from_slice(bytes);
            Ok((u64::from_le_bytes(buf), at + 9))
        }
        small => Ok((small as u64, at + 1)),
    }
}
