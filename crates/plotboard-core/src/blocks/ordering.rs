//! Reordering of a card's block list.
//!
//! Indices are positions in the slice, which is kept sorted by `order`.

use super::{Block, BlockId};
use crate::blocks::template::required_body_block_id_in;
use crate::error::{OrderingError, OrderingResult};

/// Stable-sort by existing order (ties keep their original position), then
/// rewrite orders to `0..n`.
pub fn normalize_order(blocks: &mut [Block]) {
    blocks.sort_by_key(|b| b.order);
    renumber(blocks);
}

fn renumber(blocks: &mut [Block]) {
    for (i, block) in blocks.iter_mut().enumerate() {
        block.order = i as u32;
    }
}

fn check_index(index: usize, len: usize) -> OrderingResult<()> {
    if index < len {
        Ok(())
    } else {
        Err(OrderingError::IndexOutOfRange { index, len })
    }
}

fn index_of(blocks: &[Block], id: &BlockId) -> OrderingResult<usize> {
    blocks
        .iter()
        .position(|b| &b.id == id)
        .ok_or_else(|| OrderingError::UnknownBlock(id.clone()))
}

/// Move the block at `from` so it ends up at `to`, in either direction.
pub fn move_by_index(blocks: &mut Vec<Block>, from: usize, to: usize) -> OrderingResult<()> {
    check_index(from, blocks.len())?;
    check_index(to, blocks.len())?;
    let block = blocks.remove(from);
    blocks.insert(to, block);
    renumber(blocks);
    Ok(())
}

/// Move `source_id` to the position currently held by `target_id`.
pub fn move_by_id(
    blocks: &mut Vec<Block>,
    source_id: &BlockId,
    target_id: &BlockId,
) -> OrderingResult<()> {
    let from = index_of(blocks, source_id)?;
    let to = index_of(blocks, target_id)?;
    move_by_index(blocks, from, to)
}

/// Insert `block` at `index` (clamped to the end of the list).
pub fn insert_block(blocks: &mut Vec<Block>, block: Block, index: usize) {
    let index = index.min(blocks.len());
    blocks.insert(index, block);
    renumber(blocks);
}

/// Remove a block. The card's sole body block is protected.
pub fn remove_block(blocks: &mut Vec<Block>, id: &BlockId) -> OrderingResult<Block> {
    let index = index_of(blocks, id)?;
    if required_body_block_id_in(blocks) == Some(id) {
        return Err(OrderingError::RequiredBlock(id.clone()));
    }
    let removed = blocks.remove(index);
    renumber(blocks);
    Ok(removed)
}
