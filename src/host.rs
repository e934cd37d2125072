//! Seams to the world-generation host.
//!
//! The host owns chunk storage, the live world and the entity system; trees
//! only reach them through these traits. The `Memory*` types are small
//! in-memory stand-ins, useful for tooling and tests.

use crate::definition::TreeGrowth;
use glam::IVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type EntityId = u64;

/// A host entity and the block it is attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: EntityId,
    pub position: IVec3,
}

/// Per-call context the host passes to world generation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    /// Grow world-generated trees to exactly this many generations instead of
    /// a seed-derived mature stage.
    pub generations: Option<u32>,
}

/// Voxel access for one chunk being generated, plus whatever margin of its
/// neighbours the host exposes.
///
/// Positions are relative to the chunk's minimum corner. `None` is air.
pub trait ChunkView {
    /// Extent of one chunk in blocks.
    fn chunk_size(&self) -> IVec3;

    fn get_block(&self, pos: IVec3) -> Option<&str>;

    /// Writes `block` at `pos`. Returns `false` when `pos` is outside the view.
    fn set_block(&mut self, pos: IVec3, block: &str) -> bool;
}

/// Voxel access to the live world, in world coordinates. `None` is air.
pub trait WorldProvider {
    /// Seed string the world was generated from.
    fn seed(&self) -> &str;

    fn get_block(&self, pos: IVec3) -> Option<&str>;

    fn set_block(&mut self, pos: IVec3, block: &str);

    fn clear_block(&mut self, pos: IVec3);
}

/// Association between block positions and entities, and the growth
/// component those entities carry.
pub trait BlockEntityRegistry {
    fn entity_at(&self, pos: IVec3) -> Option<EntityRef>;

    fn link(&mut self, pos: IVec3, entity: EntityRef);

    fn tree_growth(&self, entity: EntityRef) -> Option<TreeGrowth>;

    fn set_tree_growth(&mut self, entity: EntityRef, growth: TreeGrowth);
}

/// A [`ChunkView`] over a `HashMap`.
#[derive(Clone, Debug)]
pub struct MemoryChunkView {
    chunk_size: IVec3,
    margin: i32,
    blocks: HashMap<IVec3, String>,
}

impl MemoryChunkView {
    /// A view covering exactly one chunk.
    pub fn new(chunk_size: IVec3) -> Self {
        Self {
            chunk_size,
            margin: 0,
            blocks: HashMap::new(),
        }
    }

    /// Extends the writable area by `margin` blocks on each horizontal side.
    pub fn with_margin(mut self, margin: i32) -> Self {
        self.margin = margin.max(0);
        self
    }

    pub fn contains(&self, pos: IVec3) -> bool {
        let min = IVec3::new(-self.margin, 0, -self.margin);
        let max = self.chunk_size + IVec3::new(self.margin, 0, self.margin);
        pos.cmpge(min).all() && pos.cmplt(max).all()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IVec3, &str)> {
        self.blocks.iter().map(|(pos, uri)| (*pos, uri.as_str()))
    }
}

impl ChunkView for MemoryChunkView {
    fn chunk_size(&self) -> IVec3 {
        self.chunk_size
    }

    fn get_block(&self, pos: IVec3) -> Option<&str> {
        self.blocks.get(&pos).map(String::as_str)
    }

    fn set_block(&mut self, pos: IVec3, block: &str) -> bool {
        if !self.contains(pos) {
            return false;
        }
        self.blocks.insert(pos, block.to_string());
        true
    }
}

/// An unbounded [`WorldProvider`] over a `HashMap`.
#[derive(Clone, Debug, Default)]
pub struct MemoryWorld {
    seed: String,
    blocks: HashMap<IVec3, String>,
}

impl MemoryWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = seed.into();
        self
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IVec3, &str)> {
        self.blocks.iter().map(|(pos, uri)| (*pos, uri.as_str()))
    }
}

impl WorldProvider for MemoryWorld {
    fn seed(&self) -> &str {
        &self.seed
    }

    fn get_block(&self, pos: IVec3) -> Option<&str> {
        self.blocks.get(&pos).map(String::as_str)
    }

    fn set_block(&mut self, pos: IVec3, block: &str) {
        self.blocks.insert(pos, block.to_string());
    }

    fn clear_block(&mut self, pos: IVec3) {
        self.blocks.remove(&pos);
    }
}

/// A [`BlockEntityRegistry`] that also hands out entity IDs.
#[derive(Clone, Debug, Default)]
pub struct MemoryEntityRegistry {
    next_id: EntityId,
    links: HashMap<IVec3, EntityRef>,
    growth: HashMap<EntityId, TreeGrowth>,
}

impl MemoryEntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh, unlinked entity at `position`.
    pub fn spawn(&mut self, position: IVec3) -> EntityRef {
        self.next_id += 1;
        EntityRef {
            id: self.next_id,
            position,
        }
    }
}

impl BlockEntityRegistry for MemoryEntityRegistry {
    fn entity_at(&self, pos: IVec3) -> Option<EntityRef> {
        self.links.get(&pos).copied()
    }

    fn link(&mut self, pos: IVec3, entity: EntityRef) {
        self.links.insert(pos, entity);
    }

    fn tree_growth(&self, entity: EntityRef) -> Option<TreeGrowth> {
        self.growth.get(&entity.id).cloned()
    }

    fn set_tree_growth(&mut self, entity: EntityRef, growth: TreeGrowth) {
        self.growth.insert(entity.id, growth);
    }
}
