use glam::IVec3;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The role a block plays in a tree.
///
/// When two placements land on the same voxel, the higher kind wins, so a
/// leaf shell never hides a branch and a branch never hides the trunk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TreeBlockKind {
    Foliage,
    Branch,
    Trunk,
    Sapling,
}

/// A block type placed by a tree, identified by its block URI.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeBlock {
    pub uri: String,
    pub kind: TreeBlockKind,
}

impl TreeBlock {
    pub fn new(uri: impl Into<String>, kind: TreeBlockKind) -> Self {
        Self {
            uri: uri.into(),
            kind,
        }
    }

    pub fn foliage(uri: impl Into<String>) -> Self {
        Self::new(uri, TreeBlockKind::Foliage)
    }

    pub fn branch(uri: impl Into<String>) -> Self {
        Self::new(uri, TreeBlockKind::Branch)
    }

    pub fn trunk(uri: impl Into<String>) -> Self {
        Self::new(uri, TreeBlockKind::Trunk)
    }

    pub fn sapling(uri: impl Into<String>) -> Self {
        Self::new(uri, TreeBlockKind::Sapling)
    }
}

/// Sparse voxel body of a tree, keyed by offset from the tree's base.
///
/// This is the "phenotype" of a grown axion. It is independent of any world
/// and is written into chunks or the live world by the tree definition.
///
/// Serializes as a list of `(offset, block)` pairs sorted by offset, so
/// formats with string-only map keys can hold it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeStructure {
    #[serde(with = "voxel_list")]
    voxels: HashMap<IVec3, TreeBlock>,
}

impl TreeStructure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `block` at `pos` unless a block of a higher kind is already there.
    ///
    /// Returns whether the voxel now holds `block`.
    pub fn place(&mut self, pos: IVec3, block: &TreeBlock) -> bool {
        match self.voxels.get_mut(&pos) {
            Some(existing) if existing.kind > block.kind => false,
            Some(existing) => {
                if existing != block {
                    existing.clone_from(block);
                }
                true
            }
            None => {
                self.voxels.insert(pos, block.clone());
                true
            }
        }
    }

    pub fn get(&self, pos: IVec3) -> Option<&TreeBlock> {
        self.voxels.get(&pos)
    }

    pub fn len(&self) -> usize {
        self.voxels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voxels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (IVec3, &TreeBlock)> {
        self.voxels.iter().map(|(pos, block)| (*pos, block))
    }

    /// Number of voxels holding a block of `kind`.
    pub fn count_kind(&self, kind: TreeBlockKind) -> usize {
        self.voxels.values().filter(|b| b.kind == kind).count()
    }

    /// Inclusive min/max corners of the occupied voxels.
    pub fn bounds(&self) -> Option<(IVec3, IVec3)> {
        let mut positions = self.voxels.keys().copied();
        let first = positions.next()?;
        Some(positions.fold((first, first), |(min, max), p| (min.min(p), max.max(p))))
    }
}

mod voxel_list {
    use super::TreeBlock;
    use glam::IVec3;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::HashMap;

    pub fn serialize<S: Serializer>(
        voxels: &HashMap<IVec3, TreeBlock>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut list: Vec<(&IVec3, &TreeBlock)> = voxels.iter().collect();
        list.sort_by_key(|(pos, _)| pos.to_array());
        list.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<HashMap<IVec3, TreeBlock>, D::Error> {
        let list = Vec::<(IVec3, TreeBlock)>::deserialize(deserializer)?;
        Ok(list.into_iter().collect())
    }
}
