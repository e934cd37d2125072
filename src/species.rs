//! The maple and grand-maple species.
//!
//! Both share one grammar shape and differ only in block URIs, segment
//! lengths and branch angles, captured by [`MapleProfile`].
//!
//! | Symbol | Rewrites to                                  | Places                              |
//! |--------|----------------------------------------------|-------------------------------------|
//! | `g`    | `Tt`                                         | generated sapling                   |
//! | `s`    | `Tt`                                         | planted sapling                     |
//! | `t`    | `+(a)[&Mb]Wt` or `Wt`                        | leaf ball, r = 2                    |
//! | `T`    | `TN` (0.7)                                   | trunk                               |
//! | `N`    |                                              | trunk                               |
//! | `W`    |                                              | branch in a leaf ball, r = 2        |
//! | `b`    | `Bb` (0.8)                                   | leaf half-ball, r = 2.6             |
//! | `B`    |                                              | branch in a leaf capsule 1.1 × 3.5  |
//! | `M`    |                                              | nothing (advance)                   |

use crate::axion::Axion;
use crate::definition::TreeDefinition;
use crate::error::TreeError;
use crate::grammar::{Grammar, ReplacementRule};
use crate::structure::TreeBlock;
use crate::turtle::BlockGeneration;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

pub const MAPLE_ID: &str = "PlantPack:maple";
pub const GRAND_MAPLE_ID: &str = "PlantPack:grandMaple";

/// A trunk tip keeps forcing side branches until this many exist.
pub const MIN_BRANCHES: usize = 2;

/// Symbols the trunk-tip generators can emit.
const BRANCH_STEP_ALPHABET: &str = "+[&Mb]Wt";

/// Species constants for a maple-shaped tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapleProfile {
    pub id: String,
    pub sapling_block: String,
    /// Sapling placed by world generation rather than by a player.
    pub generated_block: String,
    pub leaf_block: String,
    pub trunk_block: String,
    pub branch_block: String,
    pub trunk_advance: f32,
    pub branch_advance: f32,
    /// Turn between consecutive branches, in degrees.
    pub branch_angles: RangeInclusive<i32>,
    /// Turn used while the minimum branch count is being forced.
    pub forced_branch_angles: RangeInclusive<i32>,
    pub growth_rate: f32,
}

impl Default for MapleProfile {
    fn default() -> Self {
        Self::maple()
    }
}

impl MapleProfile {
    pub fn maple() -> Self {
        Self {
            id: MAPLE_ID.to_string(),
            sapling_block: "PlantPack:MapleSapling".to_string(),
            generated_block: "PlantPack:MapleSaplingGenerated".to_string(),
            leaf_block: "PlantPack:MapleLeaf".to_string(),
            trunk_block: "PlantPack:MapleTrunk".to_string(),
            branch_block: "PlantPack:MapleBranch".to_string(),
            trunk_advance: 0.3,
            branch_advance: 0.2,
            branch_angles: 125..=152,
            forced_branch_angles: 130..=147,
            growth_rate: 1.5,
        }
    }

    pub fn grand_maple() -> Self {
        Self {
            id: GRAND_MAPLE_ID.to_string(),
            sapling_block: "PlantPack:GrandMapleSapling".to_string(),
            generated_block: "PlantPack:GrandMapleSaplingGenerated".to_string(),
            leaf_block: "PlantPack:GrandMapleLeaf".to_string(),
            trunk_block: "PlantPack:GrandMapleTrunk".to_string(),
            branch_block: "PlantPack:GrandMapleBranch".to_string(),
            trunk_advance: 0.4,
            branch_advance: 0.6,
            branch_angles: 105..=172,
            forced_branch_angles: 130..=147,
            growth_rate: 1.5,
        }
    }

    /// The grammar: saplings sprout a trunk, the trunk tip keeps stacking
    /// branch junctions and the branch tips lengthen.
    pub fn grammar(&self) -> Grammar {
        let sapling = ReplacementRule::new().with_fixed(1.0, "Tt");

        let angles = self.branch_angles.clone();
        let forced = self.forced_branch_angles.clone();
        let trunk_top = ReplacementRule::new()
            .with_generator(0.6, BRANCH_STEP_ALPHABET, move |_, rng| {
                branch_step(pick_angle(&angles, rng))
            })
            .with_generator(0.4, BRANCH_STEP_ALPHABET, move |axion, rng| {
                if axion.count('b') < MIN_BRANCHES {
                    branch_step(pick_angle(&forced, rng))
                } else {
                    "Wt".to_string()
                }
            });

        Grammar::new()
            .with_rule('s', sapling.clone())
            .with_rule('g', sapling)
            .with_rule('t', trunk_top)
            .with_rule('T', ReplacementRule::new().with_fixed(0.7, "TN"))
            .with_rule('b', ReplacementRule::new().with_fixed(0.8, "Bb"))
    }

    pub fn block_table(&self) -> BTreeMap<char, BlockGeneration> {
        let leaf = TreeBlock::foliage(&self.leaf_block);
        let trunk = TreeBlock::trunk(&self.trunk_block);
        let branch = TreeBlock::branch(&self.branch_block);
        let (ta, ba) = (self.trunk_advance, self.branch_advance);

        BTreeMap::from([
            (
                's',
                BlockGeneration::default_block(TreeBlock::sapling(&self.sapling_block), ta),
            ),
            (
                'g',
                BlockGeneration::default_block(TreeBlock::sapling(&self.generated_block), ta),
            ),
            // Trunk
            ('t', BlockGeneration::surround(leaf.clone(), leaf.clone(), ta, 2.0)),
            ('T', BlockGeneration::default_block(trunk.clone(), ta)),
            ('N', BlockGeneration::default_block(trunk, ta)),
            ('W', BlockGeneration::surround(branch.clone(), leaf.clone(), ta, 2.0)),
            // Branches
            (
                'b',
                BlockGeneration::surround(leaf.clone(), leaf.clone(), ba, 2.6).with_max_z(0.0),
            ),
            (
                'B',
                BlockGeneration::elongated(branch, leaf, ba, 1.1, 3.5).with_max_z(0.0),
            ),
            ('M', BlockGeneration::advance_only(ba)),
        ])
    }

    /// Blocks that still count as part of a grown tree.
    pub fn tree_blocks(&self) -> Vec<TreeBlock> {
        vec![
            TreeBlock::trunk(&self.trunk_block),
            TreeBlock::branch(&self.branch_block),
            TreeBlock::foliage(&self.leaf_block),
        ]
    }

    pub fn build(&self) -> Result<TreeDefinition, TreeError> {
        TreeDefinition::new(
            self.id.clone(),
            Axion::new("g"),
            self.grammar(),
            self.block_table(),
            self.tree_blocks(),
            self.growth_rate,
        )
    }
}

/// The maple species.
pub fn maple() -> Result<TreeDefinition, TreeError> {
    MapleProfile::maple().build()
}

/// The grand-maple species: longer segments and a wider branch fan.
pub fn grand_maple() -> Result<TreeDefinition, TreeError> {
    MapleProfile::grand_maple().build()
}

fn branch_step(degrees: i32) -> String {
    format!("+({degrees})[&Mb]Wt")
}

fn pick_angle(range: &RangeInclusive<i32>, rng: &mut dyn RngCore) -> i32 {
    if range.is_empty() {
        *range.start()
    } else {
        rng.random_range(range.clone())
    }
}
