//! Turtle state and operations for voxel tree interpretation.
//!
//! Convention: +Y is world up. A fresh turtle sits at the origin with the
//! identity rotation, so its heading (local Y) points straight up.

use crate::structure::TreeBlock;
use glam::{IVec3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Position and orientation of the tree-building turtle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeTurtleState {
    /// Current position in tree-local space, in blocks.
    pub position: Vec3,

    /// Current orientation.
    pub rotation: Quat,
}

impl Default for TreeTurtleState {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl TreeTurtleState {
    /// Returns the growth direction (local Y-axis) in tree space.
    pub fn heading(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    /// Returns the turtle's local right direction (X-axis) in tree space.
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Returns the turtle's local forward direction (Z-axis) in tree space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// The voxel containing the turtle (components rounded to nearest).
    pub fn voxel(&self) -> IVec3 {
        self.position.round().as_ivec3()
    }

    /// Moves `distance` blocks along the heading.
    pub fn advance(&mut self, distance: f32) {
        self.position += self.heading() * distance;
    }

    /// Maps a tree-space point into the turtle's local frame.
    pub fn to_local(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.position)
    }

    /// Rotates the turtle around its local X axis by `angle` radians (pitch).
    pub fn rotate_local_x(&mut self, angle: f32) {
        self.rotation *= Quat::from_axis_angle(Vec3::X, angle);
    }

    /// Rotates the turtle around its local Y axis by `angle` radians (turn
    /// around the heading).
    pub fn rotate_local_y(&mut self, angle: f32) {
        self.rotation *= Quat::from_axis_angle(Vec3::Y, angle);
    }
}

/// How a symbol turns into blocks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum BlockGeneration {
    /// Place `block` at the turtle, then advance.
    Default { block: TreeBlock, advance: f32 },

    /// Place `core` at the turtle and `shell` in the volume around it, then
    /// advance.
    ///
    /// The volume is a sphere of `radius`, or with `length` a capsule of
    /// `radius` reaching `length` blocks along the heading. Cells whose
    /// local Z is above `max_z` are skipped.
    Surround {
        core: TreeBlock,
        shell: TreeBlock,
        advance: f32,
        radius: f32,
        length: Option<f32>,
        max_z: Option<f32>,
    },

    /// Move without placing anything.
    Advance { advance: f32 },
}

impl BlockGeneration {
    pub fn default_block(block: TreeBlock, advance: f32) -> Self {
        Self::Default { block, advance }
    }

    /// A spherical `Surround` with no clipping.
    pub fn surround(core: TreeBlock, shell: TreeBlock, advance: f32, radius: f32) -> Self {
        Self::Surround {
            core,
            shell,
            advance,
            radius,
            length: None,
            max_z: None,
        }
    }

    /// A capsule-shaped `Surround` stretched `length` blocks along the heading.
    pub fn elongated(
        core: TreeBlock,
        shell: TreeBlock,
        advance: f32,
        radius: f32,
        length: f32,
    ) -> Self {
        Self::Surround {
            core,
            shell,
            advance,
            radius,
            length: Some(length),
            max_z: None,
        }
    }

    pub fn advance_only(advance: f32) -> Self {
        Self::Advance { advance }
    }

    /// Sets the local-Z clip of a `Surround`; other variants are unchanged.
    pub fn with_max_z(mut self, bound: f32) -> Self {
        if let Self::Surround { max_z, .. } = &mut self {
            *max_z = Some(bound);
        }
        self
    }

    pub fn advance(&self) -> f32 {
        match self {
            Self::Default { advance, .. }
            | Self::Surround { advance, .. }
            | Self::Advance { advance } => *advance,
        }
    }

    /// Blocks this rule can place.
    pub fn blocks(&self) -> Vec<&TreeBlock> {
        match self {
            Self::Default { block, .. } => vec![block],
            Self::Surround { core, shell, .. } => vec![core, shell],
            Self::Advance { .. } => Vec::new(),
        }
    }
}

/// Operations that can be performed by the tree turtle.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeOp {
    /// Emit blocks according to a species rule.
    Generate(BlockGeneration),
    /// Rotate around the heading (`+`). Param: `(degrees)`.
    Turn(f32),
    /// Rotate around local X (`&`). Param: `(degrees)`.
    Pitch(f32),
    /// Save the turtle state onto the stack (`[`).
    Push,
    /// Restore the most recently pushed turtle state (`]`).
    Pop,
    /// Placeholder for symbol IDs with no registered meaning.
    Unmapped,
}
