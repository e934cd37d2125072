//! Interpreter that converts a grown axion into a [`TreeStructure`].
//!
//! The entry point is [`TreeInterpreter`]. Configure it with a [`TurtleConfig`],
//! register symbol-to-operation mappings via [`TreeInterpreter::set_op`] and
//! [`TreeInterpreter::populate_structural_symbols`], then call
//! [`TreeInterpreter::build_structure`] with a [`symbios::SymbiosState`].

use crate::error::TreeError;
use crate::structure::{TreeBlock, TreeStructure};
use crate::turtle::{BlockGeneration, TreeOp, TreeTurtleState};
use glam::{IVec3, Vec3};
use serde::{Deserialize, Serialize};
use symbios::{SymbiosState, SymbolTable};

/// Symbols that steer the turtle instead of placing blocks.
pub const STRUCTURAL_SYMBOLS: [char; 6] = ['[', ']', '+', '-', '&', '^'];

/// Configuration for tree interpretation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurtleConfig {
    /// Rotation (in radians) for `+`/`-` when the symbol carries no parameter.
    pub default_turn: f32,
    /// Rotation (in radians) applied by `&`/`^` when no parameter is given.
    pub pitch_angle: f32,
    /// Maximum stack depth for push/pop operations.
    pub max_stack_depth: usize,
}

impl Default for TurtleConfig {
    fn default() -> Self {
        Self {
            default_turn: 137.5f32.to_radians(),
            pitch_angle: 45.0f32.to_radians(),
            max_stack_depth: 1024,
        }
    }
}

/// Interprets L-System output to build a [`TreeStructure`].
#[derive(Clone, Debug)]
pub struct TreeInterpreter {
    op_map: Vec<TreeOp>,
    config: TurtleConfig,
}

impl TreeInterpreter {
    /// Creates a new interpreter with the given configuration and an empty symbol map.
    pub fn new(config: TurtleConfig) -> Self {
        Self {
            op_map: Vec::new(),
            config,
        }
    }

    /// Replaces the entire symbol-to-operation map in one step (builder pattern).
    ///
    /// `map` is indexed by symbol ID as returned by [`symbios::SymbolTable`].
    pub fn with_map(mut self, map: Vec<TreeOp>) -> Self {
        self.op_map = map;
        self
    }

    pub fn config(&self) -> &TurtleConfig {
        &self.config
    }

    /// Assigns a single [`TreeOp`] to a symbol ID.
    ///
    /// The map is grown automatically when `sym_id` exceeds its current length;
    /// gaps are filled with [`TreeOp::Unmapped`].
    pub fn set_op(&mut self, sym_id: u16, op: TreeOp) {
        let idx = sym_id as usize;
        if idx >= self.op_map.len() {
            self.op_map.resize(idx + 1, TreeOp::Unmapped);
        }
        self.op_map[idx] = op;
    }

    /// Registers the turtle-steering symbols (`[`, `]`, `+`, `-`, `&`, `^`).
    ///
    /// Symbols that are not present in the interner are skipped.
    pub fn populate_structural_symbols(&mut self, interner: &SymbolTable) {
        let mappings = [
            ("+", TreeOp::Turn(1.0)),
            ("-", TreeOp::Turn(-1.0)),
            ("&", TreeOp::Pitch(1.0)),
            ("^", TreeOp::Pitch(-1.0)),
            ("[", TreeOp::Push),
            ("]", TreeOp::Pop),
        ];

        for (sym, op) in mappings {
            if let Some(id) = interner.resolve_id(sym) {
                self.set_op(id, op);
            }
        }
    }

    /// Interprets the full L-System `state` and returns the voxels it places.
    ///
    /// Walks every symbol in `state` once, in order. The turtle starts at the
    /// origin heading `+Y`.
    ///
    /// # Errors
    ///
    /// A `]` with nothing to pop, a `[` beyond `max_stack_depth`, or a symbol
    /// with no registered operation all mean the species table is broken, and
    /// are reported instead of skipped.
    pub fn build_structure(&self, state: &SymbiosState) -> Result<TreeStructure, TreeError> {
        let mut structure = TreeStructure::new();
        let mut turtle = TreeTurtleState::default();
        let mut stack: Vec<TreeTurtleState> = Vec::new();

        for i in 0..state.len() {
            let view = match state.get_view(i) {
                Some(v) => v,
                None => break,
            };

            let op = self
                .op_map
                .get(view.sym as usize)
                .unwrap_or(&TreeOp::Unmapped);

            let p = |idx: usize, def: f32| -> f32 {
                view.params.get(idx).map(|&x| x as f32).unwrap_or(def)
            };

            match op {
                TreeOp::Generate(rule) => {
                    generate(&mut structure, &turtle, rule);
                    turtle.advance(rule.advance());
                }
                TreeOp::Turn(s) => turtle
                    .rotate_local_y(p(0, self.config.default_turn.to_degrees()).to_radians() * s),
                TreeOp::Pitch(s) => turtle
                    .rotate_local_x(p(0, self.config.pitch_angle.to_degrees()).to_radians() * s),
                TreeOp::Push => {
                    if stack.len() >= self.config.max_stack_depth {
                        return Err(TreeError::StackOverflow {
                            index: i,
                            max_depth: self.config.max_stack_depth,
                        });
                    }
                    stack.push(turtle);
                }
                TreeOp::Pop => {
                    turtle = stack.pop().ok_or(TreeError::UnbalancedPop { index: i })?;
                }
                TreeOp::Unmapped => {
                    return Err(TreeError::UnmappedSymbolId {
                        id: view.sym as u16,
                        index: i,
                    });
                }
            }
        }

        Ok(structure)
    }
}

fn generate(structure: &mut TreeStructure, turtle: &TreeTurtleState, rule: &BlockGeneration) {
    match rule {
        BlockGeneration::Default { block, .. } => {
            structure.place(turtle.voxel(), block);
        }
        BlockGeneration::Surround {
            core,
            shell,
            radius,
            length,
            max_z,
            ..
        } => {
            place_shell(structure, turtle, shell, *radius, *length, *max_z);
            structure.place(turtle.voxel(), core);
        }
        BlockGeneration::Advance { .. } => {}
    }
}

/// Fills every voxel of the surround volume that passes the local-Z clip.
fn place_shell(
    structure: &mut TreeStructure,
    turtle: &TreeTurtleState,
    shell: &TreeBlock,
    radius: f32,
    length: Option<f32>,
    max_z: Option<f32>,
) {
    let reach = length.unwrap_or(0.0).max(0.0);
    let start = turtle.position;
    let end = start + turtle.heading() * reach;
    let min = (start.min(end) - Vec3::splat(radius)).floor().as_ivec3();
    let max = (start.max(end) + Vec3::splat(radius)).ceil().as_ivec3();

    for x in min.x..=max.x {
        for y in min.y..=max.y {
            for z in min.z..=max.z {
                let cell = IVec3::new(x, y, z);
                let local = turtle.to_local(cell.as_vec3());
                if max_z.is_some_and(|bound| local.z > bound) {
                    continue;
                }
                // Distance to the capsule's axis segment, which collapses to a
                // point for spherical volumes.
                let axis_point = Vec3::new(0.0, local.y.clamp(0.0, reach), 0.0);
                if local.distance(axis_point) <= radius {
                    structure.place(cell, shell);
                }
            }
        }
    }
}
