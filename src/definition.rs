//! [`TreeDefinition`]: one species' grammar and block table, plus the plant
//! lifecycle built on them.
//!
//! A definition is validated once at construction and is read-only afterwards.
//! Every call derives its own random source from the plant's seed, so a single
//! definition can serve any number of world-generation threads.

use crate::axion::Axion;
use crate::error::TreeError;
use crate::grammar::Grammar;
use crate::host::{BlockEntityRegistry, ChunkView, EntityRef, GenerationParameters, WorldProvider};
use crate::interpreter::{STRUCTURAL_SYMBOLS, TreeInterpreter, TurtleConfig};
use crate::structure::{TreeBlock, TreeBlockKind, TreeStructure};
use crate::turtle::{BlockGeneration, TreeOp};
use glam::IVec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;
use symbios::SymbolTable;

/// Stages a world-generated tree is grown to when the host does not pick one.
pub const DEFAULT_MATURE_GENERATIONS: RangeInclusive<u32> = 6..=10;

/// Growth stops once a tree reaches this generation.
pub const DEFAULT_MAX_GENERATIONS: u32 = 14;

/// Growth bookkeeping stored on a tree's entity.
///
/// Holds everything needed to rebuild the tree exactly, so the axion itself
/// is never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TreeGrowth {
    pub plant_id: String,
    /// Seed of the tree's grammar random source.
    pub seed: u64,
    /// Axion the tree started from (the sapling's symbol).
    pub seed_axion: Axion,
    pub generation: u32,
    /// Accumulated growth; its whole part is the target generation.
    pub growth: f32,
}

/// Immutable description of a tree species.
pub struct TreeDefinition {
    id: String,
    seed: Axion,
    grammar: Grammar,
    blocks: BTreeMap<char, BlockGeneration>,
    tree_blocks: Vec<TreeBlock>,
    growth_rate: f32,
    mature_generations: RangeInclusive<u32>,
    max_generations: u32,
    symbols: SymbolTable,
    interpreter: TreeInterpreter,
}

impl TreeDefinition {
    /// Builds and validates a definition.
    ///
    /// # Errors
    ///
    /// Fails when a rule has bad weights, when the seed cannot grow, or when a
    /// symbol the grammar can produce has neither a block generation nor a
    /// turtle meaning.
    pub fn new(
        id: impl Into<String>,
        seed: impl Into<Axion>,
        grammar: Grammar,
        blocks: BTreeMap<char, BlockGeneration>,
        tree_blocks: Vec<TreeBlock>,
        growth_rate: f32,
    ) -> Result<Self, TreeError> {
        let id = id.into();
        let seed = seed.into();

        grammar.validate()?;

        if !seed
            .first_symbol()
            .is_some_and(|symbol| grammar.rule(symbol).is_some())
        {
            return Err(TreeError::InertSeed {
                seed: seed.to_string(),
            });
        }

        // Saplings other than the seed (planted ones) start from their own
        // symbol, so every rule head counts as a starting point.
        let mut roots = seed.to_string();
        roots.extend(grammar.rules().map(|(symbol, _)| symbol));
        for symbol in grammar.reachable_symbols(&Axion::from(roots)) {
            if !STRUCTURAL_SYMBOLS.contains(&symbol) && !blocks.contains_key(&symbol) {
                return Err(TreeError::MissingBlockRule { symbol });
            }
        }

        let mut symbols = SymbolTable::new();
        let mut buf = [0u8; 4];
        for symbol in STRUCTURAL_SYMBOLS.iter().chain(blocks.keys()) {
            let key: &str = symbol.encode_utf8(&mut buf);
            symbols
                .intern(key)
                .map_err(|e| TreeError::Symbios(format!("{e:?}")))?;
        }

        let interpreter = build_interpreter(&symbols, &blocks, TurtleConfig::default())?;

        tracing::debug!(
            plant = %id,
            rules = grammar.rules().count(),
            blocks = blocks.len(),
            "tree definition ready"
        );

        Ok(Self {
            id,
            seed,
            grammar,
            blocks,
            tree_blocks,
            growth_rate,
            mature_generations: DEFAULT_MATURE_GENERATIONS,
            max_generations: DEFAULT_MAX_GENERATIONS,
            symbols,
            interpreter,
        })
    }

    /// Replaces the turtle configuration.
    pub fn with_turtle_config(mut self, config: TurtleConfig) -> Result<Self, TreeError> {
        self.interpreter = build_interpreter(&self.symbols, &self.blocks, config)?;
        Ok(self)
    }

    /// Sets the world-generation stage range and the growth cap.
    pub fn with_generations(mut self, mature: RangeInclusive<u32>, max: u32) -> Self {
        self.mature_generations = mature;
        self.max_generations = max;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn seed(&self) -> &Axion {
        &self.seed
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn block_generation(&self, symbol: char) -> Option<&BlockGeneration> {
        self.blocks.get(&symbol)
    }

    pub fn tree_blocks(&self) -> &[TreeBlock] {
        &self.tree_blocks
    }

    pub fn growth_rate(&self) -> f32 {
        self.growth_rate
    }

    pub fn mature_generations(&self) -> RangeInclusive<u32> {
        self.mature_generations.clone()
    }

    pub fn max_generations(&self) -> u32 {
        self.max_generations
    }

    pub fn turtle_config(&self) -> &TurtleConfig {
        self.interpreter.config()
    }

    /// Whether `uri` still counts as part of a grown tree.
    pub fn is_tree_block(&self, uri: &str) -> bool {
        self.tree_blocks.iter().any(|b| b.uri == uri)
    }

    /// The growable sapling symbol placed as `uri`, if any.
    pub fn sapling_symbol(&self, uri: &str) -> Option<char> {
        self.blocks.iter().find_map(|(symbol, rule)| match rule {
            BlockGeneration::Default { block, .. }
                if block.kind == TreeBlockKind::Sapling
                    && block.uri == uri
                    && self.grammar.rule(*symbol).is_some() =>
            {
                Some(*symbol)
            }
            _ => None,
        })
    }

    /// Stable seed for the plant this species grows at `world_pos`.
    pub fn plant_seed(&self, world_seed: &str, world_pos: IVec3) -> u64 {
        plant_seed(world_seed, &self.id, world_pos)
    }

    /// Grows the species seed for `generations` rounds.
    pub fn grow_axion(&self, plant_seed: u64, generations: u32) -> Axion {
        self.grow_from(&self.seed, plant_seed, generations)
    }

    /// Grows an arbitrary start axion with this species' grammar.
    pub fn grow_from(&self, start: &Axion, plant_seed: u64, generations: u32) -> Axion {
        let mut rng = StdRng::seed_from_u64(plant_seed);
        self.grammar.grow(start, generations, &mut rng)
    }

    /// Runs the turtle over a finished axion.
    pub fn interpret(&self, axion: &Axion) -> Result<TreeStructure, TreeError> {
        let state = axion.to_state(&self.symbols)?;
        self.interpreter.build_structure(&state)
    }

    /// Grows and interprets the species seed.
    pub fn build_structure(
        &self,
        plant_seed: u64,
        generations: u32,
    ) -> Result<TreeStructure, TreeError> {
        self.interpret(&self.grow_axion(plant_seed, generations))
    }

    fn structure_from(
        &self,
        start: &Axion,
        plant_seed: u64,
        generations: u32,
    ) -> Result<TreeStructure, TreeError> {
        self.interpret(&self.grow_from(start, plant_seed, generations))
    }

    /// Stage a world-generated tree is grown to, picked from the seed.
    pub fn mature_stage(&self, plant_seed: u64) -> u32 {
        let range = &self.mature_generations;
        if range.is_empty() {
            return *range.start();
        }
        StdRng::seed_from_u64(plant_seed.rotate_left(32)).random_range(range.clone())
    }

    /// Sapling block of the species seed, placed at a generated tree's base.
    fn anchor_block(&self) -> Option<&TreeBlock> {
        let symbol = self.seed.first_symbol()?;
        match self.blocks.get(&symbol)? {
            BlockGeneration::Default { block, .. } if block.kind == TreeBlockKind::Sapling => {
                Some(block)
            }
            _ => None,
        }
    }

    fn is_replaceable(&self, current: Option<&str>) -> bool {
        match current {
            None => true,
            Some(uri) => self.is_tree_block(uri) || self.sapling_symbol(uri).is_some(),
        }
    }

    /// Writes a fully grown tree into a chunk being generated.
    ///
    /// `x`, `y`, `z` are relative to the chunk at `chunk_pos`. Voxels outside
    /// the view, or occupied by blocks that are not part of a tree, are left
    /// untouched.
    #[allow(clippy::too_many_arguments)]
    pub fn generate_plant(
        &self,
        seed: &str,
        chunk_pos: IVec3,
        chunk_view: &mut dyn ChunkView,
        x: i32,
        y: i32,
        z: i32,
        params: &GenerationParameters,
    ) -> Result<(), TreeError> {
        let base = IVec3::new(x, y, z);
        let world_pos = chunk_pos
            .wrapping_mul(chunk_view.chunk_size())
            .wrapping_add(base);
        let plant_seed = self.plant_seed(seed, world_pos);
        let generations = params
            .generations
            .unwrap_or_else(|| self.mature_stage(plant_seed))
            .min(self.max_generations);

        let structure = self.build_structure(plant_seed, generations)?;

        let mut written = 0usize;
        let mut clipped = 0usize;
        for (offset, block) in structure.iter() {
            let pos = base.wrapping_add(offset);
            if !self.is_replaceable(chunk_view.get_block(pos)) {
                continue;
            }
            if chunk_view.set_block(pos, &block.uri) {
                written += 1;
            } else {
                clipped += 1;
            }
        }

        // The base keeps the generated sapling so the host can link the tree
        // and keep growing it.
        if let Some(anchor) = self.anchor_block()
            && self.is_replaceable(chunk_view.get_block(base))
        {
            chunk_view.set_block(base, &anchor.uri);
        }

        tracing::debug!(
            plant = %self.id,
            ?world_pos,
            generations,
            written,
            clipped,
            "generated plant"
        );
        Ok(())
    }

    /// Links a sapling to its entity.
    ///
    /// A planted sapling starts at generation 0. The generated sapling left by
    /// [`generate_plant`](Self::generate_plant) resumes at the tree's mature
    /// stage with the same seed, so further growth extends the generated tree.
    ///
    /// Returns `false` when the position already belongs to another entity or
    /// does not hold one of this species' saplings. The host may retry later.
    pub fn initialize_plant(
        &self,
        world: &dyn WorldProvider,
        registry: &mut dyn BlockEntityRegistry,
        plant: EntityRef,
    ) -> bool {
        if let Some(existing) = registry.entity_at(plant.position)
            && existing.id != plant.id
        {
            tracing::debug!(plant = %self.id, pos = ?plant.position, "base block already linked");
            return false;
        }
        if registry.tree_growth(plant).is_some() {
            return true;
        }

        let Some(symbol) = world
            .get_block(plant.position)
            .and_then(|uri| self.sapling_symbol(uri))
        else {
            tracing::debug!(plant = %self.id, pos = ?plant.position, "no sapling at base block");
            return false;
        };

        let seed = self.plant_seed(world.seed(), plant.position);
        let generation = if self.seed.first_symbol() == Some(symbol) {
            self.mature_stage(seed).min(self.max_generations)
        } else {
            0
        };
        let growth = TreeGrowth {
            plant_id: self.id.clone(),
            seed,
            seed_axion: Axion::new(symbol.to_string()),
            generation,
            growth: generation as f32,
        };
        registry.set_tree_growth(plant, growth);
        registry.link(plant.position, plant);
        true
    }

    /// Advances a live tree by one growth step, rewriting its blocks in place.
    pub fn update_plant(
        &self,
        world: &mut dyn WorldProvider,
        registry: &mut dyn BlockEntityRegistry,
        tree: EntityRef,
    ) -> Result<(), TreeError> {
        let Some(mut growth) = registry.tree_growth(tree) else {
            tracing::warn!(plant = %self.id, entity = tree.id, "tree entity has no growth component");
            return Ok(());
        };
        if growth.plant_id != self.id {
            tracing::warn!(
                plant = %self.id,
                entity = tree.id,
                owner = %growth.plant_id,
                "tree entity belongs to another species"
            );
            return Ok(());
        }
        if growth.generation >= self.max_generations {
            return Ok(());
        }

        growth.growth += self.growth_rate;
        let target = (growth.growth.floor() as u32).min(self.max_generations);

        if target > growth.generation {
            let old = self.structure_from(&growth.seed_axion, growth.seed, growth.generation)?;
            let new = self.structure_from(&growth.seed_axion, growth.seed, target)?;
            self.apply_growth(world, tree.position, &old, &new);
            tracing::debug!(
                plant = %self.id,
                entity = tree.id,
                from = growth.generation,
                to = target,
                blocks = new.len(),
                "tree grew"
            );
            growth.generation = target;
        }

        registry.set_tree_growth(tree, growth);
        Ok(())
    }

    fn apply_growth(
        &self,
        world: &mut dyn WorldProvider,
        base: IVec3,
        old: &TreeStructure,
        new: &TreeStructure,
    ) {
        for (offset, block) in old.iter() {
            if new.get(offset).is_some() {
                continue;
            }
            let pos = base.wrapping_add(offset);
            if world.get_block(pos) == Some(block.uri.as_str()) {
                world.clear_block(pos);
            }
        }

        for (offset, block) in new.iter() {
            let pos = base.wrapping_add(offset);
            let current = world.get_block(pos);
            if current == Some(block.uri.as_str()) {
                continue;
            }
            if self.is_replaceable(current) {
                world.set_block(pos, &block.uri);
            }
        }
    }
}

impl fmt::Debug for TreeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeDefinition")
            .field("id", &self.id)
            .field("seed", &self.seed)
            .field("grammar", &self.grammar)
            .field("blocks", &self.blocks)
            .field("tree_blocks", &self.tree_blocks)
            .field("growth_rate", &self.growth_rate)
            .field("mature_generations", &self.mature_generations)
            .field("max_generations", &self.max_generations)
            .finish_non_exhaustive()
    }
}

fn build_interpreter(
    symbols: &SymbolTable,
    blocks: &BTreeMap<char, BlockGeneration>,
    config: TurtleConfig,
) -> Result<TreeInterpreter, TreeError> {
    let mut interpreter = TreeInterpreter::new(config);
    interpreter.populate_structural_symbols(symbols);

    let mut buf = [0u8; 4];
    for (symbol, rule) in blocks {
        let key: &str = symbol.encode_utf8(&mut buf);
        let id = symbols
            .resolve_id(key)
            .ok_or(TreeError::UnmappedSymbol { symbol: *symbol })?;
        interpreter.set_op(id, TreeOp::Generate(rule.clone()));
    }

    Ok(interpreter)
}

/// FNV-1a over the world seed, plant ID and position.
///
/// Stable across runs and platforms, so a reloaded chunk regrows the same tree.
pub fn plant_seed(world_seed: &str, plant_id: &str, world_pos: IVec3) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let position = [world_pos.x, world_pos.y, world_pos.z];
    world_seed
        .bytes()
        .chain([0xff])
        .chain(plant_id.bytes())
        .chain(position.iter().flat_map(|c| c.to_le_bytes()))
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}
