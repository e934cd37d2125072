//! The plant plugin surface the host calls, and the registry it discovers
//! plugins through.

use crate::definition::TreeDefinition;
use crate::error::TreeError;
use crate::host::{BlockEntityRegistry, ChunkView, EntityRef, GenerationParameters, WorldProvider};
use crate::species;
use glam::IVec3;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A plant species as seen by the world-generation host.
///
/// Implementations are shared across generation threads.
pub trait PlantGrowthDefinition: Send + Sync {
    /// Stable identifier, e.g. `PlantPack:maple`.
    fn plant_id(&self) -> &str;

    /// Writes the plant rooted at (`x`, `y`, `z`) of the chunk at `chunk_pos`
    /// into `chunk_view` only.
    #[allow(clippy::too_many_arguments)]
    fn generate_plant(
        &self,
        seed: &str,
        chunk_pos: IVec3,
        chunk_view: &mut dyn ChunkView,
        x: i32,
        y: i32,
        z: i32,
        params: &GenerationParameters,
    ) -> Result<(), TreeError>;

    /// Links a fresh sapling's base block to `plant`. `false` means the base
    /// block could not be claimed.
    fn initialize_plant(
        &self,
        world: &dyn WorldProvider,
        registry: &mut dyn BlockEntityRegistry,
        plant: EntityRef,
    ) -> bool;

    /// Advances an existing tree's growth in place.
    fn update_plant(
        &self,
        world: &mut dyn WorldProvider,
        registry: &mut dyn BlockEntityRegistry,
        tree: EntityRef,
    ) -> Result<(), TreeError>;
}

impl PlantGrowthDefinition for TreeDefinition {
    fn plant_id(&self) -> &str {
        self.id()
    }

    fn generate_plant(
        &self,
        seed: &str,
        chunk_pos: IVec3,
        chunk_view: &mut dyn ChunkView,
        x: i32,
        y: i32,
        z: i32,
        params: &GenerationParameters,
    ) -> Result<(), TreeError> {
        TreeDefinition::generate_plant(self, seed, chunk_pos, chunk_view, x, y, z, params)
    }

    fn initialize_plant(
        &self,
        world: &dyn WorldProvider,
        registry: &mut dyn BlockEntityRegistry,
        plant: EntityRef,
    ) -> bool {
        TreeDefinition::initialize_plant(self, world, registry, plant)
    }

    fn update_plant(
        &self,
        world: &mut dyn WorldProvider,
        registry: &mut dyn BlockEntityRegistry,
        tree: EntityRef,
    ) -> Result<(), TreeError> {
        TreeDefinition::update_plant(self, world, registry, tree)
    }
}

/// Plant plugins keyed by their ID.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: BTreeMap<String, Arc<dyn PlantGrowthDefinition>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every species this crate ships.
    pub fn with_builtin_species() -> Result<Self, TreeError> {
        let mut registry = Self::new();
        registry.register(Arc::new(species::maple()?))?;
        registry.register(Arc::new(species::grand_maple()?))?;
        Ok(registry)
    }

    /// Adds a plugin. IDs must be unique.
    pub fn register(&mut self, plugin: Arc<dyn PlantGrowthDefinition>) -> Result<(), TreeError> {
        let id = plugin.plant_id().to_string();
        if self.plugins.contains_key(&id) {
            return Err(TreeError::DuplicatePlugin(id));
        }
        tracing::info!(plant = %id, "registered plant plugin");
        self.plugins.insert(id, plugin);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn PlantGrowthDefinition>> {
        self.plugins.get(id).cloned()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .finish()
    }
}
