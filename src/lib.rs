//! # symbios-plantpack
//!
//! Maple and grand-maple tree species for voxel world generation, together
//! with the small L-System engine they run on.
//!
//! A species is a grammar (the *Genotype*) and a symbol-to-block table. The
//! grammar grows an axion from a per-plant seed; the turtle interpreter then
//! turns that axion into a sparse `TreeStructure` (the *Phenotype*) that is
//! written into a chunk during world generation or into the live world as the
//! tree grows.

pub mod axion;
pub mod definition;
pub mod error;
pub mod grammar;
pub mod host;
pub mod interpreter;
pub mod plugin;
pub mod species;
pub mod structure;
pub mod turtle;

pub use axion::*;
pub use definition::*;
pub use error::*;
pub use grammar::*;
pub use host::*;
pub use interpreter::*;
pub use plugin::*;
pub use species::*;
pub use structure::*;
pub use turtle::*;
