// src/core/mod.rs

//! Core data structures and types

pub mod blocks;
pub mod dtype;
pub mod error;
pub mod sector;
pub mod state;

// Re-export public types for convenient access via `symbasis::core::TypeName`
pub use blocks::SymmetryBlocks;
pub use dtype::Dtype;
pub use error::BasisError;
pub use sector::{Sector, Transform};
pub use state::{BasisType, SiteParams};

pub mod constants;
pub use constants::basis_constants::{MAXPRINT, PI}; // Re-export
