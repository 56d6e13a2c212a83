//! Asset registry for the Reelforge assembly engine.
//!
//! This crate provides:
//! - A concurrent in-memory registry of generated assets
//! - Idempotent registration by unique asset id
//! - A validated approval state machine (no silent illegal transitions)
//! - A repository boundary for persistence, with a JSON file backend

pub mod error;
pub mod registry;
pub mod repository;

pub use error::{RegistryError, RegistryResult};
pub use registry::{AssetFilter, AssetRegistry, RegistrySnapshot};
pub use repository::{JsonFileRepository, RegistryRepository};
