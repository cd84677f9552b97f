// src/config/mod.rs

//! TOML configuration for DAGs made of external-process tasks.
//!
//! - [`model`] is the serde data model.
//! - [`loader`] reads a file from disk.
//! - [`validate`] checks task references and `after` ordering.
//! - [`build`] turns a validated config into a [`Dag`](crate::dag::Dag).

pub mod build;
pub mod loader;
pub mod model;
pub mod validate;

pub use build::build_dag;
pub use loader::{load_and_validate, load_from_path, parse_and_validate};
pub use model::{CommandSpec, ConfigFile, DagSection, RawConfigFile, TaskConfig};
