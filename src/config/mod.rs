// src/config/mod.rs

//! Declarative pipeline configuration.
//!
//! - [`model`]: serde structs mirroring the TOML layout.
//! - [`loader`]: reading and validating config files.
//! - [`validate`]: semantic checks beyond deserialization.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{
    ArchiveSection, CleanSection, ConfigFile, FreshnessPolicy, PipelineConfig, ProjectSection,
    PublishSection, Step, TaskConfig,
};
