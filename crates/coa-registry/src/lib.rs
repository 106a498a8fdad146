//! COA Artifact Registry
//!
//! The single choke point every detector and explicit registration goes
//! through.
//!
//! # Overview
//!
//! - **ArtifactRegistry**: async-safe catalog keyed by id and by storage path
//! - **merge_on_path_collision**: id-stable, timestamp-wins merge rule
//! - **RegistryStats**: aggregate counts by type, media and task
//!
//! # Example
//!
//! ```rust
//! use coa_artifact::Artifact;
//! use coa_registry::ArtifactRegistry;
//!
//! # async fn example() {
//! let registry = ArtifactRegistry::new();
//! let artifact = Artifact::builder("/exec/data.csv").build().unwrap();
//! let stored = registry.register(artifact).await;
//!
//! assert_eq!(registry.get_by_path("/exec/data.csv").await.map(|a| a.id), Some(stored.id));
//! # }
//! ```

#![warn(missing_docs)]

pub mod registry;
pub mod stats;

// Re-exports
pub use registry::{merge_on_path_collision, ArtifactRegistry};
pub use stats::RegistryStats;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
