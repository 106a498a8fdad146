//! COA Core - artifact lifecycle facade
//!
//! Sits on top of the registry and the detection pipeline and adds what an
//! orchestrator needs around them:
//! - context injection: which artifacts a task sees ([`InjectionMode`])
//! - explicit, validated registration ([`register_artifact`])
//! - TOML configuration ([`ArtifactConfig`])
//! - the [`TaskGraph`] view the `subtask` mode queries
//!
//! # Example
//!
//! ```rust,ignore
//! use coa_core::{ArtifactLifecycle, ArtifactConfig, TaskScope};
//! use coa_detection::{LocalStorage, Producer};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let lifecycle = ArtifactLifecycle::new(ArtifactConfig::load("artifacts.toml")?);
//! let ctx = lifecycle.context(Arc::new(LocalStorage::open("/runs/42", "run-42")?));
//!
//! lifecycle
//!     .pipeline()
//!     .on_execution_complete(Some(&ctx), &Producer::new("fetch", "prices"))
//!     .await;
//!
//! let deps = vec!["fetch".to_string()];
//! let block = lifecycle
//!     .context_block(TaskScope::new("analyze").with_dependencies(&deps))
//!     .await;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
pub mod config;
pub mod error;
pub mod graph;
pub mod lifecycle;
pub mod query;
pub mod tool;

// Re-exports for convenience
pub use config::{ArtifactConfig, InjectionMode};
pub use error::{ConfigError, RegistrationError, RegistrationOutcome};
pub use graph::{InMemoryTaskGraph, Subgraph, TaskGraph, TaskNode};
pub use lifecycle::ArtifactLifecycle;
pub use query::{ArtifactQueryService, TaskScope};
pub use tool::{parse_lineage, register_artifact, RegisterArtifactRequest};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the artifact lifecycle
    pub use crate::{
        ArtifactConfig, ArtifactLifecycle, InjectionMode, RegisterArtifactRequest, TaskGraph,
        TaskScope,
    };
    pub use coa_artifact::{Artifact, ArtifactReference, ArtifactType};
    pub use coa_detection::{ExecutionContext, LocalStorage, Producer};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
