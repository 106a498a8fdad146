//! COA Artifact Model
//!
//! Path-identified records for every file a task produces during execution.
//!
//! # Core Concepts
//!
//! - [`Artifact`]: cataloged file with identity, type, provenance and lineage
//! - [`ArtifactType`]: semantic category with a total extension lookup
//! - [`MediaType`]: coarse media kind shared with the message layer
//! - [`ArtifactMetadata`]: description, shape, schema and free-form extras
//! - [`StoragePath`]: absolute, normalized, traversal-free location
//! - [`ArtifactReference`]: outward projection rendered into prompt context
//!
//! # Example
//!
//! ```rust
//! use coa_artifact::{Artifact, ArtifactReference, ArtifactType};
//!
//! let artifact = Artifact::builder("/exec/report.md")
//!     .created_by("task-1", "writer")
//!     .description("Weekly summary")
//!     .build()
//!     .unwrap();
//! assert_eq!(artifact.artifact_type, ArtifactType::Report);
//!
//! let xml = ArtifactReference::from(&artifact).to_xml();
//! assert!(xml.contains("<description>Weekly summary</description>"));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod artifact;
mod artifact_type;
mod error;
mod media;
mod metadata;
mod path;
mod reference;
pub mod xml;

// Re-exports
pub use artifact::{default_description, Artifact, ArtifactBuilder, ArtifactId};
pub use artifact_type::ArtifactType;
pub use error::ArtifactError;
pub use media::{mime_type_for, MediaType};
pub use metadata::{ArtifactMetadata, ELLIPSIS, MAX_DESCRIPTION_CHARS};
pub use path::StoragePath;
pub use reference::{render_references, ArtifactReference};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
