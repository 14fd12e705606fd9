//! Dialectic Artifact Paths
//!
//! Storage path codec for the artifacts of a multi-stage dialectic
//! generation pipeline.
//!
//! # Core Concepts
//!
//! - [`PathContext`]: Structured identity of an artifact (project, session,
//!   stage, model, attempt, document key, lineage)
//! - [`construct_storage_path`]: Context → directory + file name
//! - [`deconstruct_storage_path`]: Directory + file name → [`DeconstructedPathInfo`]
//! - [`FileType`]: Closed artifact taxonomy, including semantic [`DocumentKey`]s
//! - [`contribution_type_from_file_type`]: Classify a file type into its debate phase
//!
//! Both directions are pure functions over immutable tables and are safe
//! to call from any number of threads.
//!
//! # Example
//!
//! ```rust
//! use dialectic_paths::{
//!     construct_storage_path, deconstruct_storage_path, ContributionType, DeconstructInput,
//!     FileType, PathContext,
//! };
//!
//! let main = FileType::ModelContributionMain;
//! let context = PathContext::for_stage("proj", "7f3a9c12-0b4d", 1, "antithesis", main)
//!     .with_model("gpt-4-turbo", 0)
//!     .with_contribution_type(ContributionType::Antithesis)
//!     .with_source_model("claude-3-opus")
//!     .with_anchor_type("thesis")
//!     .with_source_attempt(0);
//!
//! let path = construct_storage_path(&context)?;
//! assert_eq!(path.file_name, "gpt-4-turbo_critiquing_(claude-3-opus's_thesis_0)_0_antithesis.md");
//!
//! let info = deconstruct_storage_path(&DeconstructInput::from(&path));
//! assert_eq!(info.source_model_slug.as_deref(), Some("claude-3-opus"));
//! # Ok::<(), dialectic_paths::ValidationError>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod construct;
mod context;
mod deconstruct;
mod error;
mod file_type;
mod grammar;
mod remap;
mod sanitize;
mod stage;

// Re-exports
pub use construct::construct_storage_path;
pub use context::{ConstructedPath, PathContext};
pub use deconstruct::{deconstruct_storage_path, DeconstructInput, DeconstructedPathInfo};
pub use error::{DeconstructError, ValidationError};
pub use file_type::{
    contribution_type_from_file_type, is_known_anchor, ContributionType, DocumentKey, FileType,
    FileTypeFamily, UnknownFileType,
};
pub use sanitize::{
    generate_short_id, is_fragment_token, is_safe_segment, normalize_fragment, sanitize_for_path,
    sanitize_key, sanitize_slug, SHORT_ID_LEN,
};
pub use stage::{stage_dir_name, stage_order, stage_slug_from_dir, STAGES};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
