//! Error types for the path codec
//!
//! - [`ValidationError`]: a [`PathContext`](crate::PathContext) cannot be
//!   constructed into a path. Raised before any string is assembled.
//! - [`DeconstructError`]: a deconstructed path cannot be used where
//!   canonical parameters are required (cloning, editing).
//!
//! Deconstruction itself never fails; it reports through
//! [`DeconstructedPathInfo::error`](crate::DeconstructedPathInfo::error).

use crate::file_type::FileType;

/// Construction-time validation failures
///
/// Messages use the camelCase field names callers put on the wire.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A field required by the file type is absent
    #[error("{field} is required for {file_type}.")]
    MissingField {
        field: &'static str,
        file_type: FileType,
    },

    /// Antithesis lineage is incomplete
    #[error("Antithesis requires one sourceModelSlug, a sourceAnchorType, and a sourceAttemptCount.")]
    AntithesisLineage,

    /// Pairwise chunk lineage is incomplete
    #[error("Required sourceAnchorType, sourceAnchorModelSlug, and pairedModelSlug missing for pairwise_synthesis_chunk.")]
    PairwiseLineage,

    /// Reduced synthesis lineage is incomplete
    #[error("Required sourceAnchorType and sourceAnchorModelSlug missing for reduced_synthesis.")]
    ReducedLineage,

    /// RAG summary has no source models
    #[error("rag_context_summary requires at least one sourceModelSlug.")]
    RagSources,

    /// Continuation without a turn index
    #[error("turnIndex is required when isContinuation is true.")]
    MissingTurnIndex,

    /// Iteration numbers start at 1
    #[error("iteration must be a positive integer.")]
    InvalidIteration,

    /// Stage slug has no entry in the stage table
    #[error("unknown stage slug: '{0}'")]
    UnknownStage(String),

    /// Field value is empty or unsafe after sanitization
    #[error("invalid {field}: '{value}'")]
    InvalidValue { field: &'static str, value: String },

    /// Document key collides with a fixed filename token
    #[error("documentKey '{0}' is reserved for planner_prompt.")]
    ReservedDocumentKey(String),

    /// Document key ends in the continuation marker of turn prompts
    #[error("documentKey '{0}' ends in a continuation marker.")]
    ContinuationDocumentKey(String),

    /// Pairwise anchor type and fragment do not split back apart
    #[error("sourceAnchorType and sourceGroupFragment '{0}' do not split back apart.")]
    AmbiguousAnchor(String),

    /// Uploaded name collides with a generated file name in the same folder
    #[error("originalFileName '{0}' collides with a generated file name.")]
    ReservedFileName(String),

    /// Rendered path deconstructs to a different artifact
    #[error("path '{0}' does not read back to the same artifact.")]
    Unreadable(String),

    /// Document-key file types are classification-only
    #[error("{0} is a document key and has no storage path.")]
    NotConstructible(FileType),
}

impl ValidationError {
    /// Create a missing-field error
    #[inline]
    #[must_use]
    pub fn missing(field: &'static str, file_type: FileType) -> Self {
        Self::MissingField { field, file_type }
    }

    /// Create an invalid-value error
    #[inline]
    pub fn invalid(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
        }
    }
}

/// Failures turning a deconstructed path back into canonical parameters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeconstructError {
    /// The path matched no known convention
    #[error("non-canonical path: {0}")]
    NonCanonical(String),

    /// A field needed to rebuild the context was not recovered
    #[error("deconstructed path is missing {0}")]
    MissingField(&'static str),
}
