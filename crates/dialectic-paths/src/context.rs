//! Write-side models
//!
//! A [`PathContext`] is assembled by a caller right before an upload or a
//! path lookup and handed to [`construct_storage_path`]. Only the
//! resulting [`ConstructedPath`] is ever persisted.
//!
//! [`construct_storage_path`]: crate::construct_storage_path

use std::fmt::{self, Display, Formatter};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::file_type::{ContributionType, FileType};

/// Structured identity of an artifact
///
/// Every field except `file_type` is optional; which ones are required
/// depends on the file type and contribution type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathContext {
    pub file_type: FileType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contribution_type: Option<ContributionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_slug: Option<String>,
    /// Zero-based generation attempt of this model in this stage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_key: Option<String>,
    /// Ordered set of source models (antithesis, RAG summaries)
    #[serde(default, skip_serializing_if = "IndexSet::is_empty")]
    pub source_model_slugs: IndexSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_anchor_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_anchor_model_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_attempt_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paired_model_slug: Option<String>,
    #[serde(default)]
    pub is_continuation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_index: Option<u32>,
    /// Orchestration tag, carried but never encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_key: Option<String>,
    /// Orchestration tag, carried but never encoded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_group: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_group_fragment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_contribution_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_name: Option<String>,
}

impl PathContext {
    /// Empty context for a file type
    #[must_use]
    pub fn new(file_type: FileType) -> Self {
        Self {
            file_type,
            project_id: None,
            session_id: None,
            iteration: None,
            stage_slug: None,
            contribution_type: None,
            model_slug: None,
            attempt_count: None,
            document_key: None,
            source_model_slugs: IndexSet::new(),
            source_anchor_type: None,
            source_anchor_model_slug: None,
            source_attempt_count: None,
            paired_model_slug: None,
            is_continuation: false,
            turn_index: None,
            branch_key: None,
            parallel_group: None,
            source_group_fragment: None,
            original_file_name: None,
            source_contribution_id: None,
            step_name: None,
        }
    }

    /// Project-level context
    #[must_use]
    pub fn for_project(project_id: impl Into<String>, file_type: FileType) -> Self {
        Self::new(file_type).with_project(project_id)
    }

    /// Stage-level context
    #[must_use]
    pub fn for_stage(
        project_id: impl Into<String>,
        session_id: impl Into<String>,
        iteration: u32,
        stage_slug: impl Into<String>,
        file_type: FileType,
    ) -> Self {
        Self::for_project(project_id, file_type)
            .with_session(session_id, iteration)
            .with_stage(stage_slug)
    }

    /// With project id
    #[inline]
    #[must_use]
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// With session id and iteration
    #[inline]
    #[must_use]
    pub fn with_session(mut self, session_id: impl Into<String>, iteration: u32) -> Self {
        self.session_id = Some(session_id.into());
        self.iteration = Some(iteration);
        self
    }

    /// With stage slug
    #[inline]
    #[must_use]
    pub fn with_stage(mut self, stage_slug: impl Into<String>) -> Self {
        self.stage_slug = Some(stage_slug.into());
        self
    }

    /// With generating model and attempt
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model_slug: impl Into<String>, attempt_count: u32) -> Self {
        self.model_slug = Some(model_slug.into());
        self.attempt_count = Some(attempt_count);
        self
    }

    /// With contribution type
    #[inline]
    #[must_use]
    pub fn with_contribution_type(mut self, contribution_type: ContributionType) -> Self {
        self.contribution_type = Some(contribution_type);
        self
    }

    /// With document key
    #[inline]
    #[must_use]
    pub fn with_document_key(mut self, document_key: impl Into<String>) -> Self {
        self.document_key = Some(document_key.into());
        self
    }

    /// Append a source model slug (duplicates are ignored)
    #[inline]
    #[must_use]
    pub fn with_source_model(mut self, slug: impl Into<String>) -> Self {
        self.source_model_slugs.insert(slug.into());
        self
    }

    /// With the anchor a derivative critiques or synthesizes
    #[inline]
    #[must_use]
    pub fn with_anchor(
        mut self,
        anchor_type: impl Into<String>,
        anchor_model_slug: impl Into<String>,
    ) -> Self {
        self.source_anchor_type = Some(anchor_type.into());
        self.source_anchor_model_slug = Some(anchor_model_slug.into());
        self
    }

    /// With anchor type only
    #[inline]
    #[must_use]
    pub fn with_anchor_type(mut self, anchor_type: impl Into<String>) -> Self {
        self.source_anchor_type = Some(anchor_type.into());
        self
    }

    /// With the source attempt being critiqued
    #[inline]
    #[must_use]
    pub fn with_source_attempt(mut self, source_attempt_count: u32) -> Self {
        self.source_attempt_count = Some(source_attempt_count);
        self
    }

    /// With the second party of a pairwise synthesis
    #[inline]
    #[must_use]
    pub fn with_paired_model(mut self, slug: impl Into<String>) -> Self {
        self.paired_model_slug = Some(slug.into());
        self
    }

    /// Mark as continuation chunk `turn_index`
    #[inline]
    #[must_use]
    pub fn with_continuation(mut self, turn_index: u32) -> Self {
        self.is_continuation = true;
        self.turn_index = Some(turn_index);
        self
    }

    /// With disambiguating fragment
    #[inline]
    #[must_use]
    pub fn with_fragment(mut self, fragment: impl Into<String>) -> Self {
        self.source_group_fragment = Some(fragment.into());
        self
    }

    /// With user-supplied file name
    #[inline]
    #[must_use]
    pub fn with_original_file_name(mut self, name: impl Into<String>) -> Self {
        self.original_file_name = Some(name.into());
        self
    }
}

/// Output of the constructor
///
/// `storage_path` has no leading or trailing `/`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructedPath {
    pub storage_path: String,
    pub file_name: String,
}

impl ConstructedPath {
    /// Create from parts
    #[inline]
    #[must_use]
    pub fn new(storage_path: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            storage_path: storage_path.into(),
            file_name: file_name.into(),
        }
    }

    /// Object-store key: `storage_path/file_name`
    #[must_use]
    pub fn full_path(&self) -> String {
        format!("{}/{}", self.storage_path, self.file_name)
    }

    /// Whether the artifact lives in a stage work directory
    #[must_use]
    pub fn is_in_work_dir(&self) -> bool {
        self.storage_path.split('/').any(|segment| segment == crate::construct::WORK_DIR)
    }
}

impl Display for ConstructedPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.storage_path, self.file_name)
    }
}
