//! Rebuilding a [`PathContext`] from a deconstructed path
//!
//! Session cloning walks every stored artifact, deconstructs its path,
//! swaps in the new session id and constructs the new path. Editing uses
//! the same conversion without a session change.

use crate::context::PathContext;
use crate::deconstruct::DeconstructedPathInfo;
use crate::error::DeconstructError;
use crate::file_type::FileTypeFamily;

impl DeconstructedPathInfo {
    /// Turn a recorded `error` into a [`DeconstructError`].
    ///
    /// # Errors
    /// Returns [`DeconstructError::NonCanonical`] when the path matched no
    /// known convention.
    pub fn into_result(self) -> Result<Self, DeconstructError> {
        match self.error {
            Some(reason) => Err(DeconstructError::NonCanonical(reason)),
            None => Ok(self),
        }
    }

    /// Rebuild the construction context for this artifact.
    ///
    /// Staged artifacts are placed in `new_session_id` when given, otherwise
    /// in the recovered short session id, which constructs to the same
    /// directory.
    ///
    /// # Errors
    /// Fails when the path was not recognized or a field the artifact's
    /// file type needs was not recovered.
    ///
    /// # Examples
    /// ```
    /// use dialectic_paths::{construct_storage_path, deconstruct_storage_path, DeconstructInput};
    ///
    /// let info = deconstruct_storage_path(&DeconstructInput::new(
    ///     "proj/session_7f3a9c12/iteration_1/1_thesis",
    ///     "gpt-4-turbo_0_thesis.md",
    /// ));
    /// let context = info.to_path_context(Some("0b1c2d3e-4f50-6172-8394-a5b6c7d8e9f0"))?;
    /// let cloned = construct_storage_path(&context)?;
    /// assert_eq!(cloned.storage_path, "proj/session_0b1c2d3e/iteration_1/1_thesis");
    /// assert_eq!(cloned.file_name, "gpt-4-turbo_0_thesis.md");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn to_path_context(
        &self,
        new_session_id: Option<&str>,
    ) -> Result<PathContext, DeconstructError> {
        if let Some(reason) = &self.error {
            return Err(DeconstructError::NonCanonical(reason.clone()));
        }
        let file_type = self
            .file_type_guess
            .ok_or(DeconstructError::MissingField("fileType"))?;
        let project_id = self
            .project_id
            .as_deref()
            .ok_or(DeconstructError::MissingField("projectId"))?;

        let mut context = PathContext::for_project(project_id, file_type);
        if file_type.family() != FileTypeFamily::Project {
            let session_id = new_session_id
                .or(self.short_session_id.as_deref())
                .ok_or(DeconstructError::MissingField("sessionId"))?;
            let iteration = self
                .iteration
                .ok_or(DeconstructError::MissingField("iteration"))?;
            let stage_slug = self
                .stage_slug
                .as_deref()
                .ok_or(DeconstructError::MissingField("stageSlug"))?;
            context = context.with_session(session_id, iteration).with_stage(stage_slug);
        }

        context.model_slug.clone_from(&self.model_slug);
        context.attempt_count = self.attempt_count;
        context.contribution_type = self.contribution_type;
        context.document_key.clone_from(&self.document_key);
        context.source_model_slugs = self.source_model_slugs.iter().cloned().collect();
        context.source_anchor_type.clone_from(&self.source_anchor_type);
        context.source_anchor_model_slug.clone_from(&self.source_anchor_model_slug);
        context.source_attempt_count = self.source_attempt_count;
        context.paired_model_slug.clone_from(&self.paired_model_slug);
        context.source_group_fragment.clone_from(&self.source_group_fragment);
        context.original_file_name.clone_from(&self.original_file_name);
        if let Some(turn) = self.turn_index {
            context = context.with_continuation(turn);
        }
        Ok(context)
    }
}
