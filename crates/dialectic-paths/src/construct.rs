//! Path constructor
//!
//! Construction runs in two phases:
//!
//! 1. [`ArtifactDescriptor::resolve`] validates a [`PathContext`] and
//!    sanitizes every segment into a closed tagged union, one variant per
//!    file type / contribution type branch.
//! 2. [`ArtifactDescriptor::render`] assembles the path. It cannot fail.
//!
//! No string is built for a context that fails validation.

use indexmap::IndexSet;

use crate::context::{ConstructedPath, PathContext};
use crate::deconstruct::{deconstruct_storage_path, DeconstructInput};
use crate::error::ValidationError;
use crate::file_type::{ContributionType, FileType};
use crate::grammar::{
    first_match, split_anchor_tail, AnchorTail, FileNameParser, DOCUMENT_PARSERS,
    PROJECT_ROOT_PARSERS,
};
use crate::sanitize::{
    generate_short_id, is_safe_segment, normalize_fragment, sanitize_for_path, sanitize_key,
    sanitize_slug,
};
use crate::stage::stage_order;

// Directory layout
pub(crate) const WORK_DIR: &str = "_work";
pub(crate) const RAW_RESPONSES_DIR: &str = "raw_responses";
pub(crate) const DOCUMENTS_DIR: &str = "documents";
pub(crate) const PROMPTS_DIR: &str = "prompts";
pub(crate) const CONTEXT_DIR: &str = "context";
pub(crate) const ASSEMBLED_JSON_DIR: &str = "assembled_json";
pub(crate) const PENDING_DIR: &str = "Pending";
pub(crate) const CURRENT_DIR: &str = "Current";
pub(crate) const COMPLETE_DIR: &str = "Complete";
pub(crate) const GENERAL_RESOURCE_DIR: &str = "general_resource";
pub(crate) const SESSION_PREFIX: &str = "session_";
pub(crate) const ITERATION_PREFIX: &str = "iteration_";

// Fixed file names and suffixes
pub(crate) const README_FILE: &str = "project_readme.md";
pub(crate) const SETTINGS_FILE: &str = "project_settings.json";
pub(crate) const MASTER_PLAN_FILE: &str = "Master_Plan.md";
pub(crate) const SEED_PROMPT_FILE: &str = "seed_prompt.md";
pub(crate) const USER_FEEDBACK_PREFIX: &str = "user_feedback_";
pub(crate) const MARKDOWN_EXT: &str = ".md";
pub(crate) const RAW_JSON_SUFFIX: &str = "_raw.json";
pub(crate) const CONTINUATION_TOKEN: &str = "_continuation_";
pub(crate) const ZIP_EXT: &str = ".zip";
pub(crate) const RESERVED_PLANNER_KEY: &str = "planner";

/// Build the storage location for an artifact.
///
/// # Errors
/// Returns [`ValidationError`] naming the first missing or invalid field
/// for the requested file type, or [`ValidationError::Unreadable`] when the
/// path would deconstruct to a different artifact.
///
/// # Examples
/// ```
/// use dialectic_paths::{construct_storage_path, FileType, PathContext};
///
/// let path = construct_storage_path(&PathContext::for_project("p", FileType::ProjectReadme))?;
/// assert_eq!(path.storage_path, "p");
/// assert_eq!(path.file_name, "project_readme.md");
/// # Ok::<(), dialectic_paths::ValidationError>(())
/// ```
pub fn construct_storage_path(context: &PathContext) -> Result<ConstructedPath, ValidationError> {
    let built = ArtifactDescriptor::resolve(context).and_then(|descriptor| {
        let path = descriptor.render();
        descriptor.ensure_reads_back(&path)?;
        Ok(path)
    });
    match built {
        Ok(path) => {
            tracing::trace!(
                file_type = %context.file_type,
                path = %path,
                "constructed storage path"
            );
            Ok(path)
        }
        Err(err) => {
            tracing::debug!(
                file_type = %context.file_type,
                error = %err,
                "path construction rejected"
            );
            Err(err)
        }
    }
}

/// Sanitized stage coordinates
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StageBase {
    project_id: String,
    short_session_id: String,
    iteration: u32,
    order: u8,
    stage_slug: String,
}

impl StageBase {
    fn dir(&self) -> String {
        format!(
            "{}/{SESSION_PREFIX}{}/{ITERATION_PREFIX}{}/{}_{}",
            self.project_id, self.short_session_id, self.iteration, self.order, self.stage_slug
        )
    }

    fn subdir(&self, segments: &[&str]) -> String {
        let mut dir = self.dir();
        for segment in segments {
            dir.push('/');
            dir.push_str(segment);
        }
        dir
    }
}

/// Generating model and attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ModelAttempt {
    slug: String,
    attempt: u32,
}

/// Which half of a model contribution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Output {
    Main,
    RawJson,
}

/// Lineage of a model contribution, one variant per contribution type
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ContributionKind {
    Thesis,
    Synthesis,
    FinalSynthesis,
    Parenthesis,
    Paralysis,
    Antithesis {
        source_model: String,
        anchor_type: String,
        source_attempt: u32,
        fragment: Option<String>,
    },
    PairwiseSynthesisChunk {
        anchor_model: String,
        paired_model: String,
        anchor_type: String,
        fragment: Option<String>,
    },
    ReducedSynthesis {
        anchor_type: String,
        anchor_model: String,
        fragment: Option<String>,
    },
}

impl ContributionKind {
    const fn contribution_type(&self) -> ContributionType {
        match self {
            Self::Thesis => ContributionType::Thesis,
            Self::Synthesis => ContributionType::Synthesis,
            Self::FinalSynthesis => ContributionType::FinalSynthesis,
            Self::Parenthesis => ContributionType::Parenthesis,
            Self::Paralysis => ContributionType::Paralysis,
            Self::Antithesis { .. } => ContributionType::Antithesis,
            Self::PairwiseSynthesisChunk { .. } => ContributionType::PairwiseSynthesisChunk,
            Self::ReducedSynthesis { .. } => ContributionType::ReducedSynthesis,
        }
    }

    fn stem(&self, model: &ModelAttempt) -> String {
        let ModelAttempt { slug, attempt } = model;
        let kind = self.contribution_type();
        match self {
            Self::Thesis
            | Self::Synthesis
            | Self::FinalSynthesis
            | Self::Parenthesis
            | Self::Paralysis => format!("{slug}_{attempt}_{kind}"),
            Self::Antithesis {
                source_model,
                anchor_type,
                source_attempt,
                fragment,
            } => format!(
                "{slug}_critiquing_({source_model}'s_{anchor_type}_{source_attempt}){}_{attempt}_{kind}",
                fragment_suffix(fragment.as_deref())
            ),
            Self::PairwiseSynthesisChunk {
                anchor_model,
                paired_model,
                anchor_type,
                fragment,
            } => format!(
                "{slug}_synthesizing_{anchor_model}_with_{paired_model}_on_{anchor_type}{}_{attempt}_{kind}",
                fragment_suffix(fragment.as_deref())
            ),
            Self::ReducedSynthesis {
                anchor_type,
                anchor_model,
                fragment,
            } => format!(
                "{slug}_reducing_{anchor_type}_by_{anchor_model}{}_{attempt}_{kind}",
                fragment_suffix(fragment.as_deref())
            ),
        }
    }
}

/// Validated, sanitized artifact identity
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ArtifactDescriptor {
    ProjectReadme { project_id: String },
    InitialUserPrompt { project_id: String, file_name: String },
    ProjectSettings { project_id: String },
    GeneralResource { project_id: String, file_name: String },
    ProjectExportZip { project_id: String, file_name: String },
    PendingFile { project_id: String, file_name: String },
    CurrentFile { project_id: String, file_name: String },
    CompleteFile { project_id: String, file_name: String },
    ProjectMasterPlan { project_id: String },
    SeedPrompt { stage: StageBase },
    UserFeedback { stage: StageBase },
    ContributionDocument { stage: StageBase, file_name: String },
    Contribution {
        stage: StageBase,
        model: ModelAttempt,
        kind: ContributionKind,
        output: Output,
        continuation: Option<u32>,
    },
    PlannerPrompt { stage: StageBase, model: ModelAttempt },
    TurnPrompt {
        stage: StageBase,
        model: ModelAttempt,
        document_key: String,
        continuation: Option<u32>,
    },
    HeaderContext {
        stage: StageBase,
        model: ModelAttempt,
        fragment: Option<String>,
    },
    AssembledDocumentJson {
        stage: StageBase,
        model: ModelAttempt,
        document_key: String,
    },
    RenderedDocument {
        stage: StageBase,
        model: ModelAttempt,
        document_key: String,
    },
    RagContextSummary {
        stage: StageBase,
        model_slug: String,
        sources: Vec<String>,
    },
}

impl ArtifactDescriptor {
    /// Validate `ctx` into a descriptor.
    pub(crate) fn resolve(ctx: &PathContext) -> Result<Self, ValidationError> {
        let file_type = ctx.file_type;
        match file_type {
            FileType::Document(_) => Err(ValidationError::NotConstructible(file_type)),
            FileType::ProjectReadme => Ok(Self::ProjectReadme {
                project_id: project_id(ctx)?,
            }),
            FileType::ProjectSettingsFile => Ok(Self::ProjectSettings {
                project_id: project_id(ctx)?,
            }),
            FileType::ProjectMasterPlan => Ok(Self::ProjectMasterPlan {
                project_id: project_id(ctx)?,
            }),
            FileType::InitialUserPrompt => Ok(Self::InitialUserPrompt {
                project_id: project_id(ctx)?,
                file_name: unclaimed_file_name(ctx, PROJECT_ROOT_PARSERS)?,
            }),
            FileType::GeneralResource => Ok(Self::GeneralResource {
                project_id: project_id(ctx)?,
                file_name: original_file_name(ctx)?,
            }),
            FileType::ProjectExportZip => {
                let project_id = project_id(ctx)?;
                let mut file_name = original_file_name(ctx)?;
                if !file_name.ends_with(ZIP_EXT) {
                    file_name.push_str(ZIP_EXT);
                }
                Ok(Self::ProjectExportZip {
                    project_id,
                    file_name,
                })
            }
            FileType::PendingFile => Ok(Self::PendingFile {
                project_id: project_id(ctx)?,
                file_name: original_file_name(ctx)?,
            }),
            FileType::CurrentFile => Ok(Self::CurrentFile {
                project_id: project_id(ctx)?,
                file_name: original_file_name(ctx)?,
            }),
            FileType::CompleteFile => Ok(Self::CompleteFile {
                project_id: project_id(ctx)?,
                file_name: original_file_name(ctx)?,
            }),
            FileType::SeedPrompt => Ok(Self::SeedPrompt {
                stage: stage_base(ctx)?,
            }),
            FileType::UserFeedback => Ok(Self::UserFeedback {
                stage: stage_base(ctx)?,
            }),
            FileType::ContributionDocument => Ok(Self::ContributionDocument {
                stage: stage_base(ctx)?,
                file_name: unclaimed_file_name(ctx, DOCUMENT_PARSERS)?,
            }),
            FileType::ModelContributionMain => Self::contribution(ctx, Output::Main),
            FileType::ModelContributionRawJson => Self::contribution(ctx, Output::RawJson),
            FileType::PlannerPrompt => {
                let stage = stage_base(ctx)?;
                let model = model_attempt(ctx)?;
                ignore_continuation(ctx);
                Ok(Self::PlannerPrompt { stage, model })
            }
            FileType::TurnPrompt => {
                let stage = stage_base(ctx)?;
                let model = model_attempt(ctx)?;
                let document_key = document_key(ctx)?;
                if document_key == RESERVED_PLANNER_KEY {
                    return Err(ValidationError::ReservedDocumentKey(document_key));
                }
                if ends_in_continuation(&document_key) {
                    return Err(ValidationError::ContinuationDocumentKey(document_key));
                }
                Ok(Self::TurnPrompt {
                    stage,
                    model,
                    document_key,
                    continuation: continuation(ctx)?,
                })
            }
            FileType::HeaderContext => {
                let stage = stage_base(ctx)?;
                let model = model_attempt(ctx)?;
                ignore_continuation(ctx);
                Ok(Self::HeaderContext {
                    stage,
                    model,
                    fragment: fragment(ctx)?,
                })
            }
            FileType::AssembledDocumentJson => {
                let stage = stage_base(ctx)?;
                let model = model_attempt(ctx)?;
                ignore_continuation(ctx);
                Ok(Self::AssembledDocumentJson {
                    stage,
                    model,
                    document_key: document_key(ctx)?,
                })
            }
            FileType::RenderedDocument => {
                let stage = stage_base(ctx)?;
                let model = model_attempt(ctx)?;
                ignore_continuation(ctx);
                Ok(Self::RenderedDocument {
                    stage,
                    model,
                    document_key: document_key(ctx)?,
                })
            }
            FileType::RagContextSummary => {
                let stage = stage_base(ctx)?;
                let model_slug = slug(
                    required(ctx.model_slug.as_deref(), "modelSlug", file_type)?,
                    "modelSlug",
                )?;
                let sources: IndexSet<String> = ctx
                    .source_model_slugs
                    .iter()
                    .map(|source| slug(source, "sourceModelSlugs"))
                    .collect::<Result<_, _>>()?;
                if sources.is_empty() {
                    return Err(ValidationError::RagSources);
                }
                Ok(Self::RagContextSummary {
                    stage,
                    model_slug,
                    sources: sources.into_iter().collect(),
                })
            }
        }
    }

    fn contribution(ctx: &PathContext, output: Output) -> Result<Self, ValidationError> {
        let stage = stage_base(ctx)?;
        let contribution_type = ctx
            .contribution_type
            .ok_or_else(|| ValidationError::missing("contributionType", ctx.file_type))?;
        let model = model_attempt(ctx)?;
        let kind = match contribution_type {
            ContributionType::Thesis => ContributionKind::Thesis,
            ContributionType::Synthesis => ContributionKind::Synthesis,
            ContributionType::FinalSynthesis => ContributionKind::FinalSynthesis,
            ContributionType::Parenthesis => ContributionKind::Parenthesis,
            ContributionType::Paralysis => ContributionKind::Paralysis,
            ContributionType::Antithesis => {
                let (Some(anchor_type), Some(source_attempt)) =
                    (ctx.source_anchor_type.as_deref(), ctx.source_attempt_count)
                else {
                    return Err(ValidationError::AntithesisLineage);
                };
                let mut sources = ctx.source_model_slugs.iter();
                let (Some(source_model), None) = (sources.next(), sources.next()) else {
                    return Err(ValidationError::AntithesisLineage);
                };
                ContributionKind::Antithesis {
                    source_model: slug(source_model, "sourceModelSlugs")?,
                    anchor_type: key(anchor_type, "sourceAnchorType")?,
                    source_attempt,
                    fragment: fragment(ctx)?,
                }
            }
            ContributionType::PairwiseSynthesisChunk => {
                let (Some(anchor_type), Some(anchor_model), Some(paired_model)) = (
                    ctx.source_anchor_type.as_deref(),
                    ctx.source_anchor_model_slug.as_deref(),
                    ctx.paired_model_slug.as_deref(),
                ) else {
                    return Err(ValidationError::PairwiseLineage);
                };
                let anchor_model = slug(anchor_model, "sourceAnchorModelSlug")?;
                let paired_model = slug(paired_model, "pairedModelSlug")?;
                let anchor_type = key(anchor_type, "sourceAnchorType")?;
                let fragment = fragment(ctx)?;
                let tail = format!("{anchor_type}{}", fragment_suffix(fragment.as_deref()));
                let splits_back = matches!(
                    split_anchor_tail(&tail),
                    AnchorTail::Resolved { anchor, fragment: split }
                        if anchor == anchor_type && split == fragment
                );
                if !splits_back {
                    return Err(ValidationError::AmbiguousAnchor(tail));
                }
                ContributionKind::PairwiseSynthesisChunk {
                    anchor_model,
                    paired_model,
                    anchor_type,
                    fragment,
                }
            }
            ContributionType::ReducedSynthesis => {
                let (Some(anchor_type), Some(anchor_model)) = (
                    ctx.source_anchor_type.as_deref(),
                    ctx.source_anchor_model_slug.as_deref(),
                ) else {
                    return Err(ValidationError::ReducedLineage);
                };
                ContributionKind::ReducedSynthesis {
                    anchor_type: key(anchor_type, "sourceAnchorType")?,
                    anchor_model: slug(anchor_model, "sourceAnchorModelSlug")?,
                    fragment: fragment(ctx)?,
                }
            }
        };
        Ok(Self::Contribution {
            stage,
            model,
            kind,
            output,
            continuation: continuation(ctx)?,
        })
    }

    /// Assemble the path. Infallible once resolved.
    pub(crate) fn render(&self) -> ConstructedPath {
        match self {
            Self::ProjectReadme { project_id } => ConstructedPath::new(project_id, README_FILE),
            Self::ProjectSettings { project_id } => ConstructedPath::new(project_id, SETTINGS_FILE),
            Self::ProjectMasterPlan { project_id } => {
                ConstructedPath::new(project_id, MASTER_PLAN_FILE)
            }
            Self::InitialUserPrompt {
                project_id,
                file_name,
            }
            | Self::ProjectExportZip {
                project_id,
                file_name,
            } => ConstructedPath::new(project_id, file_name),
            Self::GeneralResource {
                project_id,
                file_name,
            } => ConstructedPath::new(format!("{project_id}/{GENERAL_RESOURCE_DIR}"), file_name),
            Self::PendingFile {
                project_id,
                file_name,
            } => ConstructedPath::new(format!("{project_id}/{PENDING_DIR}"), file_name),
            Self::CurrentFile {
                project_id,
                file_name,
            } => ConstructedPath::new(format!("{project_id}/{CURRENT_DIR}"), file_name),
            Self::CompleteFile {
                project_id,
                file_name,
            } => ConstructedPath::new(format!("{project_id}/{COMPLETE_DIR}"), file_name),
            Self::SeedPrompt { stage } => ConstructedPath::new(stage.dir(), SEED_PROMPT_FILE),
            Self::UserFeedback { stage } => ConstructedPath::new(
                stage.dir(),
                format!("{USER_FEEDBACK_PREFIX}{}{MARKDOWN_EXT}", stage.stage_slug),
            ),
            Self::ContributionDocument { stage, file_name } => {
                ConstructedPath::new(stage.subdir(&[DOCUMENTS_DIR]), file_name)
            }
            Self::Contribution {
                stage,
                model,
                kind,
                output,
                continuation,
            } => {
                let mut dirs: Vec<&str> = Vec::with_capacity(2);
                if kind.contribution_type().is_intermediate() || continuation.is_some() {
                    dirs.push(WORK_DIR);
                }
                if *output == Output::RawJson {
                    dirs.push(RAW_RESPONSES_DIR);
                }
                let extension = match output {
                    Output::Main => MARKDOWN_EXT,
                    Output::RawJson => RAW_JSON_SUFFIX,
                };
                let file_name = format!(
                    "{}{}{extension}",
                    kind.stem(model),
                    continuation_suffix(*continuation)
                );
                ConstructedPath::new(stage.subdir(&dirs), file_name)
            }
            Self::PlannerPrompt { stage, model } => ConstructedPath::new(
                stage.subdir(&[WORK_DIR, PROMPTS_DIR]),
                format!("{}_{}_planner_prompt{MARKDOWN_EXT}", model.slug, model.attempt),
            ),
            Self::TurnPrompt {
                stage,
                model,
                document_key,
                continuation,
            } => ConstructedPath::new(
                stage.subdir(&[WORK_DIR, PROMPTS_DIR]),
                format!(
                    "{}_{}_{document_key}{}_prompt{MARKDOWN_EXT}",
                    model.slug,
                    model.attempt,
                    continuation_suffix(*continuation)
                ),
            ),
            Self::HeaderContext {
                stage,
                model,
                fragment,
            } => ConstructedPath::new(
                stage.subdir(&[WORK_DIR, CONTEXT_DIR]),
                format!(
                    "{}_{}{}_header_context.json",
                    model.slug,
                    model.attempt,
                    fragment_suffix(fragment.as_deref())
                ),
            ),
            Self::AssembledDocumentJson {
                stage,
                model,
                document_key,
            } => ConstructedPath::new(
                stage.subdir(&[WORK_DIR, ASSEMBLED_JSON_DIR]),
                format!("{}_{}_{document_key}_assembled.json", model.slug, model.attempt),
            ),
            Self::RenderedDocument {
                stage,
                model,
                document_key,
            } => ConstructedPath::new(
                stage.subdir(&[DOCUMENTS_DIR]),
                format!("{}_{}_{document_key}{MARKDOWN_EXT}", model.slug, model.attempt),
            ),
            Self::RagContextSummary {
                stage,
                model_slug,
                sources,
            } => ConstructedPath::new(
                stage.subdir(&[WORK_DIR]),
                format!(
                    "{model_slug}_compressing_{}_rag_summary.txt",
                    sources.join("_and_")
                ),
            ),
        }
    }

    /// `path` must deconstruct back to exactly this descriptor.
    fn ensure_reads_back(&self, path: &ConstructedPath) -> Result<(), ValidationError> {
        let read_back = deconstruct_storage_path(&DeconstructInput::from(path))
            .to_path_context(None)
            .ok()
            .and_then(|context| Self::resolve(&context).ok());
        if read_back.as_ref() == Some(self) {
            Ok(())
        } else {
            Err(ValidationError::Unreadable(path.full_path()))
        }
    }
}

fn fragment_suffix(fragment: Option<&str>) -> String {
    fragment.map(|f| format!("_{f}")).unwrap_or_default()
}

fn continuation_suffix(turn_index: Option<u32>) -> String {
    turn_index
        .map(|turn| format!("{CONTINUATION_TOKEN}{turn}"))
        .unwrap_or_default()
}

fn required<'a>(
    value: Option<&'a str>,
    field: &'static str,
    file_type: FileType,
) -> Result<&'a str, ValidationError> {
    value.ok_or_else(|| ValidationError::missing(field, file_type))
}

fn has_alphanumeric(value: &str) -> bool {
    value.chars().any(|c| c.is_ascii_alphanumeric())
}

fn slug(raw: &str, field: &'static str) -> Result<String, ValidationError> {
    let slug = sanitize_slug(raw);
    if has_alphanumeric(&slug) {
        Ok(slug)
    } else {
        Err(ValidationError::invalid(field, raw))
    }
}

fn key(raw: &str, field: &'static str) -> Result<String, ValidationError> {
    let key = sanitize_key(raw);
    if has_alphanumeric(&key) {
        Ok(key)
    } else {
        Err(ValidationError::invalid(field, raw))
    }
}

fn project_id(ctx: &PathContext) -> Result<String, ValidationError> {
    let raw = required(ctx.project_id.as_deref(), "projectId", ctx.file_type)?;
    let project_id = sanitize_for_path(raw);
    if is_safe_segment(&project_id) {
        Ok(project_id)
    } else {
        Err(ValidationError::invalid("projectId", raw))
    }
}

fn original_file_name(ctx: &PathContext) -> Result<String, ValidationError> {
    let raw = required(ctx.original_file_name.as_deref(), "originalFileName", ctx.file_type)?;
    let file_name = sanitize_for_path(raw);
    if is_safe_segment(&file_name) {
        Ok(file_name)
    } else {
        Err(ValidationError::invalid("originalFileName", raw))
    }
}

/// Sanitized upload name, unless a generated-name parser for the same
/// folder would claim it first.
fn unclaimed_file_name(
    ctx: &PathContext,
    parsers: &[FileNameParser],
) -> Result<String, ValidationError> {
    let file_name = original_file_name(ctx)?;
    match first_match(parsers, &file_name) {
        Some(matched) if matched.file_type == ctx.file_type => Ok(file_name),
        _ => Err(ValidationError::ReservedFileName(file_name)),
    }
}

/// `{key}_continuation_{n}` reads back as a continuation of `{key}`.
fn ends_in_continuation(document_key: &str) -> bool {
    document_key
        .rsplit_once(CONTINUATION_TOKEN)
        .is_some_and(|(head, turn)| {
            !head.is_empty() && !turn.is_empty() && turn.chars().all(|c| c.is_ascii_digit())
        })
}

fn stage_base(ctx: &PathContext) -> Result<StageBase, ValidationError> {
    let file_type = ctx.file_type;
    let project_id = project_id(ctx)?;
    let session_id = required(ctx.session_id.as_deref(), "sessionId", file_type)?;
    let iteration = ctx
        .iteration
        .ok_or_else(|| ValidationError::missing("iteration", file_type))?;
    let raw_stage = required(ctx.stage_slug.as_deref(), "stageSlug", file_type)?;

    let short_session_id = generate_short_id(session_id);
    if short_session_id.is_empty() {
        return Err(ValidationError::invalid("sessionId", session_id));
    }
    if iteration == 0 {
        return Err(ValidationError::InvalidIteration);
    }
    let stage_slug = sanitize_key(raw_stage);
    let order = stage_order(&stage_slug)
        .ok_or_else(|| ValidationError::UnknownStage(raw_stage.to_string()))?;

    Ok(StageBase {
        project_id,
        short_session_id,
        iteration,
        order,
        stage_slug,
    })
}

fn model_attempt(ctx: &PathContext) -> Result<ModelAttempt, ValidationError> {
    let raw = required(ctx.model_slug.as_deref(), "modelSlug", ctx.file_type)?;
    let attempt = ctx
        .attempt_count
        .ok_or_else(|| ValidationError::missing("attemptCount", ctx.file_type))?;
    Ok(ModelAttempt {
        slug: slug(raw, "modelSlug")?,
        attempt,
    })
}

fn document_key(ctx: &PathContext) -> Result<String, ValidationError> {
    let raw = required(ctx.document_key.as_deref(), "documentKey", ctx.file_type)?;
    key(raw, "documentKey")
}

fn fragment(ctx: &PathContext) -> Result<Option<String>, ValidationError> {
    ctx.source_group_fragment
        .as_deref()
        .map(|raw| {
            normalize_fragment(raw)
                .ok_or_else(|| ValidationError::invalid("sourceGroupFragment", raw))
        })
        .transpose()
}

fn continuation(ctx: &PathContext) -> Result<Option<u32>, ValidationError> {
    if !ctx.is_continuation {
        return Ok(None);
    }
    ctx.turn_index.map(Some).ok_or(ValidationError::MissingTurnIndex)
}

fn ignore_continuation(ctx: &PathContext) {
    if ctx.is_continuation {
        tracing::debug!(
            file_type = %ctx.file_type,
            "continuation flag has no effect on this file type"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SESSION: &str = "7f3a9c12-0b4d-4e5f-8a6b-123456789abc";

    fn stage_ctx(stage: &str, file_type: FileType) -> PathContext {
        PathContext::for_stage("proj", SESSION, 1, stage, file_type)
    }

    fn contribution(stage: &str, kind: ContributionType) -> PathContext {
        stage_ctx(stage, FileType::ModelContributionMain)
            .with_contribution_type(kind)
            .with_model("gpt-4-turbo", 0)
    }

    fn build(ctx: &PathContext) -> ConstructedPath {
        construct_storage_path(ctx).unwrap()
    }

    #[test]
    fn project_readme() {
        let path = build(&PathContext::for_project("p", FileType::ProjectReadme));
        assert_eq!(path, ConstructedPath::new("p", "project_readme.md"));
    }

    #[test]
    fn project_fixed_names() {
        let settings = build(&PathContext::for_project("p", FileType::ProjectSettingsFile));
        assert_eq!(settings.file_name, "project_settings.json");
        let plan = build(&PathContext::for_project("p", FileType::ProjectMasterPlan));
        assert_eq!(plan, ConstructedPath::new("p", "Master_Plan.md"));
    }

    #[test]
    fn project_subfolders() {
        let cases = [
            (FileType::PendingFile, "p/Pending"),
            (FileType::CurrentFile, "p/Current"),
            (FileType::CompleteFile, "p/Complete"),
            (FileType::GeneralResource, "p/general_resource"),
            (FileType::InitialUserPrompt, "p"),
        ];
        for (file_type, dir) in cases {
            let path = build(
                &PathContext::for_project("p", file_type).with_original_file_name("My Draft.MD"),
            );
            assert_eq!(path.storage_path, dir);
            assert_eq!(path.file_name, "my_draft.md");
        }
    }

    #[test]
    fn export_zip_gets_extension() {
        let export = |name: &str| {
            PathContext::for_project("p", FileType::ProjectExportZip).with_original_file_name(name)
        };
        let path = build(&export("export"));
        assert_eq!(path.file_name, "export.zip");
        let path = build(&export("Export.ZIP"));
        assert_eq!(path.file_name, "export.zip");
    }

    #[test]
    fn pending_requires_original_name() {
        let err = construct_storage_path(&PathContext::for_project("p", FileType::PendingFile))
            .unwrap_err();
        assert!(err.to_string().contains("originalFileName is required for pending_file."));
    }

    #[test]
    fn stage_singletons() {
        let seed = build(&stage_ctx("synthesis", FileType::SeedPrompt));
        assert_eq!(
            seed,
            ConstructedPath::new("proj/session_7f3a9c12/iteration_1/3_synthesis", "seed_prompt.md")
        );
        let feedback = build(&stage_ctx("Antithesis", FileType::UserFeedback));
        assert_eq!(feedback.storage_path, "proj/session_7f3a9c12/iteration_1/2_antithesis");
        assert_eq!(feedback.file_name, "user_feedback_antithesis.md");
        let doc =
            stage_ctx("thesis", FileType::ContributionDocument).with_original_file_name("Notes.md");
        let doc = build(&doc);
        assert_eq!(doc.storage_path, "proj/session_7f3a9c12/iteration_1/1_thesis/documents");
    }

    #[test]
    fn stage_requires_fields_in_order() {
        let ctx = PathContext::for_project("p", FileType::SeedPrompt);
        assert_eq!(
            construct_storage_path(&ctx).unwrap_err(),
            ValidationError::missing("sessionId", FileType::SeedPrompt)
        );
        let ctx = PathContext::new(FileType::SeedPrompt);
        assert_eq!(
            construct_storage_path(&ctx).unwrap_err(),
            ValidationError::missing("projectId", FileType::SeedPrompt)
        );
    }

    #[test]
    fn unknown_stage_and_zero_iteration() {
        let err = construct_storage_path(&stage_ctx("review", FileType::SeedPrompt)).unwrap_err();
        assert_eq!(err, ValidationError::UnknownStage("review".to_string()));
        let ctx = PathContext::for_stage("p", "s", 0, "thesis", FileType::SeedPrompt);
        assert_eq!(construct_storage_path(&ctx).unwrap_err(), ValidationError::InvalidIteration);
    }

    #[test]
    fn simple_contributions_at_stage_root() {
        let thesis = build(&contribution("thesis", ContributionType::Thesis));
        assert_eq!(thesis.file_name, "gpt-4-turbo_0_thesis.md");
        assert!(thesis.storage_path.ends_with("/1_thesis"));
        let final_synthesis = build(&contribution("synthesis", ContributionType::FinalSynthesis));
        assert_eq!(final_synthesis.file_name, "gpt-4-turbo_0_final_synthesis.md");
        assert!(!final_synthesis.is_in_work_dir());
    }

    #[test]
    fn antithesis_name() {
        let ctx = contribution("antithesis", ContributionType::Antithesis)
            .with_source_model("claude-3-opus")
            .with_anchor_type("thesis")
            .with_source_attempt(0);
        let path = build(&ctx);
        assert_eq!(
            path.file_name,
            "gpt-4-turbo_critiquing_(claude-3-opus's_thesis_0)_0_antithesis.md"
        );
        assert!(path.storage_path.ends_with("/2_antithesis"));

        let with_fragment = build(&ctx.with_fragment("AB12CD34-ffff"));
        assert_eq!(
            with_fragment.file_name,
            "gpt-4-turbo_critiquing_(claude-3-opus's_thesis_0)_ab12cd34_0_antithesis.md"
        );
    }

    #[test]
    fn antithesis_requires_exactly_one_source() {
        let base = contribution("antithesis", ContributionType::Antithesis)
            .with_anchor_type("thesis")
            .with_source_attempt(0);
        assert_eq!(construct_storage_path(&base).unwrap_err(), ValidationError::AntithesisLineage);
        let two = base.with_source_model("a").with_source_model("b");
        assert_eq!(construct_storage_path(&two).unwrap_err(), ValidationError::AntithesisLineage);
    }

    #[test]
    fn pairwise_chunk_in_work_dir() {
        let ctx = contribution("synthesis", ContributionType::PairwiseSynthesisChunk)
            .with_anchor("thesis", "claude-3-opus")
            .with_paired_model("gemini-pro");
        let path = build(&ctx);
        assert_eq!(path.storage_path, "proj/session_7f3a9c12/iteration_1/3_synthesis/_work");
        assert_eq!(
            path.file_name,
            "gpt-4-turbo_synthesizing_claude-3-opus_with_gemini-pro_on_thesis_0_pairwise_synthesis_chunk.md"
        );
    }

    #[test]
    fn pairwise_requires_lineage() {
        let ctx = contribution("synthesis", ContributionType::PairwiseSynthesisChunk)
            .with_anchor_type("thesis");
        let err = construct_storage_path(&ctx).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Required sourceAnchorType, sourceAnchorModelSlug, and pairedModelSlug missing for pairwise_synthesis_chunk."
        );
    }

    #[test]
    fn reduced_synthesis_name() {
        let ctx = contribution("synthesis", ContributionType::ReducedSynthesis)
            .with_anchor("business_case", "claude-3-opus")
            .with_fragment("9f");
        let path = build(&ctx);
        assert!(path.is_in_work_dir());
        assert_eq!(
            path.file_name,
            "gpt-4-turbo_reducing_business_case_by_claude-3-opus_9f_0_reduced_synthesis.md"
        );
        let missing = contribution("synthesis", ContributionType::ReducedSynthesis);
        assert_eq!(construct_storage_path(&missing).unwrap_err(), ValidationError::ReducedLineage);
    }

    #[test]
    fn raw_json_variants() {
        let mut ctx = contribution("thesis", ContributionType::Thesis);
        ctx.file_type = FileType::ModelContributionRawJson;
        let path = build(&ctx);
        assert_eq!(path.storage_path, "proj/session_7f3a9c12/iteration_1/1_thesis/raw_responses");
        assert_eq!(path.file_name, "gpt-4-turbo_0_thesis_raw.json");

        let mut chunk = contribution("synthesis", ContributionType::PairwiseSynthesisChunk)
            .with_anchor("thesis", "a")
            .with_paired_model("b");
        chunk.file_type = FileType::ModelContributionRawJson;
        assert!(build(&chunk).storage_path.ends_with("/3_synthesis/_work/raw_responses"));
    }

    #[test]
    fn continuation_forces_work_dir() {
        let ctx = contribution("thesis", ContributionType::Thesis).with_continuation(2);
        let path = build(&ctx);
        assert_eq!(path.storage_path, "proj/session_7f3a9c12/iteration_1/1_thesis/_work");
        assert_eq!(path.file_name, "gpt-4-turbo_0_thesis_continuation_2.md");

        let mut raw = ctx;
        raw.file_type = FileType::ModelContributionRawJson;
        let path = build(&raw);
        assert!(path.storage_path.ends_with("/_work/raw_responses"));
        assert_eq!(path.file_name, "gpt-4-turbo_0_thesis_continuation_2_raw.json");
    }

    #[test]
    fn continuation_requires_turn_index() {
        let mut ctx = contribution("thesis", ContributionType::Thesis);
        ctx.is_continuation = true;
        assert_eq!(construct_storage_path(&ctx).unwrap_err(), ValidationError::MissingTurnIndex);
    }

    #[test]
    fn document_process_artifacts() {
        let planner = build(&stage_ctx("thesis", FileType::PlannerPrompt).with_model("m", 1));
        assert_eq!(
            planner.storage_path,
            "proj/session_7f3a9c12/iteration_1/1_thesis/_work/prompts"
        );
        assert_eq!(planner.file_name, "m_1_planner_prompt.md");

        let turn = build(
            &stage_ctx("thesis", FileType::TurnPrompt)
                .with_model("m", 1)
                .with_document_key("business_case")
                .with_continuation(2),
        );
        assert_eq!(turn.file_name, "m_1_business_case_continuation_2_prompt.md");

        let header = build(&stage_ctx("thesis", FileType::HeaderContext).with_model("m", 1));
        assert_eq!(header.storage_path, "proj/session_7f3a9c12/iteration_1/1_thesis/_work/context");
        assert_eq!(header.file_name, "m_1_header_context.json");

        let assembled = build(
            &stage_ctx("thesis", FileType::AssembledDocumentJson)
                .with_model("m", 1)
                .with_document_key("feature_spec"),
        );
        assert!(assembled.storage_path.ends_with("/_work/assembled_json"));
        assert_eq!(assembled.file_name, "m_1_feature_spec_assembled.json");

        let rendered = build(
            &stage_ctx("thesis", FileType::RenderedDocument)
                .with_model("m", 1)
                .with_document_key("feature_spec"),
        );
        assert_eq!(rendered.storage_path, "proj/session_7f3a9c12/iteration_1/1_thesis/documents");
        assert_eq!(rendered.file_name, "m_1_feature_spec.md");
    }

    #[test]
    fn planner_key_reserved_for_turn_prompts() {
        let ctx = stage_ctx("thesis", FileType::TurnPrompt)
            .with_model("m", 0)
            .with_document_key("Planner");
        assert_eq!(
            construct_storage_path(&ctx).unwrap_err(),
            ValidationError::ReservedDocumentKey("planner".to_string())
        );
    }

    #[test]
    fn rag_summary() {
        let ctx = stage_ctx("synthesis", FileType::RagContextSummary)
            .with_model("m", 0)
            .with_source_model("Model A")
            .with_source_model("b");
        let path = build(&ctx);
        assert_eq!(path.storage_path, "proj/session_7f3a9c12/iteration_1/3_synthesis/_work");
        assert_eq!(path.file_name, "m_compressing_model-a_and_b_rag_summary.txt");

        let empty = stage_ctx("synthesis", FileType::RagContextSummary).with_model("m", 0);
        assert_eq!(construct_storage_path(&empty).unwrap_err(), ValidationError::RagSources);
    }

    #[test]
    fn document_keys_not_constructible() {
        let ctx = PathContext::for_project("p", FileType::Document(crate::DocumentKey::Prd));
        assert!(matches!(
            construct_storage_path(&ctx),
            Err(ValidationError::NotConstructible(_))
        ));
    }

    #[test]
    fn invalid_values_rejected() {
        let ctx = PathContext::for_project("..", FileType::ProjectReadme);
        assert!(matches!(
            construct_storage_path(&ctx),
            Err(ValidationError::InvalidValue { field: "projectId", .. })
        ));

        let ctx = contribution("thesis", ContributionType::Thesis).with_model("!!!", 0);
        assert!(matches!(
            construct_storage_path(&ctx),
            Err(ValidationError::InvalidValue { field: "modelSlug", .. })
        ));

        let ctx = contribution("antithesis", ContributionType::Antithesis)
            .with_source_model("a")
            .with_anchor_type("thesis")
            .with_source_attempt(0)
            .with_fragment("not-hex");
        assert!(matches!(
            construct_storage_path(&ctx),
            Err(ValidationError::InvalidValue { field: "sourceGroupFragment", .. })
        ));
    }

    #[test]
    fn pairwise_anchor_must_split_back_from_fragment() {
        let chunk = |anchor: &str| {
            contribution("synthesis", ContributionType::PairwiseSynthesisChunk)
                .with_model("m", 0)
                .with_anchor(anchor, "a")
                .with_paired_model("b")
        };
        let rejected = [
            chunk("phase_2"),
            chunk("phase").with_fragment("2"),
            chunk("thesis_ab"),
        ];
        for ctx in &rejected {
            assert!(matches!(
                construct_storage_path(ctx),
                Err(ValidationError::AmbiguousAnchor(_))
            ));
        }

        let known = build(&chunk("thesis").with_fragment("ab"));
        assert_eq!(
            known.file_name,
            "m_synthesizing_a_with_b_on_thesis_ab_0_pairwise_synthesis_chunk.md"
        );
        let unknown = build(&chunk("custom_kind"));
        assert!(unknown.file_name.contains("_on_custom_kind_0_"));
    }

    #[test]
    fn turn_prompt_key_cannot_end_in_continuation() {
        let turn = stage_ctx("thesis", FileType::TurnPrompt).with_model("m", 0);
        let ctx = turn.clone().with_document_key("notes_continuation_3");
        assert_eq!(
            construct_storage_path(&ctx).unwrap_err(),
            ValidationError::ContinuationDocumentKey("notes_continuation_3".to_string())
        );

        let real = build(&turn.clone().with_document_key("notes").with_continuation(3));
        assert_eq!(real.file_name, "m_0_notes_continuation_3_prompt.md");
        let mid = build(&turn.with_document_key("continuation_3_notes"));
        assert_eq!(mid.file_name, "m_0_continuation_3_notes_prompt.md");
    }

    #[test]
    fn uploads_cannot_take_generated_names() {
        let initial = |name: &str| {
            PathContext::for_project("p", FileType::InitialUserPrompt).with_original_file_name(name)
        };
        for name in ["notes.zip", "project_readme.md", "Project_Settings.json"] {
            assert!(matches!(
                construct_storage_path(&initial(name)),
                Err(ValidationError::ReservedFileName(_))
            ));
        }
        let export = build(
            &PathContext::for_project("p", FileType::ProjectExportZip)
                .with_original_file_name("notes"),
        );
        assert_eq!(export, ConstructedPath::new("p", "notes.zip"));

        let document = stage_ctx("thesis", FileType::ContributionDocument)
            .with_original_file_name("gpt-4_0_notes.md");
        assert_eq!(
            construct_storage_path(&document).unwrap_err(),
            ValidationError::ReservedFileName("gpt-4_0_notes.md".to_string())
        );
    }

    #[test]
    fn paths_that_read_back_differently_are_rejected() {
        let reduced = |anchor: &str, anchor_model: &str| {
            contribution("synthesis", ContributionType::ReducedSynthesis)
                .with_model("m", 0)
                .with_anchor(anchor, anchor_model)
        };
        let kept = build(&reduced("a", "by").with_fragment("ab"));
        assert_eq!(kept.file_name, "m_reducing_a_by_by_ab_0_reduced_synthesis.md");

        let err = construct_storage_path(&reduced("a_by", "ab")).unwrap_err();
        assert_eq!(err, ValidationError::Unreadable(kept.full_path()));
    }

    #[test]
    fn construction_is_deterministic() {
        let ctx = contribution("synthesis", ContributionType::PairwiseSynthesisChunk)
            .with_anchor("thesis", "a")
            .with_paired_model("b")
            .with_fragment("abc");
        assert_eq!(build(&ctx), build(&ctx));
    }
}
