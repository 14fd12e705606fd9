//! Path deconstructor
//!
//! Recovers an artifact's identity from its storage directory and file
//! name. The directory is resolved into a [`Location`] first; each location
//! has its own ordered parser table in [`crate::grammar`]. A parsed
//! artifact must also sit exactly where the constructor would have put it.
//!
//! Deconstruction never fails outright: a path that matches no convention
//! comes back with only [`DeconstructedPathInfo::error`] set.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::construct::{
    ASSEMBLED_JSON_DIR, COMPLETE_DIR, CONTEXT_DIR, CURRENT_DIR, DOCUMENTS_DIR,
    GENERAL_RESOURCE_DIR, ITERATION_PREFIX, PENDING_DIR, PROMPTS_DIR, RAW_RESPONSES_DIR,
    SESSION_PREFIX, WORK_DIR,
};
use crate::context::ConstructedPath;
use crate::file_type::{ContributionType, DocumentKey, FileType};
use crate::grammar::{
    first_match, user_file, FileNameMatch, ASSEMBLED_PARSERS, CONTEXT_PARSERS, DOCUMENT_PARSERS,
    PROJECT_ROOT_PARSERS, PROMPT_PARSERS, STAGE_PARSERS,
};
use crate::sanitize::{is_safe_segment, SHORT_ID_LEN};
use crate::stage::stage_slug_from_dir;

/// Path to deconstruct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeconstructInput {
    pub storage_dir: String,
    pub file_name: String,
}

impl DeconstructInput {
    /// Create from directory and file name
    #[inline]
    #[must_use]
    pub fn new(storage_dir: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            file_name: file_name.into(),
        }
    }
}

impl From<&ConstructedPath> for DeconstructInput {
    fn from(path: &ConstructedPath) -> Self {
        Self::new(&path.storage_path, &path.file_name)
    }
}

/// Everything recoverable from a storage path
///
/// When `error` is set, every other field is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeconstructedPathInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_dir_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type_guess: Option<FileType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contribution_type: Option<ContributionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attempt_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_key: Option<String>,
    /// Single critiqued model of an antithesis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_model_slug: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_model_slugs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_anchor_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_anchor_model_slug: Option<String>,
    /// Debate phase of the anchor, when the anchor type names one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_contribution_type: Option<ContributionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_attempt_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paired_model_slug: Option<String>,
    #[serde(default)]
    pub is_continuation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub turn_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_group_fragment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_file_name_from_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeconstructedPathInfo {
    /// Failure result: only `error` is set.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Whether the path matched a known convention
    #[inline]
    #[must_use]
    pub fn is_recognized(&self) -> bool {
        self.error.is_none()
    }
}

/// Recover artifact identity from a storage path.
///
/// # Examples
/// ```
/// use dialectic_paths::{deconstruct_storage_path, DeconstructInput, FileType};
///
/// let info = deconstruct_storage_path(&DeconstructInput::new(
///     "proj/session_7f3a9c12/iteration_1/1_thesis",
///     "gpt-4-turbo_0_thesis.md",
/// ));
/// assert_eq!(info.file_type_guess, Some(FileType::ModelContributionMain));
/// assert_eq!(info.model_slug.as_deref(), Some("gpt-4-turbo"));
/// ```
#[must_use]
pub fn deconstruct_storage_path(input: &DeconstructInput) -> DeconstructedPathInfo {
    match deconstruct(input) {
        Ok(info) => {
            tracing::trace!(
                dir = %input.storage_dir,
                file = %input.file_name,
                file_type = ?info.file_type_guess,
                "deconstructed storage path"
            );
            info
        }
        Err(reason) => {
            tracing::debug!(
                dir = %input.storage_dir,
                file = %input.file_name,
                reason = %reason,
                "storage path matched no known convention"
            );
            DeconstructedPathInfo::failed(reason)
        }
    }
}

/// Sub-directory of a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StageArea {
    Root,
    RawResponses,
    Work,
    WorkRawResponses,
    Prompts,
    Context,
    AssembledJson,
    Documents,
}

impl StageArea {
    fn from_segments(segments: &[&str]) -> Option<Self> {
        let area = match segments {
            [] => Self::Root,
            [RAW_RESPONSES_DIR] => Self::RawResponses,
            [DOCUMENTS_DIR] => Self::Documents,
            [WORK_DIR] => Self::Work,
            [WORK_DIR, RAW_RESPONSES_DIR] => Self::WorkRawResponses,
            [WORK_DIR, PROMPTS_DIR] => Self::Prompts,
            [WORK_DIR, CONTEXT_DIR] => Self::Context,
            [WORK_DIR, ASSEMBLED_JSON_DIR] => Self::AssembledJson,
            _ => return None,
        };
        Some(area)
    }

    fn parse(self, file_name: &str) -> Option<FileNameMatch> {
        let parsers = match self {
            Self::Root | Self::RawResponses | Self::Work | Self::WorkRawResponses => STAGE_PARSERS,
            Self::Prompts => PROMPT_PARSERS,
            Self::Context => CONTEXT_PARSERS,
            Self::AssembledJson => ASSEMBLED_PARSERS,
            Self::Documents => DOCUMENT_PARSERS,
        };
        first_match(parsers, file_name)
    }

    /// Where the constructor places a recognized stage artifact.
    fn expected_for(matched: &FileNameMatch) -> Option<Self> {
        let in_work = matched.belongs_in_work_dir();
        let area = match matched.file_type {
            FileType::SeedPrompt | FileType::UserFeedback => Self::Root,
            FileType::ContributionDocument | FileType::RenderedDocument => Self::Documents,
            FileType::RagContextSummary => Self::Work,
            FileType::PlannerPrompt | FileType::TurnPrompt => Self::Prompts,
            FileType::HeaderContext => Self::Context,
            FileType::AssembledDocumentJson => Self::AssembledJson,
            FileType::ModelContributionMain if in_work => Self::Work,
            FileType::ModelContributionMain => Self::Root,
            FileType::ModelContributionRawJson if in_work => Self::WorkRawResponses,
            FileType::ModelContributionRawJson => Self::RawResponses,
            _ => return None,
        };
        Some(area)
    }
}

/// Resolved directory position
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Location {
    ProjectRoot,
    ProjectFolder(FileType),
    Stage {
        short_session_id: String,
        iteration: u32,
        stage_dir_name: String,
        stage_slug: &'static str,
        area: StageArea,
    },
}

fn project_folder(segment: &str) -> Option<FileType> {
    match segment {
        PENDING_DIR => Some(FileType::PendingFile),
        CURRENT_DIR => Some(FileType::CurrentFile),
        COMPLETE_DIR => Some(FileType::CompleteFile),
        GENERAL_RESOURCE_DIR => Some(FileType::GeneralResource),
        _ => None,
    }
}

fn short_session_id(segment: &str) -> Option<String> {
    let id = segment.strip_prefix(SESSION_PREFIX)?;
    let valid = !id.is_empty()
        && id.len() <= SHORT_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase());
    valid.then(|| id.to_string())
}

fn iteration(segment: &str) -> Option<u32> {
    let digits = segment.strip_prefix(ITERATION_PREFIX)?;
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|n: &u32| *n > 0)
}

/// Split a storage directory into project id and location.
pub(crate) fn parse_directory(storage_dir: &str) -> Result<(String, Location), String> {
    let unrecognized = || format!("unrecognized storage directory: '{storage_dir}'");
    let segments: Vec<&str> = storage_dir.split('/').filter(|s| !s.is_empty()).collect();

    let location = match segments.as_slice() {
        [] => return Err("storage directory is empty".to_string()),
        [_] => Location::ProjectRoot,
        [_, folder] => Location::ProjectFolder(project_folder(folder).ok_or_else(unrecognized)?),
        [_, session, iter, stage, rest @ ..] => {
            let short_session_id = short_session_id(session).ok_or_else(unrecognized)?;
            let iteration = iteration(iter).ok_or_else(unrecognized)?;
            let stage_slug = stage_slug_from_dir(stage)
                .ok_or_else(|| format!("unknown stage directory: '{stage}'"))?;
            let area = StageArea::from_segments(rest).ok_or_else(unrecognized)?;
            Location::Stage {
                short_session_id,
                iteration,
                stage_dir_name: (*stage).to_string(),
                stage_slug,
                area,
            }
        }
        _ => return Err(unrecognized()),
    };

    let project_id = segments[0];
    if !is_safe_segment(project_id) {
        return Err(unrecognized());
    }
    Ok((project_id.to_string(), location))
}

fn deconstruct(input: &DeconstructInput) -> Result<DeconstructedPathInfo, String> {
    let DeconstructInput {
        storage_dir,
        file_name,
    } = input;
    if !is_safe_segment(file_name) {
        return Err(format!("invalid file name: '{file_name}'"));
    }
    let (project_id, location) = parse_directory(storage_dir)?;
    let no_match = || format!("no filename convention matches '{file_name}' in '{storage_dir}'");

    let mut info = DeconstructedPathInfo {
        project_id: Some(project_id),
        parsed_file_name_from_path: Some(file_name.clone()),
        ..DeconstructedPathInfo::default()
    };

    let matched = match location {
        Location::ProjectRoot => first_match(PROJECT_ROOT_PARSERS, file_name).ok_or_else(no_match)?,
        Location::ProjectFolder(file_type) => user_file(file_type, file_name),
        Location::Stage {
            short_session_id,
            iteration,
            stage_dir_name,
            stage_slug,
            area,
        } => {
            let matched = area.parse(file_name).ok_or_else(no_match)?;
            if StageArea::expected_for(&matched) != Some(area) {
                return Err(format!(
                    "'{file_name}' is a {} but sits in '{storage_dir}'",
                    matched.file_type
                ));
            }
            if let Some(feedback_stage) = matched.stage_slug.as_deref() {
                if feedback_stage != stage_slug {
                    return Err(format!(
                        "'{file_name}' names stage '{feedback_stage}' but sits in '{stage_dir_name}'"
                    ));
                }
            }
            info.short_session_id = Some(short_session_id);
            info.iteration = Some(iteration);
            info.stage_dir_name = Some(stage_dir_name);
            info.stage_slug = Some(stage_slug.to_string());
            matched
        }
    };

    if let Some(ambiguity) = matched.ambiguity {
        return Err(format!("ambiguous file name '{file_name}': {ambiguity}"));
    }

    info.file_type_guess = Some(matched.file_type);
    info.contribution_type = matched.contribution_type;
    info.model_slug = matched.model_slug;
    info.attempt_count = matched.attempt_count;
    info.document_key = matched.document_key;
    if matched.contribution_type == Some(ContributionType::Antithesis) {
        info.source_model_slug = matched.source_model_slugs.first().cloned();
    }
    info.source_model_slugs = matched.source_model_slugs;
    info.source_contribution_type = matched.source_anchor_type.as_deref().and_then(anchor_phase);
    info.source_anchor_type = matched.source_anchor_type;
    info.source_anchor_model_slug = matched.source_anchor_model_slug;
    info.source_attempt_count = matched.source_attempt_count;
    info.paired_model_slug = matched.paired_model_slug;
    info.is_continuation = matched.turn_index.is_some();
    info.turn_index = matched.turn_index;
    info.source_group_fragment = matched.source_group_fragment;
    info.original_file_name = matched.original_file_name;
    Ok(info)
}

/// Debate phase named by an anchor type, if any.
fn anchor_phase(anchor: &str) -> Option<ContributionType> {
    ContributionType::from_str(anchor).ok().or_else(|| {
        DocumentKey::from_str(anchor)
            .ok()
            .and_then(|key| key.contribution_type())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STAGE: &str = "proj/session_7f3a9c12/iteration_1/3_synthesis";

    fn run(dir: &str, file: &str) -> DeconstructedPathInfo {
        deconstruct_storage_path(&DeconstructInput::new(dir, file))
    }

    #[test]
    fn directory_locations() {
        assert_eq!(parse_directory("p").unwrap(), ("p".to_string(), Location::ProjectRoot));
        assert_eq!(
            parse_directory("/p/Pending/").unwrap().1,
            Location::ProjectFolder(FileType::PendingFile)
        );
        let (_, location) = parse_directory(&format!("{STAGE}/_work/prompts")).unwrap();
        assert!(matches!(
            location,
            Location::Stage { area: StageArea::Prompts, stage_slug: "synthesis", iteration: 1, .. }
        ));
    }

    #[test]
    fn directory_rejections() {
        assert!(parse_directory("").is_err());
        assert!(parse_directory("p/Archive").is_err());
        assert!(parse_directory("p/session_abc/iteration_0/1_thesis").is_err());
        assert!(parse_directory("p/session_abc/iteration_1/9_review").is_err());
        assert!(parse_directory("p/session_ABC/iteration_1/1_thesis").is_err());
        assert!(parse_directory("p/session_abc/iteration_1/1_thesis/_work/other").is_err());
        assert!(parse_directory("p/session_abc/iteration_1").is_err());
    }

    #[test]
    fn project_files() {
        let readme = run("p", "project_readme.md");
        assert_eq!(readme.file_type_guess, Some(FileType::ProjectReadme));
        assert_eq!(readme.project_id.as_deref(), Some("p"));
        assert_eq!(readme.short_session_id, None);

        let pending = run("p/Pending", "draft.md");
        assert_eq!(pending.file_type_guess, Some(FileType::PendingFile));
        assert_eq!(pending.original_file_name.as_deref(), Some("draft.md"));
    }

    #[test]
    fn stage_contribution() {
        let info = run(STAGE, "gpt-4_2_synthesis.md");
        assert_eq!(info.short_session_id.as_deref(), Some("7f3a9c12"));
        assert_eq!(info.stage_dir_name.as_deref(), Some("3_synthesis"));
        assert_eq!(info.stage_slug.as_deref(), Some("synthesis"));
        assert_eq!(info.contribution_type, Some(ContributionType::Synthesis));
        assert_eq!(info.attempt_count, Some(2));
        assert!(!info.is_continuation);
        assert_eq!(info.parsed_file_name_from_path.as_deref(), Some("gpt-4_2_synthesis.md"));
    }

    #[test]
    fn antithesis_exposes_single_source() {
        let info = run(
            "p/session_abc/iteration_1/2_antithesis",
            "a_critiquing_(b's_business_case_1)_0_antithesis.md",
        );
        assert_eq!(info.source_model_slug.as_deref(), Some("b"));
        assert_eq!(info.source_model_slugs, vec!["b".to_string()]);
        assert_eq!(info.source_contribution_type, Some(ContributionType::Thesis));
    }

    #[test]
    fn misplaced_contribution_is_an_error() {
        let info = run(&format!("{STAGE}/_work"), "gpt-4_0_synthesis.md");
        assert!(info.error.unwrap().contains("sits in"));

        let chunk = "a_synthesizing_b_with_c_on_thesis_0_pairwise_synthesis_chunk.md";
        assert!(run(STAGE, chunk).error.is_some());
        assert!(run(&format!("{STAGE}/_work"), chunk).error.is_none());
    }

    #[test]
    fn user_feedback_stage_must_match_directory() {
        assert!(run(STAGE, "user_feedback_synthesis.md").is_recognized());
        assert!(!run(STAGE, "user_feedback_thesis.md").is_recognized());
    }

    #[test]
    fn ambiguous_tail_is_an_error() {
        let info = run(
            &format!("{STAGE}/_work"),
            "a_synthesizing_b_with_c_on_phase_2_0_pairwise_synthesis_chunk.md",
        );
        assert!(info.error.as_deref().unwrap().starts_with("ambiguous file name"));
    }

    #[test]
    fn failure_clears_every_field() {
        let info = run(STAGE, "not a contribution.txt");
        assert_eq!(
            info,
            DeconstructedPathInfo::failed(format!(
                "no filename convention matches 'not a contribution.txt' in '{STAGE}'"
            ))
        );
    }

    #[test]
    fn file_name_must_be_a_segment() {
        assert!(run("p", "").error.is_some());
        assert!(run("p", "..").error.is_some());
        assert!(run("p", "a/b.md").error.is_some());
    }

    #[test]
    fn info_json_is_camel_case() {
        let info = run(
            &format!("{STAGE}/_work/prompts"),
            "m_0_business_case_continuation_2_prompt.md",
        );
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["fileTypeGuess"], "turn_prompt");
        assert_eq!(json["documentKey"], "business_case");
        assert_eq!(json["turnIndex"], 2);
        assert_eq!(json["isContinuation"], true);
        assert!(json.get("error").is_none());
    }
}
