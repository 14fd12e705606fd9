//! Filename grammar
//!
//! Each parser recognizes one filename convention and returns the fields
//! it encodes, or `None` when the convention does not apply. The
//! deconstructor tries an ordered slice of parsers per directory location;
//! the first match wins, so more specific conventions come first.
//!
//! Model slugs use the `[a-z0-9.-]` alphabet and never contain `_`; every
//! pattern relies on that to find token boundaries.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::construct::{
    MARKDOWN_EXT, MASTER_PLAN_FILE, RAW_JSON_SUFFIX, README_FILE, RESERVED_PLANNER_KEY,
    SEED_PROMPT_FILE, SETTINGS_FILE, ZIP_EXT,
};
use crate::file_type::{is_known_anchor, ContributionType, FileType};
use crate::sanitize::is_fragment_token;

/// Recognizes one filename convention
pub(crate) type FileNameParser = fn(&str) -> Option<FileNameMatch>;

/// Fields recovered from a filename
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FileNameMatch {
    pub(crate) file_type: FileType,
    pub(crate) contribution_type: Option<ContributionType>,
    pub(crate) model_slug: Option<String>,
    pub(crate) attempt_count: Option<u32>,
    pub(crate) document_key: Option<String>,
    pub(crate) source_model_slugs: Vec<String>,
    pub(crate) source_anchor_type: Option<String>,
    pub(crate) source_anchor_model_slug: Option<String>,
    pub(crate) source_attempt_count: Option<u32>,
    pub(crate) paired_model_slug: Option<String>,
    pub(crate) turn_index: Option<u32>,
    pub(crate) source_group_fragment: Option<String>,
    pub(crate) original_file_name: Option<String>,
    pub(crate) stage_slug: Option<String>,
    /// Set when the name fits the convention in more than one way
    pub(crate) ambiguity: Option<String>,
}

impl FileNameMatch {
    fn of(file_type: FileType) -> Self {
        Self {
            file_type,
            contribution_type: None,
            model_slug: None,
            attempt_count: None,
            document_key: None,
            source_model_slugs: Vec::new(),
            source_anchor_type: None,
            source_anchor_model_slug: None,
            source_attempt_count: None,
            paired_model_slug: None,
            turn_index: None,
            source_group_fragment: None,
            original_file_name: None,
            stage_slug: None,
            ambiguity: None,
        }
    }

    fn with_model(mut self, caps: &Captures<'_>) -> Option<Self> {
        self.model_slug = Some(caps["model"].to_string());
        self.attempt_count = Some(caps["attempt"].parse().ok()?);
        Some(self)
    }

    /// Whether the constructor would place this artifact in `_work`.
    pub(crate) fn belongs_in_work_dir(&self) -> bool {
        match self.file_type {
            FileType::ModelContributionMain | FileType::ModelContributionRawJson => {
                self.turn_index.is_some()
                    || self
                        .contribution_type
                        .is_some_and(|t| t.is_intermediate())
            }
            FileType::RagContextSummary
            | FileType::PlannerPrompt
            | FileType::TurnPrompt
            | FileType::HeaderContext
            | FileType::AssembledDocumentJson => true,
            _ => false,
        }
    }
}

fn pattern(source: &str) -> Regex {
    Regex::new(source).expect("valid filename regex")
}

macro_rules! slug {
    () => {
        r"[a-z0-9.\-]+"
    };
}

static CONTINUATION_RE: Lazy<Regex> =
    Lazy::new(|| pattern(r"^(?P<stem>.+)_continuation_(?P<turn>\d+)$"));

static SIMPLE_RE: Lazy<Regex> = Lazy::new(|| {
    pattern(concat!(
        r"^(?P<model>",
        slug!(),
        r")_(?P<attempt>\d+)_(?P<kind>final_synthesis|thesis|synthesis|parenthesis|paralysis)$"
    ))
});

static ANTITHESIS_RE: Lazy<Regex> = Lazy::new(|| {
    pattern(concat!(
        r"^(?P<model>",
        slug!(),
        r")_critiquing_\((?P<source>",
        slug!(),
        r")'s_(?P<anchor>[a-z0-9_]+)_(?P<source_attempt>\d+)\)(?:_(?P<fragment>[0-9a-f]{1,8}))?_(?P<attempt>\d+)_antithesis$"
    ))
});

static PAIRWISE_RE: Lazy<Regex> = Lazy::new(|| {
    pattern(concat!(
        r"^(?P<model>",
        slug!(),
        r")_synthesizing_(?P<anchor_model>",
        slug!(),
        r")_with_(?P<paired>",
        slug!(),
        r")_on_(?P<tail>[a-z0-9_]+)_(?P<attempt>\d+)_pairwise_synthesis_chunk$"
    ))
});

static REDUCED_RE: Lazy<Regex> = Lazy::new(|| {
    pattern(concat!(
        r"^(?P<model>",
        slug!(),
        r")_reducing_(?P<anchor>[a-z0-9_]+?)_by_(?P<anchor_model>",
        slug!(),
        r")(?:_(?P<fragment>[0-9a-f]{1,8}))?_(?P<attempt>\d+)_reduced_synthesis$"
    ))
});

static USER_FEEDBACK_RE: Lazy<Regex> =
    Lazy::new(|| pattern(r"^user_feedback_(?P<stage>[a-z0-9_]+)\.md$"));

static RAG_SUMMARY_RE: Lazy<Regex> = Lazy::new(|| {
    pattern(concat!(
        r"^(?P<model>",
        slug!(),
        r")_compressing_(?P<sources>[a-z0-9.\-_]+)_rag_summary\.txt$"
    ))
});

static PLANNER_PROMPT_RE: Lazy<Regex> = Lazy::new(|| {
    pattern(concat!(
        r"^(?P<model>",
        slug!(),
        r")_(?P<attempt>\d+)_planner_prompt\.md$"
    ))
});

static TURN_PROMPT_RE: Lazy<Regex> = Lazy::new(|| {
    pattern(concat!(
        r"^(?P<model>",
        slug!(),
        r")_(?P<attempt>\d+)_(?P<key>[a-z0-9_]+?)(?:_continuation_(?P<turn>\d+))?_prompt\.md$"
    ))
});

static HEADER_CONTEXT_RE: Lazy<Regex> = Lazy::new(|| {
    pattern(concat!(
        r"^(?P<model>",
        slug!(),
        r")_(?P<attempt>\d+)(?:_(?P<fragment>[0-9a-f]{1,8}))?_header_context\.json$"
    ))
});

static ASSEMBLED_RE: Lazy<Regex> = Lazy::new(|| {
    pattern(concat!(
        r"^(?P<model>",
        slug!(),
        r")_(?P<attempt>\d+)_(?P<key>[a-z0-9_]+)_assembled\.json$"
    ))
});

static RENDERED_RE: Lazy<Regex> = Lazy::new(|| {
    pattern(concat!(
        r"^(?P<model>",
        slug!(),
        r")_(?P<attempt>\d+)_(?P<key>[a-z0-9_]+)\.md$"
    ))
});

// Parser tables, in priority order per location.

pub(crate) const PROJECT_ROOT_PARSERS: &[FileNameParser] = &[
    parse_readme,
    parse_settings,
    parse_master_plan,
    parse_export_zip,
    parse_initial_user_prompt,
];

pub(crate) const STAGE_PARSERS: &[FileNameParser] = &[
    parse_seed_prompt,
    parse_user_feedback,
    parse_rag_summary,
    parse_model_contribution,
];

pub(crate) const PROMPT_PARSERS: &[FileNameParser] = &[parse_planner_prompt, parse_turn_prompt];

pub(crate) const CONTEXT_PARSERS: &[FileNameParser] = &[parse_header_context];

pub(crate) const ASSEMBLED_PARSERS: &[FileNameParser] = &[parse_assembled_document];

pub(crate) const DOCUMENT_PARSERS: &[FileNameParser] =
    &[parse_rendered_document, parse_contribution_document];

/// First parser in `parsers` that recognizes `file_name`.
pub(crate) fn first_match(parsers: &[FileNameParser], file_name: &str) -> Option<FileNameMatch> {
    parsers.iter().find_map(|parse| parse(file_name))
}

fn parse_readme(file_name: &str) -> Option<FileNameMatch> {
    (file_name == README_FILE).then(|| FileNameMatch::of(FileType::ProjectReadme))
}

fn parse_settings(file_name: &str) -> Option<FileNameMatch> {
    (file_name == SETTINGS_FILE).then(|| FileNameMatch::of(FileType::ProjectSettingsFile))
}

fn parse_master_plan(file_name: &str) -> Option<FileNameMatch> {
    (file_name == MASTER_PLAN_FILE).then(|| FileNameMatch::of(FileType::ProjectMasterPlan))
}

fn parse_export_zip(file_name: &str) -> Option<FileNameMatch> {
    file_name
        .ends_with(ZIP_EXT)
        .then(|| user_file(FileType::ProjectExportZip, file_name))
}

fn parse_initial_user_prompt(file_name: &str) -> Option<FileNameMatch> {
    Some(user_file(FileType::InitialUserPrompt, file_name))
}

fn parse_contribution_document(file_name: &str) -> Option<FileNameMatch> {
    Some(user_file(FileType::ContributionDocument, file_name))
}

/// Any name under a project subfolder belongs to that folder's file type.
pub(crate) fn user_file(file_type: FileType, file_name: &str) -> FileNameMatch {
    let mut matched = FileNameMatch::of(file_type);
    matched.original_file_name = Some(file_name.to_string());
    matched
}

fn parse_seed_prompt(file_name: &str) -> Option<FileNameMatch> {
    (file_name == SEED_PROMPT_FILE).then(|| FileNameMatch::of(FileType::SeedPrompt))
}

fn parse_user_feedback(file_name: &str) -> Option<FileNameMatch> {
    let caps = USER_FEEDBACK_RE.captures(file_name)?;
    let mut matched = FileNameMatch::of(FileType::UserFeedback);
    matched.stage_slug = Some(caps["stage"].to_string());
    Some(matched)
}

fn parse_rag_summary(file_name: &str) -> Option<FileNameMatch> {
    let caps = RAG_SUMMARY_RE.captures(file_name)?;
    let sources = split_and_list(&caps["sources"])?;
    let mut matched = FileNameMatch::of(FileType::RagContextSummary);
    matched.model_slug = Some(caps["model"].to_string());
    matched.source_model_slugs = sources;
    Some(matched)
}

/// `a_and_b_and_c` → `[a, b, c]`. Slugs contain no `_`, so tokens
/// alternate strictly between slug and `and`.
fn split_and_list(joined: &str) -> Option<Vec<String>> {
    let mut slugs = Vec::new();
    for (index, token) in joined.split('_').enumerate() {
        if index % 2 == 1 {
            if token != "and" {
                return None;
            }
        } else if token.is_empty() {
            return None;
        } else {
            slugs.push(token.to_string());
        }
    }
    (joined.split('_').count() % 2 == 1).then_some(slugs)
}

/// Model contributions: `{stem}[_continuation_{n}](.md|_raw.json)`.
fn parse_model_contribution(file_name: &str) -> Option<FileNameMatch> {
    let (stem, file_type) = if let Some(stem) = file_name.strip_suffix(RAW_JSON_SUFFIX) {
        (stem, FileType::ModelContributionRawJson)
    } else {
        (
            file_name.strip_suffix(MARKDOWN_EXT)?,
            FileType::ModelContributionMain,
        )
    };

    let (stem, turn_index) = match CONTINUATION_RE.captures(stem) {
        Some(caps) => {
            let turn: u32 = caps["turn"].parse().ok()?;
            let stem = caps.name("stem").map_or(stem, |m| m.as_str());
            (stem, Some(turn))
        }
        None => (stem, None),
    };

    let mut matched = first_match(CONTRIBUTION_STEM_PARSERS, stem)?;
    matched.file_type = file_type;
    matched.turn_index = turn_index;
    Some(matched)
}

/// Contribution stems, most specific first.
const CONTRIBUTION_STEM_PARSERS: &[FileNameParser] = &[
    contribution_antithesis,
    contribution_pairwise,
    contribution_reduced,
    contribution_simple,
];

fn contribution_antithesis(stem: &str) -> Option<FileNameMatch> {
    if !stem.contains("_critiquing_(") {
        return None;
    }
    let caps = ANTITHESIS_RE.captures(stem)?;
    let mut matched = FileNameMatch::of(FileType::ModelContributionMain).with_model(&caps)?;
    matched.contribution_type = Some(ContributionType::Antithesis);
    matched.source_model_slugs = vec![caps["source"].to_string()];
    matched.source_anchor_type = Some(caps["anchor"].to_string());
    matched.source_attempt_count = Some(caps["source_attempt"].parse().ok()?);
    matched.source_group_fragment = caps.name("fragment").map(|m| m.as_str().to_string());
    Some(matched)
}

fn contribution_pairwise(stem: &str) -> Option<FileNameMatch> {
    let caps = PAIRWISE_RE.captures(stem)?;
    let mut matched = FileNameMatch::of(FileType::ModelContributionMain).with_model(&caps)?;
    matched.contribution_type = Some(ContributionType::PairwiseSynthesisChunk);
    matched.source_anchor_model_slug = Some(caps["anchor_model"].to_string());
    matched.paired_model_slug = Some(caps["paired"].to_string());
    match split_anchor_tail(&caps["tail"]) {
        AnchorTail::Resolved { anchor, fragment } => {
            matched.source_anchor_type = Some(anchor);
            matched.source_group_fragment = fragment;
        }
        AnchorTail::Ambiguous => {
            matched.ambiguity = Some(format!(
                "anchor segment '{}' could be an anchor type or an anchor type plus fragment",
                &caps["tail"]
            ));
        }
    }
    Some(matched)
}

fn contribution_reduced(stem: &str) -> Option<FileNameMatch> {
    let caps = REDUCED_RE.captures(stem)?;
    let mut matched = FileNameMatch::of(FileType::ModelContributionMain).with_model(&caps)?;
    matched.contribution_type = Some(ContributionType::ReducedSynthesis);
    matched.source_anchor_type = Some(caps["anchor"].to_string());
    matched.source_anchor_model_slug = Some(caps["anchor_model"].to_string());
    matched.source_group_fragment = caps.name("fragment").map(|m| m.as_str().to_string());
    Some(matched)
}

fn contribution_simple(stem: &str) -> Option<FileNameMatch> {
    let caps = SIMPLE_RE.captures(stem)?;
    let mut matched = FileNameMatch::of(FileType::ModelContributionMain).with_model(&caps)?;
    matched.contribution_type = Some(caps["kind"].parse().ok()?);
    Some(matched)
}

/// Outcome of splitting `{anchor}[_{fragment}]` when the anchor itself may
/// contain `_`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AnchorTail {
    Resolved {
        anchor: String,
        fragment: Option<String>,
    },
    Ambiguous,
}

/// Resolve an anchor tail against the known anchor vocabulary.
///
/// - whole tail is a known anchor: no fragment
/// - head is a known anchor and the last token is fragment-shaped: fragment
/// - last token is fragment-shaped but neither reading is known: ambiguous
/// - otherwise the whole tail is an (unknown) anchor type
pub(crate) fn split_anchor_tail(tail: &str) -> AnchorTail {
    if is_known_anchor(tail) {
        return AnchorTail::Resolved {
            anchor: tail.to_string(),
            fragment: None,
        };
    }
    match tail.rsplit_once('_') {
        Some((head, last)) if is_fragment_token(last) => {
            if is_known_anchor(head) {
                AnchorTail::Resolved {
                    anchor: head.to_string(),
                    fragment: Some(last.to_string()),
                }
            } else {
                AnchorTail::Ambiguous
            }
        }
        _ => AnchorTail::Resolved {
            anchor: tail.to_string(),
            fragment: None,
        },
    }
}

fn parse_planner_prompt(file_name: &str) -> Option<FileNameMatch> {
    let caps = PLANNER_PROMPT_RE.captures(file_name)?;
    FileNameMatch::of(FileType::PlannerPrompt).with_model(&caps)
}

fn parse_turn_prompt(file_name: &str) -> Option<FileNameMatch> {
    let caps = TURN_PROMPT_RE.captures(file_name)?;
    let mut matched = FileNameMatch::of(FileType::TurnPrompt).with_model(&caps)?;
    let key = &caps["key"];
    if key == RESERVED_PLANNER_KEY {
        return None;
    }
    matched.document_key = Some(key.to_string());
    matched.turn_index = match caps.name("turn") {
        Some(turn) => Some(turn.as_str().parse().ok()?),
        None => None,
    };
    Some(matched)
}

fn parse_header_context(file_name: &str) -> Option<FileNameMatch> {
    let caps = HEADER_CONTEXT_RE.captures(file_name)?;
    let mut matched = FileNameMatch::of(FileType::HeaderContext).with_model(&caps)?;
    matched.source_group_fragment = caps.name("fragment").map(|m| m.as_str().to_string());
    Some(matched)
}

fn parse_assembled_document(file_name: &str) -> Option<FileNameMatch> {
    let caps = ASSEMBLED_RE.captures(file_name)?;
    let mut matched = FileNameMatch::of(FileType::AssembledDocumentJson).with_model(&caps)?;
    matched.document_key = Some(caps["key"].to_string());
    Some(matched)
}

fn parse_rendered_document(file_name: &str) -> Option<FileNameMatch> {
    let caps = RENDERED_RE.captures(file_name)?;
    let mut matched = FileNameMatch::of(FileType::RenderedDocument).with_model(&caps)?;
    matched.document_key = Some(caps["key"].to_string());
    Some(matched)
}
