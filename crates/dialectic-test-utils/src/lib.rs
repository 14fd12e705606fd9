//! Testing utilities for the dialectic workspace
//!
//! Shared fixtures, proptest strategies, and assertions.

#![allow(missing_docs)]

use dialectic_paths::{
    construct_storage_path, deconstruct_storage_path, sanitize_key, ConstructedPath,
    ContributionType, DeconstructInput, DeconstructedPathInfo, DocumentKey, FileType, PathContext,
    STAGES,
};
use proptest::prelude::*;
use proptest::sample::select;

pub const PROJECT: &str = "proj";
pub const SESSION: &str = "7f3a9c12-0b4d-4e5f-8a6b-123456789abc";
pub const SHORT_SESSION: &str = "7f3a9c12";

/// Fresh random session id
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Stage-level context in the fixture project and session
pub fn stage_context(stage: &str, file_type: FileType) -> PathContext {
    PathContext::for_stage(PROJECT, SESSION, 1, stage, file_type)
}

/// Main contribution of `model` at attempt 0
pub fn contribution(stage: &str, contribution_type: ContributionType, model: &str) -> PathContext {
    stage_context(stage, FileType::ModelContributionMain)
        .with_model(model, 0)
        .with_contribution_type(contribution_type)
}

pub fn antithesis(model: &str, source: &str) -> PathContext {
    contribution("antithesis", ContributionType::Antithesis, model)
        .with_source_model(source)
        .with_anchor_type("thesis")
        .with_source_attempt(0)
}

pub fn pairwise_chunk(model: &str, anchor_model: &str, paired: &str) -> PathContext {
    contribution("synthesis", ContributionType::PairwiseSynthesisChunk, model)
        .with_anchor("business_case", anchor_model)
        .with_paired_model(paired)
}

pub fn reduced_synthesis(model: &str, anchor_model: &str) -> PathContext {
    contribution("synthesis", ContributionType::ReducedSynthesis, model)
        .with_anchor("business_case", anchor_model)
}

/// Same context, raw JSON half
pub fn raw_json(mut context: PathContext) -> PathContext {
    context.file_type = FileType::ModelContributionRawJson;
    context
}

/// One valid context per constructor branch.
pub fn every_branch() -> Vec<PathContext> {
    let project = |file_type| PathContext::for_project(PROJECT, file_type);
    let uploaded = |file_type| project(file_type).with_original_file_name("Draft Notes.md");
    let simple = [
        ("thesis", ContributionType::Thesis),
        ("synthesis", ContributionType::Synthesis),
        ("synthesis", ContributionType::FinalSynthesis),
        ("parenthesis", ContributionType::Parenthesis),
        ("paralysis", ContributionType::Paralysis),
    ];

    let mut contexts = vec![
        project(FileType::ProjectReadme),
        project(FileType::ProjectSettingsFile),
        project(FileType::ProjectMasterPlan),
        project(FileType::ProjectExportZip).with_original_file_name("export"),
        uploaded(FileType::InitialUserPrompt),
        uploaded(FileType::GeneralResource),
        uploaded(FileType::PendingFile),
        uploaded(FileType::CurrentFile),
        uploaded(FileType::CompleteFile),
        stage_context("thesis", FileType::SeedPrompt),
        stage_context("antithesis", FileType::UserFeedback),
        stage_context("thesis", FileType::ContributionDocument).with_original_file_name("brief.md"),
    ];

    let mut model_contributions: Vec<PathContext> = simple
        .iter()
        .map(|(stage, kind)| contribution(stage, *kind, "gpt-4-turbo"))
        .collect();
    model_contributions.extend([
        antithesis("gpt-4-turbo", "claude-3-opus"),
        antithesis("gpt-4-turbo", "claude-3-opus").with_fragment("ab12"),
        pairwise_chunk("gpt-4-turbo", "claude-3-opus", "gemini-pro"),
        pairwise_chunk("gpt-4-turbo", "claude-3-opus", "gemini-pro").with_fragment("9f"),
        reduced_synthesis("gpt-4-turbo", "claude-3-opus"),
        reduced_synthesis("gpt-4-turbo", "claude-3-opus").with_fragment("c0ffee"),
        contribution("thesis", ContributionType::Thesis, "gpt-4-turbo").with_continuation(2),
    ]);
    let raw: Vec<PathContext> = model_contributions.iter().cloned().map(raw_json).collect();
    contexts.extend(model_contributions);
    contexts.extend(raw);

    let process = |file_type| stage_context("thesis", file_type).with_model("gpt-4-turbo", 1);
    contexts.extend([
        process(FileType::PlannerPrompt),
        process(FileType::TurnPrompt).with_document_key("business_case"),
        process(FileType::TurnPrompt)
            .with_document_key("business_case")
            .with_continuation(2),
        process(FileType::HeaderContext),
        process(FileType::HeaderContext).with_fragment("deadbeef"),
        process(FileType::AssembledDocumentJson).with_document_key("feature_spec"),
        process(FileType::RenderedDocument).with_document_key("feature_spec"),
        rag_summary("gpt-4-turbo", &["claude-3-opus", "gemini-pro"]),
    ]);
    contexts
}

/// RAG summary by `model` over `sources`. Summaries carry no attempt.
pub fn rag_summary(model: &str, sources: &[&str]) -> PathContext {
    let mut context = stage_context("synthesis", FileType::RagContextSummary);
    context.model_slug = Some(model.to_string());
    for source in sources {
        context = context.with_source_model(*source);
    }
    context
}

/// Construct, then deconstruct the result.
///
/// # Panics
/// When `context` does not construct.
pub fn round_trip(context: &PathContext) -> (ConstructedPath, DeconstructedPathInfo) {
    let path = construct_storage_path(context)
        .unwrap_or_else(|err| panic!("{:?} failed to construct: {err}", context.file_type));
    let info = deconstruct_storage_path(&DeconstructInput::from(&path));
    (path, info)
}

/// Every anchor type the deconstructor can split unambiguously
pub fn known_anchors() -> Vec<&'static str> {
    ContributionType::ALL
        .iter()
        .map(ContributionType::as_str)
        .chain(DocumentKey::ALL.iter().map(DocumentKey::as_str))
        .collect()
}

// Strategies

pub fn model_slug() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9.-]{0,15}"
}

pub fn project_id() -> impl Strategy<Value = String> {
    "[a-z0-9][a-z0-9-]{0,15}"
}

pub fn fragment() -> impl Strategy<Value = String> {
    "[0-9a-f]{1,8}"
}

pub fn stage_slug() -> impl Strategy<Value = &'static str> {
    select(STAGES.iter().map(|(_, slug)| *slug).collect::<Vec<_>>())
}

pub fn anchor_type() -> impl Strategy<Value = &'static str> {
    select(known_anchors())
}

pub fn document_key() -> impl Strategy<Value = &'static str> {
    select(DocumentKey::ALL.iter().map(DocumentKey::as_str).collect::<Vec<_>>())
}

/// Free-form key as `sanitize_key` leaves it, biased towards the grammar's
/// own tokens.
pub fn free_key() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z0-9]{1,6}(_[a-z0-9]{1,6}){0,3}",
        "[a-z]{1,6}_(continuation|by|and|on|with)_[0-9a-f]{1,3}",
        "[a-z]{1,6}_continuation_[0-9]{1,2}",
        (anchor_type(), "[0-9a-f]{1,4}").prop_map(|(anchor, tail)| format!("{anchor}_{tail}")),
    ]
    .prop_map(|raw| sanitize_key(&raw))
}

pub fn any_anchor_type() -> impl Strategy<Value = String> {
    prop_oneof![anchor_type().prop_map(String::from), free_key()]
}

pub fn any_document_key() -> impl Strategy<Value = String> {
    prop_oneof![document_key().prop_map(String::from), free_key()]
}

/// Lineage contributions and keyed document artifacts over free-form
/// anchor types and document keys. Slugs come from a small pool so that
/// batches share everything but the keys.
pub fn free_form_context() -> impl Strategy<Value = PathContext> {
    let slug = || select(vec!["m", "by", "ab", "and", "on"]);
    let file_type = prop_oneof![
        Just(FileType::ModelContributionMain),
        Just(FileType::TurnPrompt),
        Just(FileType::AssembledDocumentJson),
        Just(FileType::RenderedDocument),
    ];
    let lineage = prop_oneof![
        Just(ContributionType::Antithesis),
        Just(ContributionType::PairwiseSynthesisChunk),
        Just(ContributionType::ReducedSynthesis),
    ];
    (
        file_type,
        lineage,
        (slug(), slug(), slug()),
        (any_anchor_type(), any_document_key()),
        proptest::option::of(fragment()),
        proptest::option::of(1..4u32),
    )
        .prop_map(|(file_type, kind, slugs, (anchor, key), fragment, turn)| {
            let (model, anchor_model, paired) = slugs;
            let mut context = stage_context("synthesis", file_type).with_model(model, 0);
            if file_type == FileType::ModelContributionMain {
                context = context.with_contribution_type(kind);
                context = match kind {
                    ContributionType::Antithesis => context
                        .with_source_model(anchor_model)
                        .with_anchor_type(anchor)
                        .with_source_attempt(0),
                    ContributionType::PairwiseSynthesisChunk => {
                        context.with_anchor(anchor, anchor_model).with_paired_model(paired)
                    }
                    _ => context.with_anchor(anchor, anchor_model),
                };
                if let Some(fragment) = fragment {
                    context = context.with_fragment(fragment);
                }
            } else {
                context = context.with_document_key(key);
            }
            if let (Some(turn), FileType::ModelContributionMain | FileType::TurnPrompt) =
                (turn, file_type)
            {
                context = context.with_continuation(turn);
            }
            context
        })
}

/// Stage coordinates: project, session, iteration, stage
pub fn stage_coordinates() -> impl Strategy<Value = (String, String, u32, &'static str)> {
    (project_id(), "[0-9a-f]{8}-[0-9a-f]{4}", 1..50u32, stage_slug())
}

/// Any model contribution context the grammar encodes unambiguously.
pub fn model_contribution() -> impl Strategy<Value = PathContext> {
    let lineage = prop_oneof![
        Just(ContributionType::Thesis),
        Just(ContributionType::Synthesis),
        Just(ContributionType::FinalSynthesis),
        Just(ContributionType::Parenthesis),
        Just(ContributionType::Paralysis),
        Just(ContributionType::Antithesis),
        Just(ContributionType::PairwiseSynthesisChunk),
        Just(ContributionType::ReducedSynthesis),
    ];
    (
        stage_coordinates(),
        lineage,
        (model_slug(), 0..100u32),
        (model_slug(), model_slug(), anchor_type(), 0..10u32),
        proptest::option::of(fragment()),
        proptest::option::of(1..10u32),
        any::<bool>(),
    )
        .prop_map(
            |(
                (project, session, iteration, stage),
                kind,
                (model, attempt),
                (source, paired, anchor, source_attempt),
                fragment,
                turn,
                raw,
            )| {
                let file_type = if raw {
                    FileType::ModelContributionRawJson
                } else {
                    FileType::ModelContributionMain
                };
                let mut context =
                    PathContext::for_stage(project, session, iteration, stage, file_type)
                        .with_model(model, attempt)
                        .with_contribution_type(kind);
                match kind {
                    ContributionType::Antithesis => {
                        context = context
                            .with_source_model(source)
                            .with_anchor_type(anchor)
                            .with_source_attempt(source_attempt);
                    }
                    ContributionType::PairwiseSynthesisChunk => {
                        context = context.with_anchor(anchor, source).with_paired_model(paired);
                    }
                    ContributionType::ReducedSynthesis => {
                        context = context.with_anchor(anchor, source);
                    }
                    _ => {}
                }
                if let (Some(fragment), true) = (fragment, has_fragment_slot(kind)) {
                    context = context.with_fragment(fragment);
                }
                if let Some(turn) = turn {
                    context = context.with_continuation(turn);
                }
                context
            },
        )
}

fn has_fragment_slot(kind: ContributionType) -> bool {
    matches!(
        kind,
        ContributionType::Antithesis
            | ContributionType::PairwiseSynthesisChunk
            | ContributionType::ReducedSynthesis
    )
}

/// Any document process artifact context.
pub fn document_process() -> impl Strategy<Value = PathContext> {
    let file_type = prop_oneof![
        Just(FileType::PlannerPrompt),
        Just(FileType::TurnPrompt),
        Just(FileType::HeaderContext),
        Just(FileType::AssembledDocumentJson),
        Just(FileType::RenderedDocument),
    ];
    (
        stage_coordinates(),
        file_type,
        (model_slug(), 0..100u32),
        document_key(),
        proptest::option::of(fragment()),
        proptest::option::of(1..10u32),
    )
        .prop_map(
            |(coordinates, file_type, (model, attempt), key, fragment, turn)| {
                let (project, session, iteration, stage) = coordinates;
                let mut context =
                    PathContext::for_stage(project, session, iteration, stage, file_type)
                        .with_model(model, attempt);
                match file_type {
                    FileType::TurnPrompt => {
                        context = context.with_document_key(key);
                        if let Some(turn) = turn {
                            context = context.with_continuation(turn);
                        }
                    }
                    FileType::HeaderContext => {
                        if let Some(fragment) = fragment {
                            context = context.with_fragment(fragment);
                        }
                    }
                    FileType::AssembledDocumentJson | FileType::RenderedDocument => {
                        context = context.with_document_key(key);
                    }
                    _ => {}
                }
                context
            },
        )
}
