use std::collections::{HashMap, HashSet};

use dialectic_paths::{
    construct_storage_path, deconstruct_storage_path, generate_short_id, ContributionType,
    DeconstructInput, FileType, PathContext,
};
use dialectic_test_utils::{
    document_process, free_form_context, model_contribution, model_slug, round_trip,
    stage_context, PROJECT,
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_model_contributions_round_trip(context in model_contribution()) {
        let (path, info) = round_trip(&context);
        prop_assert_eq!(info.error.as_deref(), None, "{}", path);
        prop_assert_eq!(info.file_type_guess, Some(context.file_type));
        prop_assert_eq!(info.project_id, context.project_id);
        prop_assert_eq!(
            info.short_session_id,
            context.session_id.as_deref().map(generate_short_id)
        );
        prop_assert_eq!(info.iteration, context.iteration);
        prop_assert_eq!(info.stage_slug, context.stage_slug);
        prop_assert_eq!(info.contribution_type, context.contribution_type);
        prop_assert_eq!(info.model_slug, context.model_slug);
        prop_assert_eq!(info.attempt_count, context.attempt_count);
        prop_assert_eq!(info.source_anchor_type, context.source_anchor_type);
        prop_assert_eq!(info.source_anchor_model_slug, context.source_anchor_model_slug);
        prop_assert_eq!(info.paired_model_slug, context.paired_model_slug);
        prop_assert_eq!(info.source_attempt_count, context.source_attempt_count);
        prop_assert_eq!(info.source_group_fragment, context.source_group_fragment);
        prop_assert_eq!(info.turn_index, context.turn_index);
        prop_assert_eq!(
            info.source_model_slugs,
            context.source_model_slugs.into_iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn prop_document_process_round_trip(context in document_process()) {
        let (path, info) = round_trip(&context);
        prop_assert_eq!(info.error.as_deref(), None, "{}", path);
        prop_assert_eq!(info.file_type_guess, Some(context.file_type));
        prop_assert_eq!(info.model_slug, context.model_slug);
        prop_assert_eq!(info.attempt_count, context.attempt_count);
        prop_assert_eq!(info.document_key, context.document_key);
        prop_assert_eq!(info.source_group_fragment, context.source_group_fragment);
        prop_assert_eq!(info.turn_index, context.turn_index);
        prop_assert_eq!(info.stage_slug, context.stage_slug);
    }

    /// Free-form keys either fail validation or read back unchanged.
    #[test]
    fn prop_free_form_keys_round_trip_or_reject(context in free_form_context()) {
        let Ok(path) = construct_storage_path(&context) else {
            return Ok(());
        };
        let info = deconstruct_storage_path(&DeconstructInput::from(&path));
        prop_assert_eq!(info.error.as_deref(), None, "{}", path);
        prop_assert_eq!(info.file_type_guess, Some(context.file_type));
        prop_assert_eq!(info.contribution_type, context.contribution_type);
        prop_assert_eq!(info.model_slug, context.model_slug);
        prop_assert_eq!(info.document_key, context.document_key);
        prop_assert_eq!(info.source_anchor_type, context.source_anchor_type);
        prop_assert_eq!(info.source_anchor_model_slug, context.source_anchor_model_slug);
        prop_assert_eq!(info.paired_model_slug, context.paired_model_slug);
        prop_assert_eq!(info.source_group_fragment, context.source_group_fragment);
        prop_assert_eq!(info.turn_index, context.turn_index);
        prop_assert_eq!(
            info.source_model_slugs,
            context.source_model_slugs.into_iter().collect::<Vec<_>>()
        );
    }

    #[test]
    fn prop_free_form_contexts_never_share_a_path(
        contexts in proptest::collection::vec(free_form_context(), 2..24),
    ) {
        let mut owners: HashMap<String, &PathContext> = HashMap::new();
        for context in &contexts {
            let Ok(path) = construct_storage_path(context) else {
                continue;
            };
            if let Some(owner) = owners.insert(path.full_path(), context) {
                prop_assert_eq!(owner, context, "{}", path);
            }
        }
    }

    #[test]
    fn prop_construction_is_deterministic(context in model_contribution()) {
        prop_assert_eq!(construct_storage_path(&context), construct_storage_path(&context));
    }

    #[test]
    fn prop_distinct_models_distinct_paths(
        models in proptest::collection::hash_set(model_slug(), 2..12),
        attempt in 0..5u32,
    ) {
        let paths: HashSet<String> = models
            .iter()
            .map(|model| {
                let context = stage_context("synthesis", FileType::ModelContributionMain)
                    .with_model(model.as_str(), attempt)
                    .with_contribution_type(ContributionType::PairwiseSynthesisChunk)
                    .with_anchor("thesis", "anchor")
                    .with_paired_model("paired");
                construct_storage_path(&context).unwrap().full_path()
            })
            .collect();
        prop_assert_eq!(paths.len(), models.len());
    }
}

/// Contexts that differ in exactly one identity dimension never collide.
#[test]
fn lineage_dimensions_are_distinguishing() {
    let base = || {
        stage_context("synthesis", FileType::ModelContributionMain)
            .with_model("gpt-4", 0)
            .with_contribution_type(ContributionType::PairwiseSynthesisChunk)
            .with_anchor("thesis", "claude")
            .with_paired_model("gemini")
    };
    let variants: Vec<PathContext> = vec![
        base(),
        base().with_model("gpt-4o", 0),
        base().with_model("gpt-4", 1),
        base().with_anchor("thesis", "mistral"),
        base().with_paired_model("llama"),
        base().with_anchor_type("business_case"),
        base().with_fragment("ab"),
        base().with_continuation(1),
        base().with_continuation(2),
        {
            let mut context = base();
            context.stage_slug = Some("thesis".to_string());
            context
        },
        {
            let mut context = base();
            context.iteration = Some(2);
            context
        },
        PathContext::for_stage(PROJECT, "ffffffff", 1, "synthesis", FileType::ModelContributionMain)
            .with_model("gpt-4", 0)
            .with_contribution_type(ContributionType::PairwiseSynthesisChunk)
            .with_anchor("thesis", "claude")
            .with_paired_model("gemini"),
    ];
    let paths: HashSet<String> = variants
        .iter()
        .map(|context| construct_storage_path(context).unwrap().full_path())
        .collect();
    assert_eq!(paths.len(), variants.len());
}

#[test]
fn antithesis_sources_and_attempts_are_distinguishing() {
    let critique = |source: &str, source_attempt: u32, attempt: u32| {
        stage_context("antithesis", FileType::ModelContributionMain)
            .with_model("gpt-4", attempt)
            .with_contribution_type(ContributionType::Antithesis)
            .with_source_model(source)
            .with_anchor_type("thesis")
            .with_source_attempt(source_attempt)
    };
    let contexts = [
        critique("claude", 0, 0),
        critique("gemini", 0, 0),
        critique("claude", 1, 0),
        critique("claude", 0, 1),
        critique("claude", 0, 0).with_fragment("1"),
    ];
    let paths: HashSet<String> = contexts
        .iter()
        .map(|context| construct_storage_path(context).unwrap().full_path())
        .collect();
    assert_eq!(paths.len(), contexts.len());
}
