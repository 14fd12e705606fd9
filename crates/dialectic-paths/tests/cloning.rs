use dialectic_paths::{
    construct_storage_path, deconstruct_storage_path, DeconstructError, DeconstructInput,
    FileTypeFamily,
};
use dialectic_test_utils::{
    every_branch, model_contribution, new_session_id, round_trip, SHORT_SESSION,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn short(session: &str) -> String {
    dialectic_paths::generate_short_id(session)
}

#[test]
fn every_branch_clones_into_new_session() {
    let session = new_session_id();
    for context in every_branch() {
        let (path, info) = round_trip(&context);
        let cloned =
            construct_storage_path(&info.to_path_context(Some(&session)).unwrap()).unwrap();
        let expected_dir = if context.file_type.family() == FileTypeFamily::Project {
            path.storage_path.clone()
        } else {
            path.storage_path.replace(
                &format!("session_{SHORT_SESSION}"),
                &format!("session_{}", short(&session)),
            )
        };
        assert_eq!(cloned.storage_path, expected_dir);
        assert_eq!(cloned.file_name, path.file_name);
    }
}

#[test]
fn cloning_fails_fast_on_unknown_paths() {
    let info = deconstruct_storage_path(&DeconstructInput::new(
        "p/session_abc/iteration_1/1_thesis",
        "notes.txt",
    ));
    assert!(matches!(
        info.to_path_context(Some("s")),
        Err(DeconstructError::NonCanonical(_))
    ));
}

proptest! {
    #[test]
    fn prop_edit_reconstructs_same_path(context in model_contribution()) {
        let (path, info) = round_trip(&context);
        let rebuilt = construct_storage_path(&info.to_path_context(None).unwrap()).unwrap();
        prop_assert_eq!(rebuilt, path);
    }
}
