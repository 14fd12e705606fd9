//! Subcommand implementations
//!
//! Each command returns a serializable value; `main` renders it.

use anyhow::Context;
use dialectic_paths::{
    construct_storage_path, contribution_type_from_file_type, deconstruct_storage_path,
    ConstructedPath, ContributionType, DeconstructInput, DeconstructedPathInfo, FileType,
    PathContext,
};
use serde::Serialize;

use crate::config::{CliConfig, OutputFormat};

/// Construct a path from a JSON-encoded [`PathContext`].
///
/// # Errors
/// Fails on malformed JSON or when the context does not validate.
pub fn construct(context_json: &str) -> anyhow::Result<ConstructedPath> {
    let context: PathContext =
        serde_json::from_str(context_json).context("parsing path context JSON")?;
    tracing::debug!(file_type = %context.file_type, "constructing path");
    let path = construct_storage_path(&context)?;
    Ok(path)
}

/// Deconstruct a storage directory and file name.
#[must_use]
pub fn deconstruct(storage_dir: &str, file_name: &str) -> DeconstructedPathInfo {
    deconstruct_storage_path(&DeconstructInput::new(storage_dir, file_name))
}

/// Debate phase of a file type tag.
///
/// # Errors
/// Fails when `tag` names no file type or document key.
pub fn classify(tag: &str) -> anyhow::Result<Option<ContributionType>> {
    let file_type: FileType = tag.parse()?;
    Ok(contribution_type_from_file_type(file_type))
}

/// Re-home an existing artifact path in another session.
///
/// # Errors
/// Fails when the source path is not canonical or the rebuilt context
/// does not validate.
pub fn clone_path(
    storage_dir: &str,
    file_name: &str,
    session_id: &str,
) -> anyhow::Result<ConstructedPath> {
    let info = deconstruct(storage_dir, file_name).into_result()?;
    let context = info
        .to_path_context(Some(session_id))
        .with_context(|| format!("remapping {storage_dir}/{file_name}"))?;
    let path = construct_storage_path(&context)?;
    tracing::info!(from = %format!("{storage_dir}/{file_name}"), to = %path, "cloned path");
    Ok(path)
}

/// Serialize `value` in the configured format.
///
/// # Errors
/// Fails only if serialization fails.
pub fn render<T: Serialize>(value: &T, config: &CliConfig) -> anyhow::Result<String> {
    let rendered = match (config.format, config.pretty) {
        (OutputFormat::Json, true) => serde_json::to_string_pretty(value)?,
        (OutputFormat::Json, false) => serde_json::to_string(value)?,
        (OutputFormat::Yaml, _) => serde_yaml::to_string(value)?,
    };
    Ok(rendered.trim_end().to_string())
}
