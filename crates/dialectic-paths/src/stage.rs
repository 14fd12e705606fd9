//! Stage directory table
//!
//! Stage slugs map to fixed, ordered directory names (`1_thesis`,
//! `2_antithesis`, ...). The table is the single source of truth for both
//! directions of the codec.

/// `(order, slug)` for every known stage.
pub const STAGES: &[(u8, &str)] = &[
    (1, "thesis"),
    (2, "antithesis"),
    (3, "synthesis"),
    (4, "parenthesis"),
    (5, "paralysis"),
];

/// Pipeline position of a stage slug.
#[must_use]
pub fn stage_order(slug: &str) -> Option<u8> {
    STAGES
        .iter()
        .find(|(_, known)| *known == slug)
        .map(|(order, _)| *order)
}

/// Directory name for a stage slug, e.g. `3_synthesis`.
#[must_use]
pub fn stage_dir_name(slug: &str) -> Option<String> {
    stage_order(slug).map(|order| format!("{order}_{slug}"))
}

/// Inverse of [`stage_dir_name`]. Only exact table entries resolve.
#[must_use]
pub fn stage_slug_from_dir(dir_name: &str) -> Option<&'static str> {
    let (order, slug) = dir_name.split_once('_')?;
    let order: u8 = order.parse().ok()?;
    STAGES
        .iter()
        .find(|(known_order, known_slug)| *known_order == order && *known_slug == slug)
        .map(|(_, known_slug)| *known_slug)
}
