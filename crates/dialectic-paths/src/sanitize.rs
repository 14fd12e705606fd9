//! Path-safe string utilities
//!
//! Every segment the codec writes goes through one of the sanitizers here.
//! All of them are pure and idempotent: `f(f(x)) == f(x)`.
//!
//! | Function | Alphabet | Used for |
//! |---|---|---|
//! | [`sanitize_for_path`] | `[a-z0-9._()'-]` | user file names, project ids |
//! | [`sanitize_slug`] | `[a-z0-9.-]` | model slugs |
//! | [`sanitize_key`] | `[a-z0-9_]` | document keys, anchor types, stage slugs |

/// Length of the short ids used in session directory names and fragments.
pub const SHORT_ID_LEN: usize = 8;

/// Punctuation kept verbatim by [`sanitize_for_path`].
const ALLOWED_PUNCTUATION: &[char] = &['-', '_', '.', '(', ')', '\''];

/// Normalize an arbitrary name into a filesystem-safe path component.
///
/// Trims surrounding whitespace, lower-cases ASCII letters, keeps
/// alphanumerics and `- _ . ( ) '`, replaces everything else with `_`
/// and collapses runs of `_`.
///
/// # Examples
/// ```
/// use dialectic_paths::sanitize_for_path;
///
/// assert_eq!(sanitize_for_path("  My Notes (v2).MD "), "my_notes_(v2).md");
/// assert_eq!(sanitize_for_path("a  //  b"), "a_b");
/// ```
#[must_use]
pub fn sanitize_for_path(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        let mapped = if c.is_ascii_alphanumeric() {
            c.to_ascii_lowercase()
        } else if ALLOWED_PUNCTUATION.contains(&c) {
            c
        } else {
            '_'
        };
        if mapped == '_' && out.ends_with('_') {
            continue;
        }
        out.push(mapped);
    }
    out
}

/// Normalize a model slug.
///
/// Model slugs never contain `_`, which the filename grammar reserves as
/// its token separator, nor the lineage punctuation `( ) '`.
///
/// ```
/// use dialectic_paths::sanitize_slug;
///
/// assert_eq!(sanitize_slug("Claude 3.5_Sonnet"), "claude-3.5-sonnet");
/// ```
#[must_use]
pub fn sanitize_slug(name: &str) -> String {
    sanitize_for_path(name)
        .chars()
        .map(|c| match c {
            '_' | '(' | ')' | '\'' => '-',
            other => other,
        })
        .collect()
}

/// Normalize a document key, anchor type or stage slug into `[a-z0-9_]`.
#[must_use]
pub fn sanitize_key(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in sanitize_for_path(name).chars() {
        let mapped = if c.is_ascii_alphanumeric() { c } else { '_' };
        if mapped == '_' && out.ends_with('_') {
            continue;
        }
        out.push(mapped);
    }
    out
}

/// Deterministic short form of a full identifier.
///
/// Lower-cases, strips every non-alphanumeric character (UUID dashes and
/// the like) and keeps the first [`SHORT_ID_LEN`] characters.
///
/// ```
/// use dialectic_paths::generate_short_id;
///
/// assert_eq!(
///     generate_short_id("A1B2C3D4-E5F6-7890-abcd-ef0123456789"),
///     "a1b2c3d4"
/// );
/// ```
#[must_use]
pub fn generate_short_id(full_id: &str) -> String {
    full_id
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .take(SHORT_ID_LEN)
        .collect()
}

/// Normalize a disambiguating fragment.
///
/// Returns `None` unless the short id of `fragment` is non-empty hex.
#[must_use]
pub fn normalize_fragment(fragment: &str) -> Option<String> {
    let short = generate_short_id(fragment);
    if is_fragment_token(&short) {
        Some(short)
    } else {
        None
    }
}

/// Whether `token` has the shape of a normalized fragment.
#[must_use]
pub fn is_fragment_token(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= SHORT_ID_LEN
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, 'a'..='f'))
}

/// Whether `segment` can be used as a directory or file component.
#[must_use]
pub fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains('/')
}
