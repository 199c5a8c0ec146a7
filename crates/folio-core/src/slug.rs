//! URL slugs derived from post titles.
//!
//! Slugs keep ASCII letters and digits plus Hangul syllables, joined by
//! single hyphens, and never exceed [`MAX_SLUG_LEN`] characters.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::AppError;

pub const MAX_SLUG_LEN: usize = 150;

/// Highest numeric suffix tried before falling back to a timestamp.
pub const MAX_SUFFIX: u32 = 100;

/// Path segments under `/api/my/posts/` that a slug must not shadow.
pub const RESERVED: &[&str] = &["deleted"];

static VALID_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9가-힣-]+$").expect("valid slug regex"));

fn is_slug_char(ch: char) -> bool {
    ch.is_ascii_lowercase() || ch.is_ascii_digit() || ('가'..='힣').contains(&ch) || ch == '-'
}

/// Generate a slug from arbitrary input (usually a post title).
pub fn generate(input: &str) -> Result<String, AppError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(
            "Cannot generate a slug from an empty title".into(),
        ));
    }

    let lowered = trimmed.to_lowercase();
    let hyphenated = lowered.split_whitespace().collect::<Vec<_>>().join("-");
    let filtered: String = hyphenated.chars().filter(|c| is_slug_char(*c)).collect();

    let collapsed = collapse_hyphens(&filtered);
    let truncated: String = collapsed.chars().take(MAX_SLUG_LEN).collect();
    let slug = truncated.trim_end_matches('-').to_string();

    if slug.is_empty() {
        return Err(AppError::BadRequest(format!(
            "Title '{trimmed}' contains no characters usable in a slug"
        )));
    }
    Ok(slug)
}

fn collapse_hyphens(input: &str) -> String {
    input
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Append `-n`, shortening the base so the result fits in [`MAX_SLUG_LEN`].
pub fn with_suffix(base: &str, n: u64) -> String {
    let suffix = format!("-{n}");
    let room = MAX_SLUG_LEN.saturating_sub(suffix.chars().count());
    let head: String = base.chars().take(room).collect();
    format!("{}{suffix}", head.trim_end_matches('-'))
}

pub fn is_reserved(slug: &str) -> bool {
    RESERVED.contains(&slug)
}

/// Slugs to try in order: the base, then `base-2` up to `base-100`.
/// A reserved base is skipped.
pub fn candidates(base: &str) -> impl Iterator<Item = String> + '_ {
    std::iter::once(base.to_string())
        .filter(|slug| !is_reserved(slug))
        .chain((2..=u64::from(MAX_SUFFIX)).map(move |n| with_suffix(base, n)))
}

/// Last-resort slug when every numbered candidate is taken.
pub fn fallback(base: &str, epoch_millis: i64) -> String {
    with_suffix(base, epoch_millis.unsigned_abs())
}

pub fn is_valid(slug: &str) -> bool {
    slug.chars().count() <= MAX_SLUG_LEN && VALID_SLUG.is_match(slug)
}
