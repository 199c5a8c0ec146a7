use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::AppError;

static FILE_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"::file\[id=(\d+)").expect("valid file reference regex"));

static RAW_HTML: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)<(img|div|span|p|a|br|hr|table|tr|td|th|thead|tbody|section|article|header|footer|iframe|script|style)\b[^>]*>",
    )
    .expect("valid html tag regex")
});

/// Ids of every uploaded file referenced as `::file[id=N ...]`.
pub fn file_references(content: &str) -> BTreeSet<i64> {
    FILE_REFERENCE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1)?.as_str().parse::<i64>().ok())
        .collect()
}

pub fn has_file_references(content: &str) -> bool {
    FILE_REFERENCE.is_match(content)
}

/// Posts are pure Markdown; raw HTML tags are refused.
pub fn reject_html(content: &str) -> Result<(), AppError> {
    if content.trim().is_empty() {
        return Ok(());
    }
    if let Some(found) = RAW_HTML.find(content) {
        return Err(AppError::BadRequest(format!(
            "HTML tags are not allowed in post content (found {})",
            found.as_str()
        )));
    }
    Ok(())
}
