//! Stored filename and storage key conventions.
//!
//! Uploaded filenames are reduced to a safe ASCII form before they are used
//! as a document's display name or embedded in a storage key.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::types::DbId;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("valid regex"));

/// Root prefix of every document blob.
pub const DOCUMENTS_PREFIX: &str = "documents";

/// Reduce a client-supplied filename to `[A-Za-z0-9_.-]`.
///
/// Path separators become spaces, runs of whitespace collapse to a single
/// `_`, other characters are dropped, and leading or trailing `.`/`_` are
/// trimmed so the result can never name a parent directory. May return an
/// empty string.
///
/// ```
/// use reposync_core::naming::sanitize_filename;
///
/// assert_eq!(sanitize_filename("Q1 budget.xlsx"), "Q1_budget.xlsx");
/// assert_eq!(sanitize_filename("../../etc/passwd"), "etc_passwd");
/// ```
pub fn sanitize_filename(filename: &str) -> String {
    let flattened = filename.replace(['/', '\\'], " ");
    let joined = flattened.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = UNSAFE_CHARS.replace_all(&joined, "");
    cleaned.trim_matches(|c| c == '.' || c == '_').to_string()
}

/// Lower-cased extension after the last `.`, if any.
pub fn extension(filename: &str) -> Option<String> {
    let (stem, ext) = filename.rsplit_once('.')?;
    if ext.is_empty() || stem.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Storage key for version `version_number` of a document.
///
/// Format: `documents/{id}/{id}_v{n}_{YYYYmmdd_HHMMSS}_{filename}`. The
/// version number keeps keys unique per document even within one second.
pub fn storage_key(
    document_id: DbId,
    version_number: i32,
    created_at: DateTime<Utc>,
    filename: &str,
) -> String {
    format!(
        "{DOCUMENTS_PREFIX}/{document_id}/{document_id}_v{version_number}_{}_{filename}",
        created_at.format("%Y%m%d_%H%M%S")
    )
}
