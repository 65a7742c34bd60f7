//! Upload admission checks.
//!
//! Run before anything is stored or parsed. Each failure is a
//! [`CoreError::Validation`] whose message is shown to the uploader.

use crate::error::CoreError;
use crate::naming::{extension, sanitize_filename};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Spreadsheet extensions accepted by default.
pub const ALLOWED_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls"];

/// Default upload limit (100 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// Commit messages must carry non-whitespace text.
pub fn validate_commit_message(message: &str) -> Result<(), CoreError> {
    if message.trim().is_empty() {
        return Err(CoreError::Validation("Commit message is required".into()));
    }
    Ok(())
}

/// Content must be non-empty and within `max_size` bytes.
pub fn validate_size(size: u64, max_size: u64) -> Result<(), CoreError> {
    if size == 0 {
        return Err(CoreError::Validation("Uploaded file is empty".into()));
    }
    if size > max_size {
        return Err(CoreError::Validation(format!(
            "File size {size} bytes exceeds the maximum of {max_size} bytes"
        )));
    }
    Ok(())
}

/// Validate the client filename and return its sanitized form.
pub fn validate_filename(filename: &str, allowed: &[String]) -> Result<String, CoreError> {
    if filename.trim().is_empty() {
        return Err(CoreError::Validation("No file selected".into()));
    }
    let ext = extension(filename).unwrap_or_default();
    if !allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)) {
        return Err(CoreError::Validation(format!(
            "Invalid file type '{filename}'. Allowed extensions: {}",
            allowed.join(", ")
        )));
    }
    let sanitized = sanitize_filename(filename);
    if extension(&sanitized).is_none() {
        return Err(CoreError::Validation(format!(
            "Filename '{filename}' has no usable characters"
        )));
    }
    Ok(sanitized)
}

/// All admission checks for one upload, in the order the uploader sees
/// them. Returns the sanitized filename.
pub fn validate_upload(
    filename: &str,
    commit_message: &str,
    size: u64,
    max_size: u64,
    allowed: &[String],
) -> Result<String, CoreError> {
    validate_commit_message(commit_message)?;
    let sanitized = validate_filename(filename, allowed)?;
    validate_size(size, max_size)?;
    Ok(sanitized)
}

/// [`ALLOWED_EXTENSIONS`] as owned strings, the shape configuration uses.
pub fn default_allowed_extensions() -> Vec<String> {
    ALLOWED_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}
