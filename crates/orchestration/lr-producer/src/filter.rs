//! Access log object recognition.
//!
//! S3 server access logs are named `TargetPrefixYYYY-mm-DD-HH-MM-SS-UniqueString`
//! with no extension. Anything else in a log folder (archives produced by an
//! earlier rollup, `robots.txt`, images) is left alone.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

static LOG_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}-\d{2}-\d{2}-\d{2}").expect("Invalid access log pattern")
});

/// Returns true if the basename has a filename extension.
///
/// Follows the usual path rules: a leading dot (hidden file) or a trailing
/// dot does not start an extension.
fn has_extension(basename: &str) -> bool {
    match basename.rfind('.') {
        Some(idx) => idx > 0 && idx < basename.len() - 1,
        None => false,
    }
}

/// Returns true if `basename` names an access log object.
pub fn is_log_object(basename: &str) -> bool {
    LOG_NAME.is_match(basename) && !has_extension(basename)
}

/// Parses the calendar date at the start of a log basename.
///
/// Returns `None`, with a warning, when the first ten characters are not a
/// valid date (for example `2022-13-45-...`).
pub fn log_date(basename: &str) -> Option<NaiveDate> {
    let date_str = basename.get(..10)?;
    match NaiveDate::parse_from_str(date_str, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            warn!(basename, error = %e, "Skipping log object with an invalid date");
            None
        }
    }
}
