//! Input policy for evidence commands.
//!
//! Every rule lives here and is called only from the orchestrator and the pack
//! assembler, so entry points cannot disagree about what is acceptable.
use crate::error::{EvidenceError, Result};
use regex::Regex;
use std::sync::OnceLock;

/// Minimum length, in characters of the trimmed text, of a revision reason note.
pub const MIN_REASON_NOTE_CHARS: usize = 20;

/// Message shown to the user when a reason note is too short.
pub const REASON_NOTE_MESSAGE: &str =
    "Provide a neutral reason of at least 20 characters for this revision.";

/// Validate an optional revision reason note.
///
/// An absent note passes. A present note, including an empty one, must reach
/// [`MIN_REASON_NOTE_CHARS`] once trimmed.
pub fn validate_reason_note(note: Option<&str>) -> Result<()> {
    let Some(note) = note else {
        return Ok(());
    };
    if note.trim().chars().count() < MIN_REASON_NOTE_CHARS {
        return Err(EvidenceError::Validation(REASON_NOTE_MESSAGE.to_string()));
    }
    Ok(())
}

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([0-9]{4})-([0-9]{2})-([0-9]{2})$").expect("compile date pattern")
    })
}

/// Validate a `YYYY-MM-DD` calendar date label.
pub fn validate_date(label: &str, value: &str) -> Result<()> {
    let invalid = || {
        EvidenceError::Validation(format!("{label} must be a YYYY-MM-DD date (got {value:?})"))
    };
    let captures = date_pattern().captures(value).ok_or_else(invalid)?;
    let year: u32 = captures[1].parse().map_err(|_| invalid())?;
    let month: u32 = captures[2].parse().map_err(|_| invalid())?;
    let day: u32 = captures[3].parse().map_err(|_| invalid())?;
    match days_in_month(year, month) {
        Some(last) if (1..=last).contains(&day) => Ok(()),
        _ => Err(invalid()),
    }
}

fn days_in_month(year: u32, month: u32) -> Option<u32> {
    let leap = matches!((year % 400, year % 100, year % 4), (0, _, _) | (1.., 1.., 0));
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Some(31),
        4 | 6 | 9 | 11 => Some(30),
        2 if leap => Some(29),
        2 => Some(28),
        _ => None,
    }
}

/// Validate the descriptive fields of a submission pack request.
pub fn validate_pack_fields(title: &str, start_date: &str, end_date: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(EvidenceError::Validation(
            "submission pack title must not be empty".to_string(),
        ));
    }
    validate_date("start date", start_date)?;
    validate_date("end date", end_date)?;
    // Zero-padded ISO dates order lexically.
    if start_date > end_date {
        return Err(EvidenceError::Validation(format!(
            "start date {start_date} is after end date {end_date}"
        )));
    }
    Ok(())
}
