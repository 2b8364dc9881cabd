//! Transcript section extraction
//!
//! Splits a pasted clinical conversation transcript into the labeled
//! "Subjective" and "Objective" regions used to pre-fill the note form.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

// Subjective runs from its label to the next "Objective:" label or end of
// input; Objective runs from its label to the next "Assessment:" label or
// end of input. Case-insensitive, dot matches newline.
static SUBJECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)subjective\s*:(.*?)(?:objective\s*:|$)").expect("subjective pattern")
});

static OBJECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)objective\s*:(.*?)(?:assessment\s*:|$)").expect("objective pattern")
});

/// Sections pulled out of a transcript. Either field is empty when the
/// corresponding label is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSections {
    pub subjective: String,
    pub objective: String,
}

/// Extract the Subjective and Objective sections from a transcript.
///
/// The first occurrence of each label wins; repeated or reordered labels are
/// not merged. A missing label yields an empty string.
pub fn extract_sections(transcript: &str) -> ExtractedSections {
    ExtractedSections {
        subjective: first_capture(&SUBJECTIVE, transcript),
        objective: first_capture(&OBJECTIVE, transcript),
    }
}

fn first_capture(pattern: &Regex, text: &str) -> String {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}
