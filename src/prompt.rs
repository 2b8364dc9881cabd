//! Prompt assembly for procedural note generation
//!
//! One fixed template per input variant. Every prompt asks for the same four
//! note sections: diagnosis, procedural details, post-procedure plan, and
//! patient education.

use serde::{Deserialize, Serialize};

use crate::llm_client::ChatMessage;

/// Structured clinical inputs for a note.
///
/// The two variants mirror the two forms the service accepts: a
/// subjective/objective pair seeded from a transcript, or free-text patient
/// information plus procedure details.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoteInput {
    Soap {
        subjective: String,
        objective: String,
    },
    Procedure {
        patient_info: String,
        procedure_details: String,
    },
}

impl NoteInput {
    /// The two input fields with their user-facing labels, in form order.
    pub fn fields(&self) -> [(&'static str, &str); 2] {
        match self {
            NoteInput::Soap {
                subjective,
                objective,
            } => [("subjective", subjective), ("objective", objective)],
            NoteInput::Procedure {
                patient_info,
                procedure_details,
            } => [
                ("patient information", patient_info),
                ("procedure details", procedure_details),
            ],
        }
    }
}

/// An assembled prompt: a system instruction plus the user content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// Role-tagged messages for the chat completion shape.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        vec![
            ChatMessage {
                role: "system".to_string(),
                content: self.system.clone(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: self.user.clone(),
            },
        ]
    }

    /// Single prompt string for the legacy completion shape.
    pub fn to_plain_text(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

const SYSTEM_PROMPT: &str = "You are a medical scribe. Write a procedural note from the clinical details provided. \
Structure the note with these sections: Diagnosis, Procedural Details, Post-Procedure Plan, Patient Education. \
Use correct medical terminology. Do not invent findings - include only information supported by the input.";

/// Assemble the fixed note-generation prompt for the given input.
pub fn build_prompt(input: &NoteInput) -> Prompt {
    let user = match input {
        NoteInput::Soap {
            subjective,
            objective,
        } => format!(
            "Generate a procedural note using:\n\nSUBJECTIVE:\n{}\n\nOBJECTIVE:\n{}",
            subjective.trim(),
            objective.trim()
        ),
        NoteInput::Procedure {
            patient_info,
            procedure_details,
        } => format!(
            "Generate a procedural note using:\n\nPATIENT INFORMATION:\n{}\n\nPROCEDURE DETAILS:\n{}",
            patient_info.trim(),
            procedure_details.trim()
        ),
    };

    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}
