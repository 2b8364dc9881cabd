//! Procedural note generation
//!
//! Checks preconditions, assembles the prompt, issues one call to the
//! completion endpoint, and returns the trimmed generated text. Missing
//! inputs are caught before any network traffic.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::config::ApiStyle;
use crate::llm_client::{LlmClient, LlmError};
use crate::prompt::{build_prompt, NoteInput};

/// Errors from note generation.
#[derive(Debug, Error)]
pub enum NoteError {
    #[error("the {label} field cannot be empty")]
    MissingField { label: &'static str },
    #[error("an API key is required")]
    MissingApiKey,
    #[error(transparent)]
    Upstream(#[from] LlmError),
}

impl NoteError {
    /// The string shown to the user in place of a note.
    ///
    /// Precondition violations read as warnings; upstream failures keep the
    /// original "Error: <message>" display format.
    pub fn user_message(&self) -> String {
        match self {
            NoteError::MissingField { label } => {
                format!("Please enter the {} before generating a note.", label)
            }
            NoteError::MissingApiKey => {
                "Please enter your API key before generating a note.".to_string()
            }
            NoteError::Upstream(e) => format!("Error: {}", e),
        }
    }
}

/// A generated procedural note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedNote {
    pub content: String,
    pub model: String,
    pub generated_at: String,
}

/// Generate a procedural note from structured clinical inputs.
///
/// Both input fields and the API key must be non-empty after trimming;
/// violations return without touching the network. The endpoint is called
/// exactly once and its response is returned trimmed.
pub async fn generate_note(
    client: &LlmClient,
    api_key: &str,
    model: &str,
    style: ApiStyle,
    input: &NoteInput,
) -> Result<GeneratedNote, NoteError> {
    for (label, value) in input.fields() {
        if value.trim().is_empty() {
            return Err(NoteError::MissingField { label });
        }
    }
    if api_key.trim().is_empty() {
        return Err(NoteError::MissingApiKey);
    }

    let prompt = build_prompt(input);
    let raw = client.complete(api_key, model, style, &prompt).await?;
    let content = raw.trim().to_string();

    info!(
        "generated procedural note ({} chars) with model {}",
        content.len(),
        model
    );

    Ok(GeneratedNote {
        content,
        model: model.to_string(),
        generated_at: Utc::now().to_rfc3339(),
    })
}
