//! Shapes accepted from the prompt-generation model.
//!
//! The model is asked for a JSON array of strings but in practice answers
//! with one of a few wrappers. Only these are accepted; anything else is an
//! error rather than a guess.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub const MAX_PROMPTS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("prompt count must be between 1 and {max}, got {0}", max = MAX_PROMPTS)]
    InvalidCount(usize),
    #[error("invalid JSON response: {0}")]
    InvalidJson(String),
    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),
    #[error("no valid prompts in response")]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PromptResponse {
    List(Vec<Option<String>>),
    Prompts { prompts: Vec<Option<String>> },
    Episodes { episodes: Vec<Option<String>> },
    Items { items: Vec<Option<String>> },
}

impl PromptResponse {
    pub fn parse(content: &str) -> Result<Self, PromptError> {
        let value: Value = serde_json::from_str(content.trim()).map_err(|_| {
            let preview: String = content.chars().take(200).collect();
            PromptError::InvalidJson(preview)
        })?;
        let kind = match &value {
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::String(_) => "string",
            Value::Number(_) => "number",
            Value::Bool(_) => "bool",
            Value::Null => "null",
        };
        serde_json::from_value(value)
            .map_err(|_| PromptError::UnexpectedShape(format!("{kind} without a list of string prompts")))
    }

    fn into_entries(self) -> Vec<Option<String>> {
        match self {
            PromptResponse::List(entries)
            | PromptResponse::Prompts { prompts: entries }
            | PromptResponse::Episodes { episodes: entries }
            | PromptResponse::Items { items: entries } => entries,
        }
    }

    /// Exactly `count` trimmed, non-empty prompts: surplus is cut, a short list
    /// is padded by repeating its last prompt.
    pub fn into_prompts(self, count: usize) -> Result<Vec<String>, PromptError> {
        if count == 0 || count > MAX_PROMPTS {
            return Err(PromptError::InvalidCount(count));
        }

        let mut prompts: Vec<String> = self
            .into_entries()
            .into_iter()
            .flatten()
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();

        let last = prompts.last().cloned().ok_or(PromptError::Empty)?;
        prompts.truncate(count);
        prompts.resize(count, last);
        Ok(prompts)
    }
}
