use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogOption {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPoll {
    pub id: String,
    pub name: String,
    pub question: String,
    pub options: Vec<CatalogOption>,
}

/// The fixed set of polls a room is seeded with.
///
/// Poll and option ids never change after a room is created; only vote
/// counts and the active poll do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollCatalog {
    /// Poll to activate first. Defaults to the first poll in the list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_poll: Option<String>,
    pub polls: Vec<CatalogPoll>,
}

fn poll(id: &str, name: &str, question: &str, options: &[(&str, &str)]) -> CatalogPoll {
    CatalogPoll {
        id: id.to_string(),
        name: name.to_string(),
        question: question.to_string(),
        options: options
            .iter()
            .map(|(id, text)| CatalogOption {
                id: id.to_string(),
                text: text.to_string(),
            })
            .collect(),
    }
}

impl PollCatalog {
    pub fn builtin() -> Self {
        Self {
            initial_poll: Some("poll1".to_string()),
            polls: vec![
                poll(
                    "poll1",
                    "Poll 1",
                    "Which option is correct?",
                    &[("a", "A"), ("b", "B"), ("c", "C"), ("d", "D"), ("e", "E")],
                ),
                poll(
                    "poll2",
                    "Poll 2",
                    "Which option is the best?",
                    &[("a", "A"), ("b", "B"), ("c", "C"), ("d", "D")],
                ),
                poll(
                    "poll3",
                    "Poll 3",
                    "True or False?",
                    &[("true", "True"), ("false", "False")],
                ),
                poll(
                    "poll4",
                    "Poll 4",
                    "Yes or No?",
                    &[("yes", "Yes"), ("no", "No"), ("maybe", "Maybe")],
                ),
                poll(
                    "poll5",
                    "Poll 5",
                    "On a scale of 1 to 5, how are you feeling about what we just learned?",
                    &[("a", "1"), ("b", "2"), ("c", "3"), ("d", "4"), ("e", "5")],
                ),
            ],
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CoreError> {
        let catalog: PollCatalog = toml::from_str(raw)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.polls.is_empty() {
            return Err(CoreError::EmptyCatalog);
        }

        let mut poll_ids = HashSet::new();
        for poll in &self.polls {
            if !poll_ids.insert(poll.id.as_str()) {
                return Err(CoreError::DuplicatePoll(poll.id.clone()));
            }
            if poll.options.is_empty() {
                return Err(CoreError::PollWithoutOptions(poll.id.clone()));
            }
            let mut option_ids = HashSet::new();
            for option in &poll.options {
                if !option_ids.insert(option.id.as_str()) {
                    return Err(CoreError::DuplicateOption {
                        poll: poll.id.clone(),
                        option: option.id.clone(),
                    });
                }
            }
        }

        if let Some(initial) = self.initial_poll.as_deref() {
            if !poll_ids.contains(initial) {
                return Err(CoreError::UnknownInitialPoll(initial.to_string()));
            }
        }

        Ok(())
    }

    /// Index of the poll that starts active.
    pub(crate) fn initial_index(&self) -> usize {
        self.initial_poll
            .as_deref()
            .and_then(|id| self.polls.iter().position(|p| p.id == id))
            .unwrap_or(0)
    }
}

impl Default for PollCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
