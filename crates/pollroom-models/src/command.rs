use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A participant command. The set is closed; anything else is dropped at
/// [`decode_command`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    Vote {
        #[serde(rename = "pollId")]
        poll_id: String,
        #[serde(rename = "optionId")]
        option_id: String,
    },
    ChangePoll {
        #[serde(rename = "pollId")]
        poll_id: String,
    },
    ResetPoll {
        #[serde(rename = "pollId")]
        poll_id: String,
    },
}

impl Command {
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Vote { .. } => "vote",
            Command::ChangePoll { .. } => "changePoll",
            Command::ResetPoll { .. } => "resetPoll",
        }
    }

    pub fn poll_id(&self) -> &str {
        match self {
            Command::Vote { poll_id, .. }
            | Command::ChangePoll { poll_id }
            | Command::ResetPoll { poll_id } => poll_id,
        }
    }
}

#[derive(Debug, Error)]
#[error("malformed command: {0}")]
pub struct DecodeError(#[from] serde_json::Error);

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum Inbound {
    Vote {
        #[serde(rename = "pollId")]
        poll_id: String,
        #[serde(rename = "optionId")]
        option_id: String,
    },
    ChangePoll {
        #[serde(rename = "pollId")]
        poll_id: String,
    },
    ResetPoll {
        #[serde(rename = "pollId")]
        poll_id: String,
    },
    #[serde(other)]
    Unrecognized,
}

/// Decode one inbound text frame.
///
/// Returns `Ok(None)` for a well-formed payload whose `type` is not a known
/// command; those are ignored rather than treated as errors.
pub fn decode_command(text: &str) -> Result<Option<Command>, DecodeError> {
    let command = match serde_json::from_str::<Inbound>(text)? {
        Inbound::Vote { poll_id, option_id } => Command::Vote { poll_id, option_id },
        Inbound::ChangePoll { poll_id } => Command::ChangePoll { poll_id },
        Inbound::ResetPoll { poll_id } => Command::ResetPoll { poll_id },
        Inbound::Unrecognized => return Ok(None),
    };
    Ok(Some(command))
}
