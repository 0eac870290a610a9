use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("poll catalog is empty")]
    EmptyCatalog,
    #[error("poll '{0}' has no options")]
    PollWithoutOptions(String),
    #[error("duplicate poll id '{0}'")]
    DuplicatePoll(String),
    #[error("duplicate option id '{option}' in poll '{poll}'")]
    DuplicateOption { poll: String, option: String },
    #[error("initial poll '{0}' is not in the catalog")]
    UnknownInitialPoll(String),
    #[error("invalid room name: {0:?}")]
    InvalidRoomName(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid catalog: {0}")]
    CatalogParse(#[from] toml::de::Error),
    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}
