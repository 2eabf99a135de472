use thiserror::Error;

use crate::forms::FormErrors;

#[derive(Error, Debug)]
pub enum TallyError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("Invalid input: {0}")]
    Validation(#[from] FormErrors),

    #[error("Password error: {0}")]
    Password(String),

    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Subscription is not active. Choose a plan with `tally user subscribe`.")]
    SubscriptionInactive,

    #[error("Transaction limit reached for your plan ({limit})")]
    LimitReached { limit: u32 },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TallyError>;
