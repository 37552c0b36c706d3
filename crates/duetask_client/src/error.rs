//! Client-side error taxonomy.
//!
//! Every variant is non-fatal: callers log it and keep the previous state.

use duetask_core::DueParseError;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum ClientError {
    /// Transport failure or undecodable response.
    Network(reqwest::Error),
    /// Server answered with a non-success status.
    Api { status: u16, message: String },
    /// Input refused before any request was sent.
    Validation(String),
    /// Due-time text could not be parsed.
    InvalidDue(DueParseError),
    /// No task in client state matches the reference.
    UnknownTask(String),
    /// More than one task matches an id prefix.
    AmbiguousTask(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. } | Self::UnknownTask(_))
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(err) => write!(f, "network error: {err}"),
            Self::Api { status, message } => write!(f, "server returned {status}: {message}"),
            Self::Validation(message) => write!(f, "{message}"),
            Self::InvalidDue(err) => write!(f, "{err}"),
            Self::UnknownTask(reference) => write!(f, "no task matches `{reference}`"),
            Self::AmbiguousTask(reference) => {
                write!(f, "`{reference}` matches more than one task; use a longer id")
            }
        }
    }
}

impl Error for ClientError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Network(err) => Some(err),
            Self::InvalidDue(err) => Some(err),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        Self::Network(value)
    }
}

impl From<DueParseError> for ClientError {
    fn from(value: DueParseError) -> Self {
        Self::InvalidDue(value)
    }
}
