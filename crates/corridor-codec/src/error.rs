use corridor_types::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed memo: {0}")]
    MalformedMemo(String),
    #[error("invalid link: {0}")]
    InvalidLink(String),
}

impl CodecError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedMemo(_) => ErrorKind::MalformedMemo,
            Self::InvalidLink(_) => ErrorKind::InvalidLink,
        }
    }
}
