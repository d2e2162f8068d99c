use std::fmt;

#[derive(Debug)]
pub enum BinderError {
    InvalidSelector(String),
    MissingAttribute {
        element: String,
        attribute: &'static str,
    },
    MissingTimeBlockPath,
    InvalidTarget {
        target: String,
        message: String,
    },
    Transport(String),
    Status {
        status: u16,
        body: String,
    },
    UnexpectedResponse(String),
    MissingTarget(String),
    Task(String),
    Io(std::io::Error),
}

impl BinderError {
    pub fn missing_attribute(element: impl Into<String>, attribute: &'static str) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute,
        }
    }

    pub fn invalid_target(target: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::InvalidTarget {
            target: target.into(),
            message: message.to_string(),
        }
    }

    pub fn unexpected_response(err: impl fmt::Display) -> Self {
        Self::UnexpectedResponse(err.to_string())
    }
}

impl fmt::Display for BinderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSelector(selector) => {
                write!(f, "unsupported selector '{selector}', expected '#id' or '.class'")
            }
            Self::MissingAttribute { element, attribute } => {
                write!(f, "{element} has no data-{attribute} attribute")
            }
            Self::MissingTimeBlockPath => write!(f, "time_block_path is not configured"),
            Self::InvalidTarget { target, message } => {
                write!(f, "invalid request target '{target}': {message}")
            }
            Self::Transport(message) => write!(f, "request failed: {message}"),
            Self::Status { status, body } => write!(f, "server responded {status}: {body}"),
            Self::UnexpectedResponse(message) => write!(f, "unexpected response: {message}"),
            Self::MissingTarget(id) => write!(f, "no element with id '{id}'"),
            Self::Task(message) => write!(f, "click task failed: {message}"),
            Self::Io(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for BinderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BinderError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for BinderError {
    fn from(err: serde_json::Error) -> Self {
        Self::unexpected_response(err)
    }
}

impl From<reqwest::Error> for BinderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::unexpected_response(err);
        }
        Self::Transport(err.to_string())
    }
}

impl From<tokio::task::JoinError> for BinderError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}
