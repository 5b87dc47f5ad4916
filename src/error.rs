pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The ways a dashboard load can fail. These are matched on by the view state machine, so unlike
/// the rest of the crate they are typed rather than carried as `anyhow::Error`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// The request never produced a 2xx response: a transport failure (`status` is `None`) or a
    /// non-success HTTP status.
    #[error("{}", network_message(.status, .message))]
    Network {
        status: Option<u16>,
        message: String,
    },

    /// The response body could not be understood.
    #[error("Invalid response: {0}")]
    Parse(String),

    /// The backend answered, but reported a business failure in the envelope.
    #[error("{0}")]
    Application(String),
}

impl LoadError {
    pub(crate) fn transport(e: impl std::fmt::Display) -> Self {
        LoadError::Network {
            status: None,
            message: e.to_string(),
        }
    }

    pub(crate) fn status(status: u16, message: impl Into<String>) -> Self {
        LoadError::Network {
            status: Some(status),
            message: message.into(),
        }
    }
}

fn network_message(status: &Option<u16>, message: &str) -> String {
    match (status, message.is_empty()) {
        (Some(code), true) => format!("HTTP {code}"),
        (Some(code), false) => format!("HTTP {code}: {message}"),
        (None, _) => format!("Network error: {message}"),
    }
}
