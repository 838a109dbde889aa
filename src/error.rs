#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("HTTP {status}: {body}")]
    Transport { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    /// The request completed with a 2xx but the body was not the expected JSON.
    #[error("Unreadable response (HTTP {status}): {reason}")]
    Decode { status: u16, reason: String },

    #[error("Action already in flight for {0}")]
    InFlight(String),

    #[error("Can't open link: {0}")]
    Link(String),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Network(e.to_string())
    }
}

impl AppError {
    /// Build the error for a non-2xx response. 409 is the only status with
    /// its own meaning; everything else is a transport failure.
    pub fn from_status(status: u16, body: String) -> Self {
        if status == 409 {
            AppError::Conflict(body)
        } else {
            AppError::Transport { status, body }
        }
    }

    /// Text shown to the user for this error.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Conflict(_) => "Already exists".to_string(),
            AppError::Transport { status, body } => {
                let body = body.trim();
                if body.is_empty() {
                    format!("HTTP {status}")
                } else {
                    format!("HTTP {status} {body}")
                }
            }
            AppError::Network(msg) => msg.clone(),
            AppError::Decode { status, .. } => {
                format!("Unexpected response from server (HTTP {status})")
            }
            AppError::InFlight(_) => "Another action is still running for this job".to_string(),
            AppError::Link(url) => format!("Can't open link {url}"),
        }
    }
}
