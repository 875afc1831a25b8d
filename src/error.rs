use thiserror::Error;

#[derive(Error, Debug)]
pub enum FieldOpsError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error {status}: {body}")]
    Server { status: u16, body: String },

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Background fetch failed: {0}")]
    Task(String),
}

impl FieldOpsError {
    /// Map a non-2xx response to the matching error variant.
    pub fn from_status(status: u16, body: String, what: &str) -> Self {
        match status {
            404 => FieldOpsError::NotFound(what.to_string()),
            500..=599 => FieldOpsError::Server { status, body },
            _ => FieldOpsError::Http { status, body },
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FieldOpsError::NotFound(_) => Some(404),
            FieldOpsError::Server { status, .. } | FieldOpsError::Http { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}

/// Reason phrase shown for the statuses users commonly hit.
pub fn reason_phrase(status: u16) -> Option<&'static str> {
    match status {
        400 => Some("Некоректний запит"),
        403 => Some("Доступ заборонено"),
        404 => Some("Дані не знайдено"),
        500 => Some("Внутрішня помилка сервера"),
        _ => None,
    }
}

pub type Result<T> = std::result::Result<T, FieldOpsError>;
