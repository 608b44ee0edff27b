use thiserror::Error;

/// Structural input errors. These stop processing of the whole book.
#[derive(Error, Debug)]
pub enum UsfmError {
    #[error("Versification scheme not found: {0}")]
    SchemeNotFound(String),

    #[error("Could not load chunks for {book_id}{}", .reason.as_ref().map(|r| format!(": {}", r)).unwrap_or_default())]
    ChunkLoad {
        book_id: String,
        reason: Option<String>,
    },

    #[error("Invalid book id: \"{0}\"")]
    InvalidBookId(String),

    #[error("Book versification data was not found for \"{book_id}\" in {scheme}")]
    UnknownBook { book_id: String, scheme: String },

    #[error("Parse error in {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl UsfmError {
    pub(crate) fn parse(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, UsfmError>;
