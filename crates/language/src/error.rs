#[derive(Debug, thiserror::Error)]
pub enum LanguageError {
    #[error("unsupported language: {0}")]
    Unsupported(String),
}

pub type Result<T> = std::result::Result<T, LanguageError>;
