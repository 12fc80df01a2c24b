use std::io;

/// Errors surfaced by pattern compilation, archive loading, and scanning.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("invalid regular expression: {0}")]
    Regex(#[from] regex::Error),
    #[error("invalid regular expression: {0}")]
    RegexSyntax(#[from] Box<regex_syntax::Error>),
    #[error("invalid path pattern: {0}")]
    PathPattern(#[from] glob::PatternError),
    #[error("reader is too large")]
    ReaderTooLarge,
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

pub type SearchResult<T> = std::result::Result<T, SearchError>;

impl From<regex_syntax::Error> for SearchError {
    fn from(err: regex_syntax::Error) -> Self {
        SearchError::RegexSyntax(Box::new(err))
    }
}
