// Error types for tokenizer construction and record parsing
//
// Two families:
// - ConfigError: the tokenizer cannot be built with the given options
// - TokenizerError: a row (or the line source) is bad; the caller decides
//   whether to skip the record or abort the import

use thiserror::Error;

/// Rejected tokenizer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Empty delimiter is not allowed")]
    EmptyDelimiter,

    #[error("\"quote\" option accepts only 1 character.")]
    QuoteTooLong,

    #[error("\"escape\" option accepts only 1 character.")]
    EscapeTooLong,

    #[error(
        "Unsupported quotes_in_quoted_fields: '{0}', supported values: [NONE, ACCEPT_ONLY_RFC4180_ESCAPED, ACCEPT_STRAY_QUOTES_ASSUMING_NO_DELIMITERS_IN_FIELDS]"
    )]
    UnsupportedQuotesInQuotedFields(String),

    #[error(
        "[quotes_in_quoted_fields == ACCEPT_STRAY_QUOTES_ASSUMING_NO_DELIMITERS_IN_FIELDS] is not allowed to specify with [trim_if_not_quoted = true]"
    )]
    StrayQuotesWithTrim,

    #[error("max_quoted_size_limit must be a positive integer")]
    NonPositiveQuotedSizeLimit,
}

/// Data error raised while reading records.
#[derive(Debug, Error)]
pub enum TokenizerError {
    /// `next_record` was called before the previous record was drained.
    #[error("Too many columns")]
    TooManyColumns,

    /// `next_column` was called after the record already ended.
    #[error("Too few columns")]
    TooFewColumns,

    #[error("{0}")]
    InvalidValue(String),

    #[error("The size of the quoted value exceeds the limit size ({limit})")]
    QuotedSizeLimitExceeded { limit: u64 },

    /// A column was requested but the cursor holds no line.
    #[error("next_column called after end of input")]
    EndOfInput,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Discriminant of [`TokenizerError`], for callers that branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TooManyColumns,
    TooFewColumns,
    InvalidValue,
    QuotedSizeLimitExceeded,
    EndOfInput,
    Io,
}

impl ErrorKind {
    /// True for every kind that denotes a malformed value.
    /// A quoted-size overflow is a specific invalid value.
    pub fn is_invalid_value(self) -> bool {
        matches!(self, ErrorKind::InvalidValue | ErrorKind::QuotedSizeLimitExceeded)
    }

    /// True for column-count mismatches.
    pub fn is_invalid_format(self) -> bool {
        matches!(self, ErrorKind::TooManyColumns | ErrorKind::TooFewColumns)
    }
}

impl TokenizerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TokenizerError::TooManyColumns => ErrorKind::TooManyColumns,
            TokenizerError::TooFewColumns => ErrorKind::TooFewColumns,
            TokenizerError::InvalidValue(_) => ErrorKind::InvalidValue,
            TokenizerError::QuotedSizeLimitExceeded { .. } => ErrorKind::QuotedSizeLimitExceeded,
            TokenizerError::EndOfInput => ErrorKind::EndOfInput,
            TokenizerError::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn invalid_value(message: impl Into<String>) -> Self {
        TokenizerError::InvalidValue(message.into())
    }
}
