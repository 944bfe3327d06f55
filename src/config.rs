// Tokenizer configuration
//
// TokenizerOptions is the user-facing option surface (deserializable, with
// defaults). TokenizerConfig is the validated, immutable form the tokenizer
// runs with.

use crate::core::{Delimiter, Newline};
use crate::error::ConfigError;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Default limit on the size of one quoted value, in characters (128 KiB).
pub const DEFAULT_MAX_QUOTED_SIZE_LIMIT: u64 = 131_072;

// ============================================================================
// Quotes in quoted fields
// ============================================================================

/// How a quote character met inside an already-quoted field is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum QuotesInQuotedFields {
    /// A doubled quote is an escaped quote, any other quote closes the field.
    None,
    /// Same reading as `None`: only RFC 4180 doubled quotes are accepted.
    #[default]
    AcceptOnlyRfc4180Escaped,
    /// A quote not followed by a delimiter or end of line is kept as content.
    /// Cannot be combined with `trim_if_not_quoted`.
    AcceptStrayQuotesAssumingNoDelimitersInFields,
}

impl QuotesInQuotedFields {
    pub const ALL: [QuotesInQuotedFields; 3] = [
        QuotesInQuotedFields::None,
        QuotesInQuotedFields::AcceptOnlyRfc4180Escaped,
        QuotesInQuotedFields::AcceptStrayQuotesAssumingNoDelimitersInFields,
    ];

    pub fn name(self) -> &'static str {
        match self {
            QuotesInQuotedFields::None => "NONE",
            QuotesInQuotedFields::AcceptOnlyRfc4180Escaped => "ACCEPT_ONLY_RFC4180_ESCAPED",
            QuotesInQuotedFields::AcceptStrayQuotesAssumingNoDelimitersInFields => {
                "ACCEPT_STRAY_QUOTES_ASSUMING_NO_DELIMITERS_IN_FIELDS"
            }
        }
    }

    #[inline]
    pub fn accepts_stray_quotes(self) -> bool {
        self == QuotesInQuotedFields::AcceptStrayQuotesAssumingNoDelimitersInFields
    }
}

impl fmt::Display for QuotesInQuotedFields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Case-insensitive, surrounding whitespace ignored.
impl FromStr for QuotesInQuotedFields {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        QuotesInQuotedFields::ALL
            .into_iter()
            .find(|policy| policy.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnsupportedQuotesInQuotedFields(s.to_string()))
    }
}

impl<'de> Deserialize<'de> for QuotesInQuotedFields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Quote / escape characters
// ============================================================================

/// Quote character option. `None` disables quoting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuoteCharacter(Option<char>);

impl QuoteCharacter {
    pub fn new(c: char) -> Self {
        QuoteCharacter(Some(c))
    }

    pub fn no_quote() -> Self {
        QuoteCharacter(None)
    }

    pub fn character(self) -> Option<char> {
        self.0
    }
}

impl Default for QuoteCharacter {
    fn default() -> Self {
        QuoteCharacter::new('"')
    }
}

impl FromStr for QuoteCharacter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (None, _) => {
                warn!(
                    "Setting '' (empty string) to \"quote\" option is obsoleted. \
                     It becomes '\"' automatically; set '\"' explicitly."
                );
                Ok(QuoteCharacter::default())
            }
            (Some(c), None) => Ok(QuoteCharacter::new(c)),
            (Some(_), Some(_)) => Err(ConfigError::QuoteTooLong),
        }
    }
}

/// Escape character option. `None` disables escaping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EscapeCharacter(Option<char>);

impl EscapeCharacter {
    pub fn new(c: char) -> Self {
        EscapeCharacter(Some(c))
    }

    pub fn no_escape() -> Self {
        EscapeCharacter(None)
    }

    pub fn character(self) -> Option<char> {
        self.0
    }
}

impl Default for EscapeCharacter {
    fn default() -> Self {
        EscapeCharacter::new('\\')
    }
}

impl FromStr for EscapeCharacter {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (None, _) => {
                warn!(
                    "Setting '' (empty string) to \"escape\" option is obsoleted. \
                     It becomes null automatically; set \"escape: null\" explicitly."
                );
                Ok(EscapeCharacter::no_escape())
            }
            (Some(c), None) => Ok(EscapeCharacter::new(c)),
            (Some(_), Some(_)) => Err(ConfigError::EscapeTooLong),
        }
    }
}

// ============================================================================
// Validated configuration
// ============================================================================

/// Immutable tokenizer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizerConfig {
    pub delimiter: Delimiter,
    pub quote: Option<char>,
    pub escape: Option<char>,
    pub quotes_in_quoted_fields: QuotesInQuotedFields,
    /// Re-inserted between the lines of a multi-line quoted value.
    pub newline: Newline,
    pub trim_if_not_quoted: bool,
    /// In characters.
    pub max_quoted_size_limit: u64,
    pub comment_line_marker: Option<String>,
    pub null_string: Option<String>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        TokenizerConfig {
            delimiter: Delimiter::default(),
            quote: QuoteCharacter::default().character(),
            escape: EscapeCharacter::default().character(),
            quotes_in_quoted_fields: QuotesInQuotedFields::default(),
            newline: Newline::default(),
            trim_if_not_quoted: false,
            max_quoted_size_limit: DEFAULT_MAX_QUOTED_SIZE_LIMIT,
            comment_line_marker: None,
            null_string: None,
        }
    }
}

impl TokenizerConfig {
    /// Default configuration with the given delimiter.
    pub fn new(delimiter: &str) -> Result<Self, ConfigError> {
        Ok(TokenizerConfig {
            delimiter: Delimiter::new(delimiter)?,
            ..TokenizerConfig::default()
        })
    }

    pub fn with_quote(mut self, quote: Option<char>) -> Self {
        self.quote = quote;
        self
    }

    pub fn with_escape(mut self, escape: Option<char>) -> Self {
        self.escape = escape;
        self
    }

    pub fn with_quotes_in_quoted_fields(mut self, policy: QuotesInQuotedFields) -> Self {
        self.quotes_in_quoted_fields = policy;
        self
    }

    pub fn with_newline(mut self, newline: Newline) -> Self {
        self.newline = newline;
        self
    }

    pub fn with_trim_if_not_quoted(mut self, trim: bool) -> Self {
        self.trim_if_not_quoted = trim;
        self
    }

    pub fn with_max_quoted_size_limit(mut self, limit: u64) -> Self {
        self.max_quoted_size_limit = limit;
        self
    }

    pub fn with_comment_line_marker(mut self, marker: impl Into<String>) -> Self {
        self.comment_line_marker = Some(marker.into());
        self
    }

    pub fn with_null_string(mut self, null_string: impl Into<String>) -> Self {
        self.null_string = Some(null_string.into());
        self
    }

    /// Check the invariants that cannot be expressed by the field types.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.trim_if_not_quoted && self.quotes_in_quoted_fields.accepts_stray_quotes() {
            return Err(ConfigError::StrayQuotesWithTrim);
        }
        if self.max_quoted_size_limit == 0 {
            return Err(ConfigError::NonPositiveQuotedSizeLimit);
        }
        Ok(())
    }
}

// ============================================================================
// Option surface
// ============================================================================

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_quote() -> Option<String> {
    Some("\"".to_string())
}

fn default_escape() -> Option<String> {
    Some("\\".to_string())
}

fn default_max_quoted_size_limit() -> i64 {
    DEFAULT_MAX_QUOTED_SIZE_LIMIT as i64
}

/// Recognized tokenizer options. Absent keys take their defaults; an
/// explicit `null` for `quote` or `escape` turns that feature off.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenizerOptions {
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default = "default_quote")]
    pub quote: Option<String>,
    #[serde(default = "default_escape")]
    pub escape: Option<String>,
    #[serde(default)]
    pub quotes_in_quoted_fields: QuotesInQuotedFields,
    #[serde(default)]
    pub newline: Newline,
    #[serde(default)]
    pub null_string: Option<String>,
    #[serde(default)]
    pub trim_if_not_quoted: bool,
    #[serde(default = "default_max_quoted_size_limit")]
    pub max_quoted_size_limit: i64,
    #[serde(default)]
    pub comment_line_marker: Option<String>,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        TokenizerOptions {
            delimiter: default_delimiter(),
            quote: default_quote(),
            escape: default_escape(),
            quotes_in_quoted_fields: QuotesInQuotedFields::default(),
            newline: Newline::default(),
            null_string: None,
            trim_if_not_quoted: false,
            max_quoted_size_limit: default_max_quoted_size_limit(),
            comment_line_marker: None,
        }
    }
}

impl TokenizerOptions {
    /// Validate and convert into the tokenizer's configuration.
    pub fn into_config(self) -> Result<TokenizerConfig, ConfigError> {
        let quote = match self.quote.as_deref() {
            Some(s) => s.parse::<QuoteCharacter>()?,
            None => QuoteCharacter::no_quote(),
        };
        let escape = match self.escape.as_deref() {
            Some(s) => s.parse::<EscapeCharacter>()?,
            None => EscapeCharacter::no_escape(),
        };
        let max_quoted_size_limit = u64::try_from(self.max_quoted_size_limit)
            .map_err(|_| ConfigError::NonPositiveQuotedSizeLimit)?;

        let config = TokenizerConfig {
            delimiter: Delimiter::new(&self.delimiter)?,
            quote: quote.character(),
            escape: escape.character(),
            quotes_in_quoted_fields: self.quotes_in_quoted_fields,
            newline: self.newline,
            trim_if_not_quoted: self.trim_if_not_quoted,
            max_quoted_size_limit,
            comment_line_marker: self.comment_line_marker,
            null_string: self.null_string,
        };
        config.validate()?;
        Ok(config)
    }
}

impl TryFrom<TokenizerOptions> for TokenizerConfig {
    type Error = ConfigError;

    fn try_from(options: TokenizerOptions) -> Result<Self, Self::Error> {
        options.into_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quotes_in_quoted_fields_from_str() {
        assert_eq!(
            "  nOne  ".parse::<QuotesInQuotedFields>(),
            Ok(QuotesInQuotedFields::None)
        );
        assert_eq!(
            "  aCCept_only_rfc4180_escaped  ".parse::<QuotesInQuotedFields>(),
            Ok(QuotesInQuotedFields::AcceptOnlyRfc4180Escaped)
        );
        assert_eq!(
            "  AcCePt_stRaY_qUoTeS_aSsUmInG_nO_dElImItErS_iN_fIeLdS  "
                .parse::<QuotesInQuotedFields>(),
            Ok(QuotesInQuotedFields::AcceptStrayQuotesAssumingNoDelimitersInFields)
        );
    }

    #[test]
    fn test_quotes_in_quoted_fields_unsupported() {
        let err = "iNvAlId".parse::<QuotesInQuotedFields>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Unsupported quotes_in_quoted_fields: 'iNvAlId', supported values: \
             [NONE, ACCEPT_ONLY_RFC4180_ESCAPED, ACCEPT_STRAY_QUOTES_ASSUMING_NO_DELIMITERS_IN_FIELDS]"
        );
    }

    #[test]
    fn test_stray_quotes_with_trim_rejected() {
        let config = TokenizerConfig::default()
            .with_trim_if_not_quoted(true)
            .with_quotes_in_quoted_fields(
                QuotesInQuotedFields::AcceptStrayQuotesAssumingNoDelimitersInFields,
            );
        let err = config.validate().unwrap_err();
        assert_eq!(err, ConfigError::StrayQuotesWithTrim);
        assert_eq!(
            err.to_string(),
            "[quotes_in_quoted_fields == ACCEPT_STRAY_QUOTES_ASSUMING_NO_DELIMITERS_IN_FIELDS] \
             is not allowed to specify with [trim_if_not_quoted = true]"
        );
    }

    #[test]
    fn test_zero_size_limit_rejected() {
        let config = TokenizerConfig::default().with_max_quoted_size_limit(0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::NonPositiveQuotedSizeLimit)
        );
    }

    #[test]
    fn test_quote_character_parsing() {
        assert_eq!("'".parse::<QuoteCharacter>(), Ok(QuoteCharacter::new('\'')));
        assert_eq!("".parse::<QuoteCharacter>(), Ok(QuoteCharacter::new('"')));
        assert_eq!("ab".parse::<QuoteCharacter>(), Err(ConfigError::QuoteTooLong));
    }

    #[test]
    fn test_escape_character_parsing() {
        assert_eq!("\\".parse::<EscapeCharacter>(), Ok(EscapeCharacter::new('\\')));
        assert_eq!("".parse::<EscapeCharacter>(), Ok(EscapeCharacter::no_escape()));
        assert_eq!("ab".parse::<EscapeCharacter>(), Err(ConfigError::EscapeTooLong));
    }

    #[test]
    fn test_default_options_match_default_config() {
        let config = TokenizerOptions::default().into_config().unwrap();
        assert_eq!(config, TokenizerConfig::default());
        assert_eq!(config.quote, Some('"'));
        assert_eq!(config.escape, Some('\\'));
        assert_eq!(config.max_quoted_size_limit, 131_072);
        assert_eq!(config.newline, Newline::Crlf);
    }

    #[test]
    fn test_options_from_json() {
        let options: TokenizerOptions = serde_json::from_str(
            r##"{
                "delimiter": ",|",
                "quote": null,
                "newline": "LF",
                "null_string": "NULL",
                "trim_if_not_quoted": true,
                "max_quoted_size_limit": 5,
                "comment_line_marker": "#",
                "quotes_in_quoted_fields": "accept_only_rfc4180_escaped"
            }"##,
        )
        .unwrap();
        let config = options.into_config().unwrap();
        assert_eq!(config.delimiter.lead(), ',');
        assert_eq!(config.delimiter.following(), Some("|"));
        assert_eq!(config.quote, None);
        assert_eq!(config.escape, Some('\\'));
        assert_eq!(config.newline, Newline::Lf);
        assert_eq!(config.null_string.as_deref(), Some("NULL"));
        assert!(config.trim_if_not_quoted);
        assert_eq!(config.max_quoted_size_limit, 5);
        assert_eq!(config.comment_line_marker.as_deref(), Some("#"));
    }

    #[test]
    fn test_options_rejects_bad_values() {
        let empty_delimiter = TokenizerOptions {
            delimiter: String::new(),
            ..TokenizerOptions::default()
        };
        assert_eq!(empty_delimiter.into_config(), Err(ConfigError::EmptyDelimiter));

        let negative_limit = TokenizerOptions {
            max_quoted_size_limit: -1,
            ..TokenizerOptions::default()
        };
        assert_eq!(
            negative_limit.into_config(),
            Err(ConfigError::NonPositiveQuotedSizeLimit)
        );

        let bad_policy: Result<TokenizerOptions, _> =
            serde_json::from_str(r#"{"quotes_in_quoted_fields": "sometimes"}"#);
        assert!(bad_policy.is_err());
    }
}
